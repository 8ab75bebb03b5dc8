//! Sequence helpers.

/// Integers from `start` up to, but not including, `end`.
///
/// Empty when `end <= start`.
///
/// ```rust
/// use toolkit::range;
///
/// assert_eq!(range(0, 5), vec![0, 1, 2, 3, 4]);
/// assert_eq!(range(2, 6), vec![2, 3, 4, 5]);
/// assert!(range(5, 5).is_empty());
/// ```
pub fn range(start: i64, end: i64) -> Vec<i64> {
    (start..end).collect()
}
