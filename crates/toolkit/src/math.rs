//! Numeric helpers.

/// Restricts `n` to `[min, max]`, computed as `min(max, max(min, n))`.
///
/// When `min > max` the result is `max`.
///
/// ```rust
/// use toolkit::clamp;
///
/// assert_eq!(clamp(5.0, 1.0, 10.0), 5.0);
/// assert_eq!(clamp(-5.0, 0.0, 10.0), 0.0);
/// assert_eq!(clamp(15.0, 0.0, 10.0), 10.0);
/// ```
pub fn clamp(n: f64, min: f64, max: f64) -> f64 {
    max.min(min.max(n))
}
