//! Truthiness checks over optional JSON values.
//!
//! `None` stands for a missing value, so both helpers take the result of
//! `map.get(key)` directly.

use serde_json::Value;

/// `true` for missing, `null`, `false`, `""` and `[]`. Zero is not empty.
///
/// ```rust
/// use serde_json::json;
/// use toolkit::is_falsy_or_empty;
///
/// assert!(is_falsy_or_empty(Some(&json!([]))));
/// assert!(!is_falsy_or_empty(Some(&json!(0))));
/// ```
pub fn is_falsy_or_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null | Value::Bool(false)) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

/// `true` for missing or `null`.
pub fn is_nullish(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}
