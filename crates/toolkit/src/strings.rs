//! String helpers.

use serde_json::Value;

/// Uppercases the first character.
///
/// ```rust
/// use toolkit::capitalize;
///
/// assert_eq!(capitalize("hello"), "Hello");
/// assert_eq!(capitalize(""), "");
/// ```
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Joins class names with spaces, skipping `None`.
///
/// ```rust
/// use toolkit::cls;
///
/// assert_eq!(cls([Some("btn"), None, Some("btn-primary")]), "btn btn-primary");
/// ```
pub fn cls<'a>(classes: impl IntoIterator<Item = Option<&'a str>>) -> String {
    classes.into_iter().flatten().collect::<Vec<_>>().join(" ")
}

/// Trims a string value; anything else comes back unchanged.
pub fn trim_white_space(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.trim().to_string()),
        other => other,
    }
}
