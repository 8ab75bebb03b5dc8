//! Helpers over JSON objects.
//!
//! Objects are `serde_json::Map<String, Value>`; a missing key plays the
//! role of `undefined`.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// A JSON object.
pub type Object = Map<String, Value>;

/// Shallow-merges objects left to right, skipping `None`. Later keys win.
///
/// ```rust
/// use serde_json::json;
/// use toolkit::{combine, Object};
///
/// let a: Object = json!({ "a": 1 }).as_object().cloned().unwrap();
/// let b: Object = json!({ "a": 3, "c": 4 }).as_object().cloned().unwrap();
///
/// let merged = combine([Some(&a), None, Some(&b)]);
/// assert_eq!(serde_json::Value::Object(merged), json!({ "a": 3, "c": 4 }));
/// ```
pub fn combine<'a>(objects: impl IntoIterator<Item = Option<&'a Object>>) -> Object {
    let mut result = Object::new();
    for object in objects.into_iter().flatten() {
        for (key, value) in object {
            result.insert(key.clone(), value.clone());
        }
    }
    result
}

/// Copies only `keys` from `source`. Keys that are absent are skipped.
pub fn cherry_pick<K: AsRef<str>>(source: &Object, keys: &[K]) -> Object {
    keys.iter()
        .filter_map(|key| {
            let key = key.as_ref();
            source.get(key).map(|value| (key.to_string(), value.clone()))
        })
        .collect()
}

fn is_cleansable(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Drops `null` and `""` entries. With `deep`, nested objects are cleansed
/// too; arrays are kept as they are.
pub fn cleanse_nullish(object: &Object, deep: bool) -> Object {
    object
        .iter()
        .filter(|(_, value)| !is_cleansable(value))
        .map(|(key, value)| {
            let value = match value {
                Value::Object(nested) if deep => Value::Object(cleanse_nullish(nested, true)),
                other => other.clone(),
            };
            (key.clone(), value)
        })
        .collect()
}

/// [`cleanse_nullish`] with `deep` set.
pub fn cleanse_nullish_deep(object: &Object) -> Object {
    cleanse_nullish(object, true)
}

/// Flattens nested objects into dot-separated keys. Arrays are leaves.
///
/// ```rust
/// use serde_json::json;
/// use toolkit::flatten_object_deep;
///
/// let nested = json!({ "a": { "b": { "c": 1 } }, "d": [1, 2] });
/// let flat = flatten_object_deep(nested.as_object().unwrap());
/// assert_eq!(serde_json::Value::Object(flat), json!({ "a.b.c": 1, "d": [1, 2] }));
/// ```
pub fn flatten_object_deep(object: &Object) -> Object {
    let mut result = Object::new();
    flatten_into(object, "", &mut result);
    result
}

fn flatten_into(object: &Object, trail: &str, result: &mut Object) {
    for (key, value) in object {
        let path = if trail.is_empty() {
            key.clone()
        } else {
            format!("{trail}.{key}")
        };
        // Empty objects produce no keys.
        match value {
            Value::Object(nested) => flatten_into(nested, &path, result),
            other => {
                result.insert(path, other.clone());
            }
        }
    }
}

/// Splits a flattened key into its path segments.
pub fn path_from_flattened_key(key: &str) -> Vec<&str> {
    key.split('.').collect()
}

/// Deep copy through a JSON round trip.
///
/// Only what survives JSON survives the copy: maps with non-string keys
/// fail, and values serialized as strings (timestamps, for example) only
/// come back if the target type parses them.
///
/// # Errors
/// Returns the serialization or deserialization error.
pub fn deep_clone<T: Serialize + DeserializeOwned>(value: &T) -> Result<T, serde_json::Error> {
    serde_json::to_value(value).and_then(serde_json::from_value)
}
