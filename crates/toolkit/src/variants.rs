//! Named style variants.
//!
//! A component declares variants, each a class name plus inline style
//! properties. Selecting some of them yields their class names in order and
//! one merged style where later selections win.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::object::{Object, combine};
use crate::strings::cls;

/// One variant of a component.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub class_name: String,
    #[serde(default)]
    pub style: Object,
}

/// All variants a component offers, by name.
pub type ComponentVariants = BTreeMap<String, Variant>;

/// The result of [`apply_variants`].
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedVariants<'a> {
    /// Selected variants in selection order.
    pub applied: Vec<&'a Variant>,
    pub classes: Vec<&'a str>,
    /// Styles merged left to right.
    pub style: Object,
}

impl AppliedVariants<'_> {
    /// Classes joined with spaces.
    pub fn class_name(&self) -> String {
        cls(self.classes.iter().copied().map(Some))
    }
}

/// Error applying variants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VariantError {
    #[error("Unknown variant '{0}'")]
    Unknown(String),
}

/// Looks up `selected` in `variants`.
///
/// # Errors
/// Returns [`VariantError::Unknown`] for the first name with no variant.
///
/// ```rust
/// use serde_json::json;
/// use toolkit::{ComponentVariants, apply_variants};
///
/// let variants: ComponentVariants = serde_json::from_value(json!({
///     "primary": { "className": "btn-primary", "style": { "color": "white" } },
///     "large":   { "className": "btn-lg", "style": { "fontSize": 18 } },
/// })).unwrap();
///
/// let applied = apply_variants(&["primary", "large"], &variants).unwrap();
/// assert_eq!(applied.class_name(), "btn-primary btn-lg");
/// assert_eq!(applied.style.len(), 2);
/// ```
pub fn apply_variants<'a, K: AsRef<str>>(
    selected: &[K],
    variants: &'a ComponentVariants,
) -> Result<AppliedVariants<'a>, VariantError> {
    let applied = selected
        .iter()
        .map(|name| {
            let name = name.as_ref();
            variants
                .get(name)
                .ok_or_else(|| VariantError::Unknown(name.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let classes = applied.iter().map(|v| v.class_name.as_str()).collect();
    let style = combine(applied.iter().map(|v| Some(&v.style)));

    Ok(AppliedVariants {
        applied,
        classes,
        style,
    })
}
