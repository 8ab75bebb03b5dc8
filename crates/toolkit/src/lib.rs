#![forbid(unsafe_code)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::float_cmp)]

//! # Toolkit
//!
//! Small, independent helpers for storyboard hosts:
//!
//! - numbers: [`range`], [`clamp`]
//! - JSON objects: [`combine`], [`cherry_pick`], [`cleanse_nullish`],
//!   [`flatten_object_deep`], [`deep_clone`]
//! - strings: [`capitalize`], [`cls`], [`trim_white_space`]
//! - truthiness: [`is_falsy_or_empty`], [`is_nullish`]
//! - style variants: [`apply_variants`]

mod array;
mod bools;
mod math;
mod object;
mod strings;
mod variants;

pub use array::range;
pub use bools::{is_falsy_or_empty, is_nullish};
pub use math::clamp;
pub use object::{
    Object, cherry_pick, cleanse_nullish, cleanse_nullish_deep, combine, deep_clone,
    flatten_object_deep, path_from_flattened_key,
};
pub use strings::{capitalize, cls, trim_white_space};
pub use variants::{AppliedVariants, ComponentVariants, Variant, VariantError, apply_variants};
