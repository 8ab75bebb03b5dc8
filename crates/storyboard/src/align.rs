//! Alignment and anchor resolution.
//!
//! A [`Placement`] is the loose, CSS-like description found in storyboard
//! files: an optional `center` flag plus optional `left`/`right`/`top`/
//! `bottom` offsets. Resolving it yields one [`AxisAlign`] per axis. Two
//! resolutions exist because the reference marker and the projected overlay
//! settle conflicting fields differently:
//!
//! | Axis       | Marker (last wins)       | Overlay (last wins)      |
//! |------------|--------------------------|--------------------------|
//! | horizontal | center, right, left      | center, left, right      |
//! | vertical   | center, bottom, top      | center, bottom, top      |
//!
//! `center` only applies to an axis that has no directional field.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::anchor::{Coords, Size};

/// A CSS-style length: pixels or a percentage of the containing box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    /// Absolute pixels.
    Px(f64),
    /// Percentage of the container along the same axis.
    Percent(f64),
}

impl Length {
    /// Zero pixels.
    pub const ZERO: Self = Self::Px(0.0);

    /// Resolves to pixels against a container extent.
    pub fn resolve(self, container: f64) -> f64 {
        match self {
            Self::Px(px) => px,
            Self::Percent(pct) => container * pct / 100.0,
        }
    }

    /// Whether the numeric part is finite.
    pub fn is_finite(self) -> bool {
        match self {
            Self::Px(v) | Self::Percent(v) => v.is_finite(),
        }
    }
}

impl Default for Length {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Px(px) => write!(f, "{px}px"),
            Self::Percent(pct) => write!(f, "{pct}%"),
        }
    }
}

/// Error parsing a [`Length`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LengthParseError {
    #[error("Length is empty")]
    Empty,
    #[error("Invalid length '{0}' (expected e.g. \"10px\", \"50%\" or a number)")]
    Invalid(String),
    #[error("Length '{0}' is not finite")]
    NonFinite(String),
}

impl FromStr for Length {
    type Err = LengthParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(LengthParseError::Empty);
        }

        let (number, percent) = if let Some(n) = s.strip_suffix('%') {
            (n, true)
        } else if let Some(n) = s.strip_suffix("px") {
            (n, false)
        } else {
            (s, false)
        };

        let value: f64 = number
            .trim()
            .parse()
            .map_err(|_| LengthParseError::Invalid(s.to_string()))?;
        if !value.is_finite() {
            return Err(LengthParseError::NonFinite(s.to_string()));
        }

        Ok(if percent {
            Self::Percent(value)
        } else {
            Self::Px(value)
        })
    }
}

impl From<f64> for Length {
    fn from(px: f64) -> Self {
        Self::Px(px)
    }
}

impl Serialize for Length {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LengthRepr {
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for Length {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match LengthRepr::deserialize(deserializer)? {
            LengthRepr::Number(px) if px.is_finite() => Ok(Self::Px(px)),
            LengthRepr::Number(px) => Err(serde::de::Error::custom(
                LengthParseError::NonFinite(px.to_string()),
            )),
            LengthRepr::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Loose alignment description, as written in storyboard files.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Placement {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub center: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<Length>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<Length>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<Length>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom: Option<Length>,
}

impl Placement {
    /// Centered on both axes.
    pub fn centered() -> Self {
        Self {
            center: true,
            ..Self::default()
        }
    }

    pub fn with_center(mut self, center: bool) -> Self {
        self.center = center;
        self
    }

    pub fn with_left(mut self, left: impl Into<Length>) -> Self {
        self.left = Some(left.into());
        self
    }

    pub fn with_right(mut self, right: impl Into<Length>) -> Self {
        self.right = Some(right.into());
        self
    }

    pub fn with_top(mut self, top: impl Into<Length>) -> Self {
        self.top = Some(top.into());
        self
    }

    pub fn with_bottom(mut self, bottom: impl Into<Length>) -> Self {
        self.bottom = Some(bottom.into());
        self
    }

    /// Whether nothing is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Iterates the lengths that are set, with their field names.
    pub fn lengths(&self) -> impl Iterator<Item = (&'static str, Length)> + '_ {
        [
            ("left", self.left),
            ("right", self.right),
            ("top", self.top),
            ("bottom", self.bottom),
        ]
        .into_iter()
        .filter_map(|(name, length)| length.map(|l| (name, l)))
    }
}

/// Resolved alignment along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AxisAlign {
    /// Nothing specified: stays at the container origin.
    #[default]
    Auto,
    /// Centered on the axis (50% offset, translated back by half its size).
    Center,
    /// Offset from the start edge (left or top).
    Start(Length),
    /// Offset from the end edge (right or bottom).
    End(Length),
}

impl AxisAlign {
    /// Pixel offset of the start edge of a box of extent `own` inside a
    /// container of extent `container`.
    pub fn offset(self, container: f64, own: f64) -> f64 {
        match self {
            Self::Auto => 0.0,
            Self::Center => container / 2.0 - own / 2.0,
            Self::Start(length) => length.resolve(container),
            Self::End(length) => container - own - length.resolve(container),
        }
    }

    /// Self-translation in percent of the box's own extent.
    pub fn translate_percent(self) -> f64 {
        if self == Self::Center { -50.0 } else { 0.0 }
    }

    pub fn is_center(self) -> bool {
        self == Self::Center
    }
}

impl fmt::Display for AxisAlign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Center => f.write_str("center"),
            Self::Start(length) => write!(f, "start {length}"),
            Self::End(length) => write!(f, "end {length}"),
        }
    }
}

/// One alignment per axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResolvedPlacement {
    pub x: AxisAlign,
    pub y: AxisAlign,
}

impl ResolvedPlacement {
    /// `(x, y)` self-translation in percent.
    pub fn translate_percent(&self) -> (f64, f64) {
        (self.x.translate_percent(), self.y.translate_percent())
    }

    /// Pixel offset of a box of size `own` inside `container`.
    pub fn offset(&self, container: Size, own: Size) -> Coords {
        Coords::new(
            self.x.offset(container.width, own.width),
            self.y.offset(container.height, own.height),
        )
    }
}

impl fmt::Display for ResolvedPlacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x: {}, y: {}", self.x, self.y)
    }
}

fn axis(center: bool, winner: Option<AxisAlign>) -> AxisAlign {
    match winner {
        Some(align) => align,
        None if center => AxisAlign::Center,
        None => AxisAlign::Auto,
    }
}

/// Resolves the reference marker's placement inside its frame.
pub fn resolve_marker(placement: &Placement) -> ResolvedPlacement {
    let x = placement
        .left
        .map(AxisAlign::Start)
        .or_else(|| placement.right.map(AxisAlign::End));
    let y = placement
        .top
        .map(AxisAlign::Start)
        .or_else(|| placement.bottom.map(AxisAlign::End));
    ResolvedPlacement {
        x: axis(placement.center, x),
        y: axis(placement.center, y),
    }
}

/// Resolves the overlay's self-alignment around the projected point.
pub fn resolve_overlay(placement: &Placement) -> ResolvedPlacement {
    let x = placement
        .right
        .map(AxisAlign::End)
        .or_else(|| placement.left.map(AxisAlign::Start));
    let y = placement
        .top
        .map(AxisAlign::Start)
        .or_else(|| placement.bottom.map(AxisAlign::End));
    ResolvedPlacement {
        x: axis(placement.center, x),
        y: axis(placement.center, y),
    }
}
