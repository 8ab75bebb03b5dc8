//! Storyboard documents: frames stacked vertically, each holding positioned
//! items.
//!
//! Storyboards load from and save to JSON or TOML (YAML with the `yaml`
//! feature):
//!
//! ```toml
//! [debug]
//! items = true
//!
//! [[frames]]
//! height = "100%"
//!
//! [[frames.items]]
//! element = "title"
//! easing_lag = 0.1
//! align = { center = true }
//! anchor = { center = true, top = "12px" }
//! ```

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use tracing::debug;

use crate::align::{Length, LengthParseError, Placement};
use crate::anchor::{Rect, Size};
use crate::positioned::Positioned;

/// Height of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FrameHeight {
    /// Sized by its content.
    #[default]
    Auto,
    Length(Length),
}

impl FrameHeight {
    /// Height in pixels against the viewport height. `None` for `Auto`.
    pub fn resolve(self, viewport_height: f64) -> Option<f64> {
        match self {
            Self::Auto => None,
            Self::Length(length) => Some(length.resolve(viewport_height)),
        }
    }
}

impl fmt::Display for FrameHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Length(length) => write!(f, "{length}"),
        }
    }
}

impl FromStr for FrameHeight {
    type Err = LengthParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            Ok(Self::Auto)
        } else {
            s.parse().map(Self::Length)
        }
    }
}

impl Serialize for FrameHeight {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FrameHeight {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(px) => Ok(Self::Length(Length::Px(px))),
            Repr::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// One item inside a frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameItem {
    /// Where the reference marker sits inside the frame.
    #[serde(skip_serializing_if = "Placement::is_empty")]
    pub align: Placement,
    /// How the overlay aligns itself around the projected marker.
    #[serde(skip_serializing_if = "Placement::is_empty")]
    pub anchor: Placement,
    /// Smoothing time constant in seconds; absent or zero tracks exactly.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub easing_lag: Option<f64>,
    /// Host-defined content identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
}

impl FrameItem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_align(mut self, align: Placement) -> Self {
        self.align = align;
        self
    }

    pub fn with_anchor(mut self, anchor: Placement) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn with_easing_lag(mut self, lag: f64) -> Self {
        self.easing_lag = Some(lag);
        self
    }

    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }
}

/// A vertical slice of the storyboard.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoryboardFrame {
    pub height: FrameHeight,
    pub items: Vec<FrameItem>,
}

impl StoryboardFrame {
    pub fn new(height: FrameHeight) -> Self {
        Self {
            height,
            items: Vec::new(),
        }
    }

    pub fn with_item(mut self, item: FrameItem) -> Self {
        self.items.push(item);
        self
    }
}

/// Debug drawing switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugOptions {
    /// Draw reference markers as small dots.
    pub items: bool,
    /// Outline frames.
    pub frames: bool,
}

impl DebugOptions {
    fn is_off(&self) -> bool {
        !self.items && !self.frames
    }
}

/// A complete storyboard document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Storyboard {
    #[serde(skip_serializing_if = "DebugOptions::is_off")]
    pub debug: DebugOptions,
    pub frames: Vec<StoryboardFrame>,
}

impl Storyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frame(mut self, frame: StoryboardFrame) -> Self {
        self.frames.push(frame);
        self
    }

    pub fn with_debug(mut self, debug: DebugOptions) -> Self {
        self.debug = debug;
        self
    }

    /// Total number of items across frames.
    pub fn item_count(&self) -> usize {
        self.frames.iter().map(|frame| frame.items.len()).sum()
    }

    /// Builds an unattached [`Positioned`] for every item, in frame order,
    /// keyed `"{frame}-{item}"`.
    pub fn positioned(&self) -> Vec<Positioned> {
        self.frames
            .iter()
            .enumerate()
            .flat_map(|(i, frame)| {
                frame
                    .items
                    .iter()
                    .enumerate()
                    .map(move |(j, item)| Positioned::new(format!("{i}-{j}"), item))
            })
            .collect()
    }

    /// Stacks frames top to bottom at full viewport width. `Auto` frames
    /// take `auto_height`.
    pub fn layout(&self, viewport: Size, auto_height: f64) -> Vec<Rect> {
        let mut top = 0.0;
        self.frames
            .iter()
            .map(|frame| {
                let height = frame
                    .height
                    .resolve(viewport.height)
                    .unwrap_or(auto_height)
                    .max(0.0);
                let rect = Rect::new(0.0, top, viewport.width, height);
                top += height;
                rect
            })
            .collect()
    }

    /// Checks numeric fields.
    ///
    /// # Errors
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), StoryboardValidationError> {
        for (i, frame) in self.frames.iter().enumerate() {
            if let FrameHeight::Length(length) = frame.height {
                if !length.is_finite() || length.resolve(100.0) < 0.0 {
                    return Err(StoryboardValidationError::Height {
                        frame: i,
                        value: length.to_string(),
                    });
                }
            }

            for (j, item) in frame.items.iter().enumerate() {
                if let Some(lag) = item.easing_lag {
                    if !lag.is_finite() || lag < 0.0 {
                        return Err(StoryboardValidationError::EasingLag {
                            frame: i,
                            item: j,
                            value: lag,
                        });
                    }
                }

                let lengths = item
                    .align
                    .lengths()
                    .map(|(field, length)| ("align", field, length))
                    .chain(
                        item.anchor
                            .lengths()
                            .map(|(field, length)| ("anchor", field, length)),
                    );
                for (placement, field, length) in lengths {
                    if !length.is_finite() {
                        return Err(StoryboardValidationError::Length {
                            frame: i,
                            item: j,
                            placement,
                            field,
                            value: length.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Load a storyboard from JSON text.
    ///
    /// # Errors
    /// Returns `StoryboardLoadError` if parsing or validation fails.
    pub fn from_json(json: &str) -> Result<Self, StoryboardLoadError> {
        let storyboard: Self = serde_json::from_str(json)?;
        storyboard.validate()?;
        Ok(storyboard)
    }

    /// Load a storyboard from TOML text.
    ///
    /// # Errors
    /// Returns `StoryboardLoadError` if parsing or validation fails.
    pub fn from_toml(toml: &str) -> Result<Self, StoryboardLoadError> {
        let storyboard: Self = toml::from_str(toml)?;
        storyboard.validate()?;
        Ok(storyboard)
    }

    /// Load a storyboard from YAML text.
    ///
    /// # Errors
    /// Returns `StoryboardLoadError` if parsing or validation fails.
    #[cfg(feature = "yaml")]
    pub fn from_yaml(yaml: &str) -> Result<Self, StoryboardLoadError> {
        let storyboard: Self = serde_yaml::from_str(yaml)?;
        storyboard.validate()?;
        Ok(storyboard)
    }

    /// Load a storyboard from a file (format inferred by extension).
    ///
    /// # Errors
    /// Returns `StoryboardLoadError` if reading, parsing, or validation fails.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, StoryboardLoadError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let storyboard = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            Some("toml") => Self::from_toml(&content),
            Some("yaml" | "yml") => {
                #[cfg(feature = "yaml")]
                {
                    Self::from_yaml(&content)
                }
                #[cfg(not(feature = "yaml"))]
                {
                    Err(StoryboardLoadError::UnsupportedFormat("yaml".into()))
                }
            }
            Some(ext) => Err(StoryboardLoadError::UnsupportedFormat(ext.into())),
            None => Err(StoryboardLoadError::UnsupportedFormat("unknown".into())),
        }?;
        debug!(
            storyboard.path = %path.display(),
            storyboard.frames = storyboard.frames.len(),
            storyboard.items = storyboard.item_count(),
            "Loaded storyboard"
        );
        Ok(storyboard)
    }

    /// Serialize this storyboard to JSON.
    ///
    /// # Errors
    /// Returns `StoryboardSaveError` if serialization fails.
    pub fn to_json(&self) -> Result<String, StoryboardSaveError> {
        serde_json::to_string_pretty(self).map_err(StoryboardSaveError::Json)
    }

    /// Serialize this storyboard to TOML.
    ///
    /// # Errors
    /// Returns `StoryboardSaveError` if serialization fails.
    pub fn to_toml(&self) -> Result<String, StoryboardSaveError> {
        toml::to_string_pretty(self).map_err(StoryboardSaveError::Toml)
    }

    /// Serialize this storyboard to YAML.
    ///
    /// # Errors
    /// Returns `StoryboardSaveError` if serialization fails.
    #[cfg(feature = "yaml")]
    pub fn to_yaml(&self) -> Result<String, StoryboardSaveError> {
        serde_yaml::to_string(self).map_err(StoryboardSaveError::Yaml)
    }

    /// Save this storyboard to a file (format inferred by extension).
    ///
    /// # Errors
    /// Returns `StoryboardSaveError` if serialization or writing fails.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), StoryboardSaveError> {
        let path = path.as_ref();
        let content = match path.extension().and_then(|e| e.to_str()) {
            Some("json") | None => self.to_json()?,
            Some("toml") => self.to_toml()?,
            Some("yaml" | "yml") => {
                #[cfg(feature = "yaml")]
                {
                    self.to_yaml()?
                }
                #[cfg(not(feature = "yaml"))]
                {
                    return Err(StoryboardSaveError::UnsupportedFormat("yaml".into()));
                }
            }
            Some(ext) => return Err(StoryboardSaveError::UnsupportedFormat(ext.into())),
        };

        fs::write(path, content).map_err(StoryboardSaveError::Io)
    }
}

/// Error validating a storyboard.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoryboardValidationError {
    #[error("Frame {frame} has invalid height '{value}'")]
    Height { frame: usize, value: String },
    #[error("Item {frame}-{item} has invalid easing lag {value} (must be finite and >= 0)")]
    EasingLag { frame: usize, item: usize, value: f64 },
    #[error("Item {frame}-{item} has non-finite {placement}.{field} '{value}'")]
    Length {
        frame: usize,
        item: usize,
        placement: &'static str,
        field: &'static str,
        value: String,
    },
}

/// Error loading a storyboard.
#[derive(Error, Debug)]
pub enum StoryboardLoadError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
    #[cfg(feature = "yaml")]
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Validation error: {0}")]
    Validation(#[from] StoryboardValidationError),
}

/// Error saving a storyboard.
#[derive(Error, Debug)]
pub enum StoryboardSaveError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),
    #[cfg(feature = "yaml")]
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}
