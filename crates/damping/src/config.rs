//! Follower tuning and its on-disk representation.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::decay::frame_interval_ms;
use crate::throttle::TrailingPolicy;

/// Default decay time constant in seconds.
pub const DEFAULT_TAU: f64 = 0.08;
/// Default snap threshold.
pub const DEFAULT_EPSILON: f64 = 0.5;
/// Default maximum emissions per second.
pub const DEFAULT_FPS: u32 = 60;

/// Tuning for a [`DampedFollower`](crate::DampedFollower).
///
/// Missing fields fall back to their defaults when deserializing, so a
/// config file only needs to name what it changes:
///
/// ```rust
/// use damping::FollowerConfig;
///
/// let config = FollowerConfig::from_toml("tau = 0.1\nfps = 120").unwrap();
/// assert_eq!(config.tau, 0.1);
/// assert_eq!(config.epsilon, 0.5);
/// assert_eq!(config.fps, 120);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowerConfig {
    /// Decay time constant in seconds. Smaller converges faster.
    pub tau: f64,
    /// Snap threshold: once the remaining distance is within this, the
    /// value jumps to the target and the follower goes idle.
    pub epsilon: f64,
    /// Maximum emissions per second.
    pub fps: u32,
    /// Handling of trailing emissions that repeat the last value.
    pub trailing: TrailingPolicy,
}

impl Default for FollowerConfig {
    fn default() -> Self {
        Self {
            tau: DEFAULT_TAU,
            epsilon: DEFAULT_EPSILON,
            fps: DEFAULT_FPS,
            trailing: TrailingPolicy::default(),
        }
    }
}

impl FollowerConfig {
    /// Sets the decay time constant.
    pub fn with_tau(mut self, tau: f64) -> Self {
        self.tau = tau;
        self
    }

    /// Sets the snap threshold.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Sets the maximum emission rate.
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Sets the trailing emission policy.
    pub fn with_trailing(mut self, trailing: TrailingPolicy) -> Self {
        self.trailing = trailing;
        self
    }

    /// Minimum spacing between emissions in milliseconds.
    pub fn emit_interval_ms(&self) -> f64 {
        frame_interval_ms(self.fps.max(1))
    }

    /// Checks that the values describe a follower that converges.
    ///
    /// # Errors
    /// Returns `ConfigValidationError` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !self.tau.is_finite() {
            return Err(ConfigValidationError::Tau(self.tau));
        }
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(ConfigValidationError::Epsilon(self.epsilon));
        }
        if self.fps == 0 {
            return Err(ConfigValidationError::Fps);
        }
        Ok(())
    }

    /// Load a config from JSON text.
    ///
    /// # Errors
    /// Returns `ConfigLoadError` if JSON parsing or validation fails.
    pub fn from_json(json: &str) -> Result<Self, ConfigLoadError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from TOML text.
    ///
    /// # Errors
    /// Returns `ConfigLoadError` if TOML parsing or validation fails.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigLoadError> {
        let config: Self = toml::from_str(toml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a file (format inferred by extension).
    ///
    /// # Errors
    /// Returns `ConfigLoadError` if reading, parsing, or validation fails.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            Some("toml") => Self::from_toml(&content),
            Some(ext) => Err(ConfigLoadError::UnsupportedFormat(ext.into())),
            None => Err(ConfigLoadError::UnsupportedFormat("unknown".into())),
        }?;
        debug!(config.path = %path.display(), config.tau = config.tau, config.fps = config.fps, "Follower config loaded");
        Ok(config)
    }

    /// Serialize this config to JSON.
    ///
    /// # Errors
    /// Returns `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Serialize this config to TOML.
    ///
    /// # Errors
    /// Returns `toml::ser::Error` if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Invalid follower tuning.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    #[error("tau must be finite, got {0}")]
    Tau(f64),
    #[error("epsilon must be finite and non-negative, got {0}")]
    Epsilon(f64),
    #[error("fps must be greater than zero")]
    Fps,
}

/// Error loading a follower config.
#[derive(Error, Debug)]
pub enum ConfigLoadError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Validation error: {0}")]
    Validation(#[from] ConfigValidationError),
}
