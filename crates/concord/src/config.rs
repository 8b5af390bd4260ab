//! # Engine Configuration
//!
//! Loaded once at startup from TOML. Every field is optional in the file and
//! falls back to the defaults in [`concord_shared::constants`].
//!
//! ```toml
//! debug_mode = true
//!
//! [gesture]
//! scale_deadband = 0.05
//! min_size = 0.1
//!
//! [authority]
//! release_held_on_disconnect = false
//! ```

use std::path::Path;

use concord_networking::AuthorityConfig;
use concord_shared::constants::{
    DEFAULT_FRAME_RATE, DEFAULT_MODEL_URL, MAX_PUSH_DEPTH, MIN_PULL_DEPTH, MIN_SIZE, PUSH_PULL_AXIS_GAIN,
    PUSH_PULL_DEADZONE, PUSH_PULL_DEPTH_EXPONENT, PUSH_PULL_VELOCITY_MULTIPLIER,
    SCALE_DEADBAND, SCALE_RATE_DIVISOR,
};
use serde::{Deserialize, Serialize};

use crate::error::{ConcordError, ConcordResult};

/// Gesture tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Distance change ignored around the initial two-hand distance.
    pub scale_deadband: f32,
    /// Distance delta is divided by this before it touches the scale.
    pub scale_rate_divisor: f32,
    /// Per-axis scale floor.
    pub min_size: f32,
    /// Joystick magnitude below which push/pull is ignored.
    pub push_pull_deadzone: f32,
    /// Base push/pull velocity.
    pub push_pull_velocity_multiplier: f32,
    /// Gain on the raw axis value.
    pub push_pull_axis_gain: f32,
    /// Exponent on |depth|.
    pub push_pull_depth_exponent: f32,
    /// No pulling once depth is above this.
    pub min_pull_depth: f32,
    /// No pushing once depth is below this.
    pub max_push_depth: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            scale_deadband: SCALE_DEADBAND,
            scale_rate_divisor: SCALE_RATE_DIVISOR,
            min_size: MIN_SIZE,
            push_pull_deadzone: PUSH_PULL_DEADZONE,
            push_pull_velocity_multiplier: PUSH_PULL_VELOCITY_MULTIPLIER,
            push_pull_axis_gain: PUSH_PULL_AXIS_GAIN,
            push_pull_depth_exponent: PUSH_PULL_DEPTH_EXPONENT,
            min_pull_depth: MIN_PULL_DEPTH,
            max_push_depth: MAX_PUSH_DEPTH,
        }
    }
}

/// Top-level engine configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Gesture tuning.
    pub gesture: GestureConfig,
    /// Authority policy.
    pub authority: AuthorityConfig,
    /// Escalates asset-load failures from `debug` to `warn`.
    pub debug_mode: bool,
    /// Model loaded when the host does not name an asset.
    pub default_model_url: String,
    /// Frames per second for session drivers.
    pub frame_rate: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gesture: GestureConfig::default(),
            authority: AuthorityConfig::default(),
            debug_mode: false,
            default_model_url: DEFAULT_MODEL_URL.to_owned(),
            frame_rate: DEFAULT_FRAME_RATE,
        }
    }
}

impl EngineConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// [`ConcordError::Config`] if the text is not valid for this struct.
    pub fn from_toml_str(text: &str) -> ConcordResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// [`ConcordError::Io`] if the file cannot be read, otherwise as
    /// [`Self::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> ConcordResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConcordError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!(path = %path.display(), "engine config loaded");
        Ok(config)
    }
}
