//! # Engine Error Types
//!
//! Everything that can fail on the participant side. None of these are fatal
//! for a session: callers log them and the object stays absent or inert.

use std::path::PathBuf;

use concord_core::SceneError;
use concord_networking::BusError;
use thiserror::Error;

/// Errors raised by the participant engine.
#[derive(Error, Debug)]
pub enum ConcordError {
    /// Configuration text was not valid TOML for [`crate::EngineConfig`].
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Environment, model or texture fetch failed.
    #[error("failed to load {url}: {reason}")]
    AssetLoad {
        /// Asset that was requested.
        url: String,
        /// What went wrong.
        reason: String,
    },

    /// Scene graph rejected an operation.
    #[error("scene: {0}")]
    Scene(#[from] SceneError),

    /// Intent could not be handed to the bus.
    #[error("bus: {0}")]
    Bus(#[from] BusError),
}

/// Result type for engine operations.
pub type ConcordResult<T> = Result<T, ConcordError>;
