//! # Error Types
//!
//! Errors that can occur while configuring, activating or reading a
//! publication region. Nothing in here is ever returned from a tick.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while bringing a publisher up.
#[derive(Error, Debug)]
pub enum PublishError {
    /// `activate()` called while a region is already live.
    #[error("publisher is already active")]
    AlreadyActive,

    /// `activate()` called after `deactivate()`; release is terminal.
    #[error("publisher has been released and cannot be reactivated")]
    Released,

    /// Mapped backing requested without a path.
    #[error("mapped region requires a path")]
    MissingPath,

    /// The backing file could not be created or mapped.
    #[error("failed to map region at {path}: {source}")]
    Map {
        /// Backing file.
        path: PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },

    /// Configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Config file.
        path: PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },

    /// TOML was malformed or did not match the schema.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Profile preset name is not known.
    #[error("unknown convention preset: {0}")]
    UnknownPreset(String),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised by the snapshot reader.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ReadError {
    /// Slot 0 does not hold the expected marker: no publisher, or wrong buffer.
    #[error("marker mismatch: expected {expected:e}, found {found:e}")]
    MarkerMismatch {
        /// Marker the reader was configured with.
        expected: f64,
        /// Value found in slot 0.
        found: f64,
    },

    /// Publisher is attached but has not completed a tick yet.
    #[error("publisher active but no frame published yet")]
    NotStarted,

    /// Every attempt observed a checksum mismatch.
    #[error("torn read: checksum mismatch after {attempts} attempts")]
    Torn {
        /// Number of samples taken.
        attempts: u32,
    },
}

/// Result type for publisher operations.
pub type PublishResult<T> = Result<T, PublishError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for reads.
pub type ReadResult<T> = Result<T, ReadError>;
