//! Error handling for gcodepin
//!
//! Provides the error types shared by every crate of the workspace:
//! - Configuration errors (validation, unsupported formats, policy conflicts)
//! - Domain value errors (unknown pin shapes)
//! - File and (de)serialization errors
//!
//! All error types use `thiserror` for ergonomic error handling.

use std::io;
use thiserror::Error;

/// Configuration error type
///
/// Raised while loading or validating a [`crate::PinningConfig`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A setting holds a value outside its valid domain
    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting {
        /// Dotted path of the offending setting.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Two enabled policies cannot be combined
    #[error("Incompatible policies: {0}")]
    IncompatiblePolicies(String),

    /// The configuration file format is not supported
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidSetting`]
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Main error type for gcodepin-core
#[derive(Error, Debug)]
pub enum Error {
    /// Unrecognized pin cross-section shape
    #[error("Unknown pin shape: {0}")]
    UnknownShape(String),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error
    #[error("TOML error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl Error {
    /// Check if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for configuration validation
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
