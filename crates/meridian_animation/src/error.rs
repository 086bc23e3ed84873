//! Animation engine error types

use thiserror::Error;

/// Errors raised while loading or validating configuration
///
/// Animation paths themselves never fail: bad numbers are sanitized and the
/// animation resolves as if it had reached its destination.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read animation config: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration text is not valid TOML for [`AnimationConfig`](crate::AnimationConfig)
    #[error("Failed to parse animation config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is outside its allowed range
    #[error("Invalid animation config: {0}")]
    Invalid(String),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
