//! Configuration errors.

use thiserror::Error;

/// ConfigError is raised while building a Config, before any traversal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown option: {name}")]
    UnknownOption { name: String },

    #[error("invalid option {name}: {reason}")]
    InvalidOption { name: String, reason: String },

    #[error("invalid exclude pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("unknown hash function: {0}")]
    UnknownHasher(String),

    #[error("failed to parse options: {0}")]
    Parse(String),
}

impl ConfigError {
    /// Creates an invalid option error.
    pub fn invalid_option(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidOption {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
