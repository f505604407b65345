//! Error types for configuration loading, decoding and watching.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while locating, reading, decoding or watching configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No candidate path existed for the identifier.
    #[error("could not find a configuration for '{identifier}'")]
    NotFound { identifier: String },

    /// The existence check itself failed for a reason other than absence.
    #[error("could not check {}: {source}", .path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file exists but could not be read.
    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// No codec is registered for the identifier's extension.
    #[error("no matching codec for {identifier}")]
    NoMatchingCodec { identifier: String },

    /// The codec rejected the content.
    #[error("{format} decode error: {message}")]
    Deserialize {
        format: &'static str,
        message: String,
    },

    /// The codec could not encode the value.
    #[error("{format} encode error: {message}")]
    Serialize {
        format: &'static str,
        message: String,
    },

    /// A loader was requested for an empty identifier.
    #[error("identifier cannot be empty")]
    EmptyIdentifier,

    /// Registering interest with the OS notification primitive failed.
    #[error("could not watch {}: {message}", .path.display())]
    WatchSetup { path: PathBuf, message: String },

    /// The loader has no backing file to watch.
    #[error("loader for '{identifier}' does not support watching")]
    WatchUnsupported { identifier: String },

    /// A dot-path key could not be written.
    #[error("cannot set '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// A layered file source did not contain a mapping at its root.
    #[error("configuration '{identifier}' is not a mapping")]
    NotAMapping { identifier: String },

    /// The update consumer went away before the initial value was published.
    #[error("update channel closed before the initial configuration was published")]
    UpdatesClosed,
}

impl ConfigError {
    pub fn not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            identifier: identifier.into(),
        }
    }

    pub fn deserialize(format: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Deserialize {
            format,
            message: err.to_string(),
        }
    }

    pub fn serialize(format: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Serialize {
            format,
            message: err.to_string(),
        }
    }

    pub fn watch_setup(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::WatchSetup {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub fn invalid_key(key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns true if the error means "nothing was found" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConfigError::NotFound { .. })
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_identifier() {
        let err = ConfigError::not_found("settings");
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "could not find a configuration for 'settings'"
        );
    }

    #[test]
    fn test_stat_error_keeps_source() {
        let err = ConfigError::Stat {
            path: PathBuf::from("/etc/app.yaml"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert!(!err.is_not_found());
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().starts_with("could not check /etc/app.yaml"));
    }
}
