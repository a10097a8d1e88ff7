//! Error types for docvendor.
//!
//! Library crates use [`DocVendorError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all docvendor operations.
#[derive(Debug, thiserror::Error)]
pub enum DocVendorError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The upstream document directory to vendor does not exist.
    #[error("source document directory not found: {}", path.display())]
    MissingSource { path: PathBuf },

    /// The document registry file does not exist.
    #[error("registry file not found: {}", path.display())]
    MissingRegistry { path: PathBuf },

    /// The registry exists but could not be parsed.
    #[error("invalid registry {}: {message}", path.display())]
    Registry { path: PathBuf, message: String },

    /// JSON serialization error while writing a registry or change record.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocVendorError>;

impl DocVendorError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a registry parse error for the given file.
    pub fn registry(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Registry {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = DocVendorError::config("site_base is not a URL");
        assert_eq!(err.to_string(), "config error: site_base is not a URL");

        let err = DocVendorError::MissingRegistry {
            path: PathBuf::from("content/docs/registry.json"),
        };
        assert_eq!(
            err.to_string(),
            "registry file not found: content/docs/registry.json"
        );

        let err = DocVendorError::registry("r.json", "expected an array");
        assert!(err.to_string().contains("expected an array"));
    }
}
