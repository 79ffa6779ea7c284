//! Custom error types for cryptoscope.
//!
//! Three families show up here: input validation (rejected before any network
//! call), transport failures talking to the prediction API, and data-shape
//! problems with cached or fetched payloads.

use std::path::PathBuf;

/// The main error type for cryptoscope operations.
#[derive(Debug, thiserror::Error)]
pub enum ScopeError {
    /// I/O error (file read/write, permissions, etc.)
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport error (connection refused, timeout, bad body)
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Persisted analysis lookup found nothing
    #[error("Analysis not found: {0}")]
    NotFound(String),

    /// File too large for upload
    #[error("File too large: {path:?} is {size_mb}MB (limit: {limit_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        limit_mb: u64,
    },

    /// Selected file has no content
    #[error("File is empty: {0:?}")]
    EmptyFile(PathBuf),

    /// Submit was triggered with nothing selected
    #[error("No file selected")]
    NoFileSelected,

    /// Generic error for external library errors
    #[error("{context}: {message}")]
    External { context: String, message: String },
}

/// Result type alias using ScopeError
pub type ScopeResult<T> = Result<T, ScopeError>;

impl ScopeError {
    /// Create an I/O error with path context
    pub fn io(source: std::io::Error, path: impl Into<Option<PathBuf>>) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an external error with context
    pub fn external(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::External {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Validation errors are reported inline and never reach the network.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::FileTooLarge { .. } | Self::EmptyFile(_) | Self::NoFileSelected
        )
    }

    /// Transport errors: the request was attempted but did not succeed.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status { .. } | Self::NotFound(_))
    }
}

/// Convert from raw I/O errors (without path context)
impl From<std::io::Error> for ScopeError {
    fn from(source: std::io::Error) -> Self {
        Self::Io { path: None, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let err = ScopeError::io(
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
            Some(PathBuf::from("/test/firmware.bin")),
        );
        assert!(err.to_string().contains("/test/firmware.bin"));
    }

    #[test]
    fn test_file_too_large_is_validation() {
        let err = ScopeError::FileTooLarge {
            path: PathBuf::from("big.bin"),
            size_mb: 64,
            limit_mb: 50,
        };
        assert!(err.is_validation());
        assert!(!err.is_transport());
        assert!(err.to_string().contains("64MB"));
        assert!(err.to_string().contains("50MB"));
    }

    #[test]
    fn test_status_is_transport() {
        let err = ScopeError::Status {
            status: 500,
            body: "Database not connected".to_string(),
        };
        assert!(err.is_transport());
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ScopeError = io_err.into();
        assert!(matches!(err, ScopeError::Io { path: None, .. }));
    }
}
