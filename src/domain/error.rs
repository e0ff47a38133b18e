//! Domain-level error types for gdrive-local-sync.
//!
//! All errors are typed with `thiserror`. The sync engine turns most of them
//! into a `failed` counter for the offending entry; only the CLI decides
//! which ones end the process.

use std::path::PathBuf;
use thiserror::Error;

/// Application-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration or environment error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO operation failed.
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// No usable credentials, or the token could not be refreshed.
    #[error("Authentication error: {message}")]
    Auth { message: String },

    /// The remote service rejected a request or the transport failed.
    #[error("Remote error: {message}")]
    Remote {
        message: String,
        /// HTTP status, when the server answered at all.
        status: Option<u16>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Input is neither a folder URL nor a bare folder ID.
    #[error("Cannot parse a Google Drive folder ID from: {input}")]
    InvalidFolderRef { input: String },

    /// The resolved root exists but is not a folder.
    #[error("Not a folder: {name} ({id})")]
    NotAFolder { id: String, name: String },

    /// Local root could not be created; nowhere to write.
    #[error("Cannot create local root {path}: {source}")]
    LocalRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {message}")]
    JsonParse {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// The run was interrupted by the user.
    #[error("Operation cancelled")]
    Cancelled,
}

impl AppError {
    /// Create a JSON parse error.
    pub fn json_parse(err: serde_json::Error) -> Self {
        Self::JsonParse {
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create an IO error with context.
    pub fn io(message: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(err),
        }
    }

    /// Create a remote error from a transport failure.
    pub fn remote(message: impl Into<String>, err: reqwest::Error) -> Self {
        Self::Remote {
            message: message.into(),
            status: err.status().map(|s| s.as_u16()),
            source: Some(Box::new(err)),
        }
    }

    /// Create a remote error for a non-success HTTP status.
    pub fn remote_status(message: impl Into<String>, status: u16) -> Self {
        Self::Remote {
            message: message.into(),
            status: Some(status),
            source: None,
        }
    }

    /// Whether this error represents user cancellation rather than a failure.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_status_message() {
        let err = AppError::remote_status("GET /files failed with 404", 404);
        assert_eq!(err.to_string(), "Remote error: GET /files failed with 404");
        assert!(matches!(err, AppError::Remote { status: Some(404), .. }));
    }

    #[test]
    fn test_is_cancelled() {
        assert!(AppError::Cancelled.is_cancelled());
        assert!(!AppError::Config {
            message: "x".into()
        }
        .is_cancelled());
    }
}
