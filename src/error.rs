//! Error types for FOSSology API operations.

use thiserror::Error;

/// Errors that can occur during FOSSology API operations.
#[derive(Debug, Error)]
pub enum FossologyError {
    /// Configuration is missing or incomplete.
    #[error("FOSSology configuration required: {0}")]
    ConfigMissing(String),

    /// A caller-supplied argument was rejected before any request was sent.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The server rejected the credentials.
    #[error("An error occurred during authentication against {url}, check your API token and try again")]
    Authentication { url: String },

    /// The server denied access to the resource or group (HTTP 403).
    #[error("{description}: {message} ({status_code})")]
    Authorization {
        description: String,
        message: String,
        status_code: u16,
    },

    /// The requested resource does not exist (HTTP 404).
    #[error("{description}: {message}")]
    NotFound { description: String, message: String },

    /// Any other unexpected response status.
    #[error("{description}: '{message}' ({status_code})")]
    ApiError {
        description: String,
        message: String,
        status_code: u16,
    },

    /// The server kept answering "not ready" until the attempt bound was reached.
    #[error("{description}: still not available after {attempts} attempts")]
    RetryExhausted { description: String, attempts: u32 },

    /// The endpoint is not available on the connected server version.
    #[error("{0}")]
    Unsupported(String),

    /// A CLI workflow step could not continue.
    #[error("{0}")]
    Workflow(String),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("Failed to parse response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    /// Local filesystem error (upload sources, reports, config files).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file could not be parsed.
    #[error("Invalid config file: {0}")]
    Config(#[from] toml::de::Error),

    /// An interactive question could not be answered.
    #[error("Interactive prompt failed: {0}")]
    Prompt(#[from] inquire::InquireError),

    /// Config file could not be written.
    #[error("Unable to write config file: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
}

impl FossologyError {
    /// HTTP status carried by the error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Authorization { status_code, .. } | Self::ApiError { status_code, .. } => {
                Some(*status_code)
            }
            Self::NotFound { .. } => Some(404),
            _ => None,
        }
    }

    /// Returns true when the server rejected a create call because the
    /// entity exists: a 400 or 409 whose message says "already exists".
    pub fn is_already_exists(&self) -> bool {
        match self {
            Self::ApiError {
                message,
                status_code: 400 | 409,
                ..
            } => message.contains("already exists"),
            _ => false,
        }
    }

    /// Returns true for [`FossologyError::RetryExhausted`].
    pub fn is_retry_exhausted(&self) -> bool {
        matches!(self, Self::RetryExhausted { .. })
    }
}

/// Result type alias for FOSSology operations.
pub type Result<T> = core::result::Result<T, FossologyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display_includes_message_and_status() {
        let err = FossologyError::ApiError {
            description: "Unable to delete upload 3".to_string(),
            message: "Upload does not exist".to_string(),
            status_code: 404,
        };
        assert_eq!(
            err.to_string(),
            "Unable to delete upload 3: 'Upload does not exist' (404)"
        );
        assert_eq!(err.status_code(), Some(404));
    }

    #[test]
    fn test_retry_exhausted_is_distinct() {
        let err = FossologyError::RetryExhausted {
            description: "Download of report 7".to_string(),
            attempts: 10,
        };
        assert!(err.is_retry_exhausted());
        assert!(err.status_code().is_none());
        assert!(err.to_string().contains("10 attempts"));
    }
}
