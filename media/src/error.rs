//! Error types for video uploads

use thiserror::Error;

/// Result type alias for media operations.
pub type Result<T> = std::result::Result<T, MediaError>;

/// Errors that can occur while brokering an upload
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaError {
    /// The title or file failed validation
    #[error("Invalid upload: {0}")]
    Validation(String),

    /// Caller may not upload videos
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// File exceeds the configured maximum
    #[error("File is {size} bytes, the limit is {max} bytes")]
    TooLarge {
        /// Size of the rejected file
        size: u64,
        /// Configured maximum
        max: u64,
    },

    /// The video platform failed or rejected a call
    #[error("Video platform error{}: {message}", .status.map(|s| format!(" (status {s})")).unwrap_or_default())]
    Platform {
        /// HTTP status, when a response was received
        status: Option<u16>,
        /// Error message from the platform or transport
        message: String,
    },
}

impl MediaError {
    /// Platform error without an HTTP status (transport or decoding failure).
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Platform {
            status: None,
            message: message.into(),
        }
    }

    /// Short outcome label for metrics.
    #[must_use]
    pub const fn outcome(&self) -> &'static str {
        match self {
            Self::Validation(_) => "invalid",
            Self::Forbidden(_) => "forbidden",
            Self::TooLarge { .. } => "too_large",
            Self::Platform { .. } => "platform_error",
        }
    }
}

impl From<campus_auth::AuthError> for MediaError {
    fn from(err: campus_auth::AuthError) -> Self {
        Self::Forbidden(err.to_string())
    }
}
