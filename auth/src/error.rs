//! Error types for authentication, authorization and rate limiting.

use thiserror::Error;

/// Result type alias for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Failure modes of the auth layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // Authentication Errors
    // ═══════════════════════════════════════════════════════════

    /// No credentials were presented.
    #[error("Missing credentials")]
    MissingCredentials,

    /// The access token was rejected by the identity provider.
    #[error("Invalid or expired access token")]
    InvalidToken,

    // ═══════════════════════════════════════════════════════════
    // Authorization Errors
    // ═══════════════════════════════════════════════════════════

    /// Caller lacks the required role.
    #[error("Insufficient permissions: {required}")]
    InsufficientPermissions {
        /// Roles that would have been accepted
        required: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Rate Limiting
    // ═══════════════════════════════════════════════════════════

    /// Too many requests inside the current window.
    #[error("Too many requests, please retry after {retry_after:?}")]
    TooManyAttempts {
        /// Duration to wait before retrying
        retry_after: std::time::Duration,
    },

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// The identity provider could not be reached or answered unexpectedly.
    #[error("Identity provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Internal error (should not be exposed to users).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AuthError {
    /// Returns `true` if this error is caused by the caller rather than the system.
    ///
    /// # Examples
    ///
    /// ```
    /// # use campus_auth::AuthError;
    /// assert!(AuthError::InvalidToken.is_user_error());
    /// assert!(!AuthError::DatabaseError("boom".into()).is_user_error());
    /// ```
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::MissingCredentials
                | Self::InvalidToken
                | Self::InsufficientPermissions { .. }
                | Self::TooManyAttempts { .. }
        )
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        Self::DatabaseError(err.to_string())
    }
}

impl From<redis::RedisError> for AuthError {
    fn from(err: redis::RedisError) -> Self {
        Self::InternalError(format!("Redis error: {err}"))
    }
}
