//! Error types for the session verifier.
//!
//! Authorization failures collapse into a single [`VerifierError::Unauthorized`]
//! variant so callers cannot tell which check rejected a token. Store and
//! signing faults stay distinct: they are operational failures, not
//! authorization decisions.

use thiserror::Error;

/// Errors returned by the verifier and its stores.
#[derive(Error, Debug)]
pub enum VerifierError {
    /// Token rejected, for any reason
    #[error("Token is invalid")]
    Unauthorized,

    /// Backing store fault
    #[error("Store error: {0}")]
    Store(String),

    /// Token signing failed
    #[error("JWT encoding error: {0}")]
    JwtEncoding(String),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Absent identity or session id
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Malformed password hash or hashing failure
    #[error("Password hash error: {0}")]
    PasswordHash(String),
}

impl VerifierError {
    /// Create a store error with the given message.
    #[must_use]
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a configuration error with the given message.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error with the given message.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Check if this error is retryable.
    ///
    /// Only store faults are transient; everything else fails the same way
    /// on every attempt.
    ///
    /// # Examples
    ///
    /// ```
    /// use session_verifier::VerifierError;
    ///
    /// assert!(VerifierError::store("connection reset").is_retryable());
    /// assert!(!VerifierError::Unauthorized.is_retryable());
    /// ```
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    /// True for the authorization-failure sentinel.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

impl From<redis::RedisError> for VerifierError {
    fn from(err: redis::RedisError) -> Self {
        Self::Store(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for VerifierError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::JwtEncoding(err.to_string())
    }
}

// Stable error codes for callers that map errors onto a wire protocol
/// Code for [`VerifierError::Unauthorized`].
pub const TOKEN_UNAUTHORIZED: &str = "TOKEN_UNAUTHORIZED";
/// Code for [`VerifierError::Store`].
pub const TOKEN_STORE_ERROR: &str = "TOKEN_STORE_ERROR";
/// Code for [`VerifierError::JwtEncoding`].
pub const TOKEN_SIGNING_ERROR: &str = "TOKEN_SIGNING_ERROR";

impl VerifierError {
    /// Stable error code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => TOKEN_UNAUTHORIZED,
            Self::Store(_) => TOKEN_STORE_ERROR,
            Self::JwtEncoding(_) => TOKEN_SIGNING_ERROR,
            Self::Config(_) => "CONFIG_ERROR",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::PasswordHash(_) => "PASSWORD_HASH_ERROR",
        }
    }
}
