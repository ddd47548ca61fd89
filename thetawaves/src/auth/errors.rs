//! Authentication error types.

use thiserror::Error;

use crate::db::timeouts::TimeoutError;

/// The four outcomes a caller of the auth flow can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing input; the client must fix and resubmit.
    BadRequest,
    /// Email or username already registered.
    Conflict,
    /// Bad credentials or an unusable token.
    Unauthorized,
    /// Store, hashing or signing failure.
    Internal,
}

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// A required field was absent or blank
    #[error("{0}")]
    MissingFields(&'static str),

    /// Body did not match the request schema
    #[error("Invalid request body: {0}")]
    MalformedBody(String),

    /// Email is not shaped like an address
    #[error("Please enter a valid email")]
    InvalidEmail,

    /// Invalid username format
    #[error("{0}")]
    InvalidUsername(String),

    /// Password too short
    #[error("{0}")]
    WeakPassword(String),

    /// Email or username already exists
    #[error("User with this email or username already exists")]
    UserExists,

    /// Unknown username or wrong password
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Token signature or structure did not verify
    #[error("Invalid token")]
    InvalidToken,

    /// Token validity window has elapsed
    #[error("Token expired")]
    ExpiredToken,

    /// User referenced by a token no longer exists
    #[error("User not found")]
    UserNotFound,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Store call exceeded its deadline
    #[error("Database operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Password hashing failed
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    /// Stored hash could not be parsed
    #[error("Stored password hash is malformed")]
    MalformedHash,

    /// JWT signing error
    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AuthError {
    /// Classify into the error taxonomy the HTTP layer maps onto status codes.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::MissingFields(_)
            | AuthError::MalformedBody(_)
            | AuthError::InvalidEmail
            | AuthError::InvalidUsername(_)
            | AuthError::WeakPassword(_) => ErrorKind::BadRequest,
            AuthError::UserExists => ErrorKind::Conflict,
            AuthError::InvalidCredentials
            | AuthError::InvalidToken
            | AuthError::ExpiredToken
            | AuthError::UserNotFound => ErrorKind::Unauthorized,
            AuthError::Database(_)
            | AuthError::Timeout(_)
            | AuthError::HashingFailed(_)
            | AuthError::MalformedHash
            | AuthError::JwtError(_) => ErrorKind::Internal,
        }
    }

    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Token failures collapse into one message so the caller cannot tell a
    /// forged token from an expired one. Internal errors never reach the
    /// client through this method; the HTTP layer picks the generic wording.
    pub fn client_message(&self) -> String {
        match self {
            AuthError::InvalidToken | AuthError::ExpiredToken | AuthError::UserNotFound => {
                "Unauthenticated".to_string()
            }
            AuthError::Database(_) | AuthError::Timeout(_) => "Internal server error".to_string(),
            AuthError::HashingFailed(_) | AuthError::MalformedHash | AuthError::JwtError(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl From<TimeoutError> for AuthError {
    fn from(err: TimeoutError) -> Self {
        match err {
            TimeoutError::Timeout(d) => AuthError::Timeout(d),
            TimeoutError::Database(e) => AuthError::Database(e),
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
