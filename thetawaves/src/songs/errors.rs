//! Song list error types.

use thiserror::Error;

use crate::db::timeouts::TimeoutError;

/// Song list errors
#[derive(Debug, Error)]
pub enum SongError {
    /// Blank title
    #[error("Song title must not be empty")]
    EmptyTitle,

    /// Title over the length limit
    #[error("Song title must be at most {0} characters")]
    TitleTooLong(usize),

    /// Index outside the caller's list
    #[error("Invalid index")]
    InvalidIndex,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Store call exceeded its deadline
    #[error("Database operation timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl SongError {
    /// Whether the caller can fix this by changing the request
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SongError::EmptyTitle | SongError::TitleTooLong(_) | SongError::InvalidIndex
        )
    }
}

impl From<TimeoutError> for SongError {
    fn from(err: TimeoutError) -> Self {
        match err {
            TimeoutError::Timeout(d) => SongError::Timeout(d),
            TimeoutError::Database(e) => SongError::Database(e),
        }
    }
}

/// Result type for song list operations
pub type SongResult<T> = Result<T, SongError>;
