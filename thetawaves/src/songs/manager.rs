//! Song list service: input checks in front of the repository.

use std::sync::Arc;

use super::errors::{SongError, SongResult};
use crate::auth::UserId;
use crate::db::SongRepository;

/// Longest accepted title, in characters
pub const MAX_TITLE_LEN: usize = 200;

/// Per-user song list
#[derive(Clone)]
pub struct SongManager {
    repo: Arc<dyn SongRepository>,
}

fn clean_title(title: &str) -> SongResult<&str> {
    let title = title.trim();
    if title.is_empty() {
        return Err(SongError::EmptyTitle);
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(SongError::TitleTooLong(MAX_TITLE_LEN));
    }
    Ok(title)
}

fn to_index(index: i64) -> SongResult<usize> {
    usize::try_from(index).map_err(|_| SongError::InvalidIndex)
}

impl SongManager {
    pub fn new(repo: Arc<dyn SongRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, user_id: UserId) -> SongResult<Vec<String>> {
        self.repo.list_songs(user_id).await
    }

    pub async fn add(&self, user_id: UserId, title: &str) -> SongResult<()> {
        self.repo.add_song(user_id, clean_title(title)?).await
    }

    /// Replace the title at `index`. Negative or out-of-range indices fail
    /// with `SongError::InvalidIndex`.
    pub async fn replace(&self, user_id: UserId, index: i64, title: &str) -> SongResult<()> {
        let title = clean_title(title)?;
        self.repo.replace_song(user_id, to_index(index)?, title).await
    }

    pub async fn remove(&self, user_id: UserId, index: i64) -> SongResult<()> {
        self.repo.remove_song(user_id, to_index(index)?).await
    }
}
