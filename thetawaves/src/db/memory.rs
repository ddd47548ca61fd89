//! In-process store for development mode and tests.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::repository::{SongRepository, UserRepository};
use crate::auth::{AuthError, AuthResult, User, UserId};
use crate::songs::{SongError, SongResult};

/// Users and song lists held in memory.
///
/// Each operation takes the lock once, so the uniqueness check and the
/// insert in `create_user` cannot interleave with another signup.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<UserId, User>>,
    songs: Mutex<HashMap<UserId, Vec<String>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered users
    pub fn user_count(&self) -> usize {
        lock(&self.users).len()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> AuthResult<User> {
        let mut users = lock(&self.users);

        if users
            .values()
            .any(|u| u.email == email || u.username == username)
        {
            return Err(AuthError::UserExists);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        Ok(lock(&self.users)
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> AuthResult<Option<User>> {
        Ok(lock(&self.users)
            .values()
            .find(|u| u.email == email || u.username == username)
            .cloned())
    }

    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>> {
        Ok(lock(&self.users).get(&user_id).cloned())
    }
}

#[async_trait]
impl SongRepository for MemoryStore {
    async fn list_songs(&self, user_id: UserId) -> SongResult<Vec<String>> {
        Ok(lock(&self.songs).get(&user_id).cloned().unwrap_or_default())
    }

    async fn add_song(&self, user_id: UserId, title: &str) -> SongResult<()> {
        lock(&self.songs)
            .entry(user_id)
            .or_default()
            .push(title.to_string());
        Ok(())
    }

    async fn replace_song(&self, user_id: UserId, index: usize, title: &str) -> SongResult<()> {
        let mut songs = lock(&self.songs);
        let slot = songs
            .get_mut(&user_id)
            .and_then(|list| list.get_mut(index))
            .ok_or(SongError::InvalidIndex)?;
        *slot = title.to_string();
        Ok(())
    }

    async fn remove_song(&self, user_id: UserId, index: usize) -> SongResult<()> {
        let mut songs = lock(&self.songs);
        let list = songs
            .get_mut(&user_id)
            .filter(|list| index < list.len())
            .ok_or(SongError::InvalidIndex)?;
        list.remove(index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_create_user_assigns_id_and_timestamps() {
        let store = MemoryStore::new();
        let user = store.create_user("a@b.com", "alice", "hash").await.unwrap();
        assert_eq!(user.created_at, user.updated_at);
        let found = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(found.username, "alice");
    }

    #[tokio::test]
    async fn test_duplicate_email_or_username_rejected() {
        let store = MemoryStore::new();
        store.create_user("a@b.com", "alice", "hash").await.unwrap();

        assert!(matches!(
            store.create_user("a@b.com", "bob", "hash").await,
            Err(AuthError::UserExists)
        ));
        assert!(matches!(
            store.create_user("c@d.com", "alice", "hash").await,
            Err(AuthError::UserExists)
        ));
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_signups_only_one_wins() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .create_user(&format!("user{i}@b.com"), "racer", "hash")
                    .await
            }));
        }

        let mut won = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => won += 1,
                Err(e) => assert!(matches!(e, AuthError::UserExists)),
            }
        }
        assert_eq!(won, 1);
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn test_song_list_is_per_user() {
        let store = MemoryStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        store.add_song(alice, "Attack").await.unwrap();
        store.add_song(alice, "Dreaming").await.unwrap();
        store.add_song(bob, "Bubbles").await.unwrap();

        assert_eq!(store.list_songs(alice).await.unwrap(), vec!["Attack", "Dreaming"]);
        assert_eq!(store.list_songs(bob).await.unwrap(), vec!["Bubbles"]);
        assert!(store.list_songs(Uuid::new_v4()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_and_remove_by_index() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        for title in ["Attack", "Dreaming", "Tentative"] {
            store.add_song(user, title).await.unwrap();
        }

        store.replace_song(user, 1, "U-Fig").await.unwrap();
        store.remove_song(user, 0).await.unwrap();
        assert_eq!(store.list_songs(user).await.unwrap(), vec!["U-Fig", "Tentative"]);

        assert!(matches!(
            store.replace_song(user, 2, "x").await,
            Err(SongError::InvalidIndex)
        ));
        assert!(matches!(
            store.remove_song(Uuid::new_v4(), 0).await,
            Err(SongError::InvalidIndex)
        ));
    }
}
