//! Repository traits over the store, with their PostgreSQL implementations.

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use super::timeouts::{TimeoutError, with_default_timeout};
use crate::auth::{AuthError, AuthResult, User, UserId};
use crate::songs::{SongError, SongResult};

/// Credential store operations used by the auth flow
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user. The store assigns `id`, `created_at` and `updated_at`.
    ///
    /// Must fail with `AuthError::UserExists` when the email or username is
    /// already taken, even if a concurrent insert won the race.
    async fn create_user(&self, email: &str, username: &str, password_hash: &str)
    -> AuthResult<User>;

    /// Find user by exact username
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>>;

    /// Find any user holding this email or this username
    async fn find_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> AuthResult<Option<User>>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>>;

    /// Check the store is reachable
    async fn health_check(&self) -> AuthResult<()> {
        Ok(())
    }
}

/// Per-user ordered song list
#[async_trait]
pub trait SongRepository: Send + Sync {
    /// Titles in insertion order
    async fn list_songs(&self, user_id: UserId) -> SongResult<Vec<String>>;

    /// Append a title
    async fn add_song(&self, user_id: UserId, title: &str) -> SongResult<()>;

    /// Replace the title at `index`
    async fn replace_song(&self, user_id: UserId, index: usize, title: &str) -> SongResult<()>;

    /// Remove the title at `index`, shifting later ones down
    async fn remove_song(&self, user_id: UserId, index: usize) -> SongResult<()>;
}

const USER_COLUMNS: &str = "id, email, username, password_hash, created_at, updated_at";

fn user_from_row(r: &PgRow) -> User {
    User {
        id: r.get("id"),
        email: r.get("email"),
        username: r.get("username"),
        password_hash: r.get("password_hash"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

/// Default PostgreSQL implementation of `UserRepository`
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_user(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> AuthResult<User> {
        let sql = format!(
            "INSERT INTO users (email, username, password_hash) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        );
        let row = with_default_timeout(
            sqlx::query(&sql)
                .bind(email)
                .bind(username)
                .bind(password_hash)
                .fetch_one(&self.pool),
        )
        .await
        .map_err(|e| match e {
            // Lost the race against a concurrent signup
            TimeoutError::Database(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                AuthError::UserExists
            }
            other => other.into(),
        })?;

        Ok(user_from_row(&row))
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let row = with_default_timeout(
            sqlx::query(&sql)
                .bind(username)
                .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn find_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> AuthResult<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 OR username = $2 LIMIT 1"
        );
        let row = with_default_timeout(
            sqlx::query(&sql)
                .bind(email)
                .bind(username)
                .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = with_default_timeout(
            sqlx::query(&sql)
                .bind(user_id)
                .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn health_check(&self) -> AuthResult<()> {
        with_default_timeout(sqlx::query("SELECT 1").execute(&self.pool)).await?;
        Ok(())
    }
}

/// Default PostgreSQL implementation of `SongRepository`
#[derive(Clone)]
pub struct PgSongRepository {
    pool: PgPool,
}

impl PgSongRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn offset(index: usize) -> SongResult<i64> {
    i64::try_from(index).map_err(|_| SongError::InvalidIndex)
}

#[async_trait]
impl SongRepository for PgSongRepository {
    async fn list_songs(&self, user_id: UserId) -> SongResult<Vec<String>> {
        let rows = with_default_timeout(
            sqlx::query("SELECT title FROM songs WHERE user_id = $1 ORDER BY id")
                .bind(user_id)
                .fetch_all(&self.pool),
        )
        .await?;

        Ok(rows.iter().map(|r| r.get("title")).collect())
    }

    async fn add_song(&self, user_id: UserId, title: &str) -> SongResult<()> {
        with_default_timeout(
            sqlx::query("INSERT INTO songs (user_id, title) VALUES ($1, $2)")
                .bind(user_id)
                .bind(title)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn replace_song(&self, user_id: UserId, index: usize, title: &str) -> SongResult<()> {
        let result = with_default_timeout(
            sqlx::query(
                r#"
                UPDATE songs SET title = $1
                WHERE id = (
                    SELECT id FROM songs WHERE user_id = $2 ORDER BY id LIMIT 1 OFFSET $3
                )
                "#,
            )
            .bind(title)
            .bind(user_id)
            .bind(offset(index)?)
            .execute(&self.pool),
        )
        .await?;

        if result.rows_affected() == 0 {
            return Err(SongError::InvalidIndex);
        }
        Ok(())
    }

    async fn remove_song(&self, user_id: UserId, index: usize) -> SongResult<()> {
        let result = with_default_timeout(
            sqlx::query(
                r#"
                DELETE FROM songs
                WHERE id = (
                    SELECT id FROM songs WHERE user_id = $1 ORDER BY id LIMIT 1 OFFSET $2
                )
                "#,
            )
            .bind(user_id)
            .bind(offset(index)?)
            .execute(&self.pool),
        )
        .await?;

        if result.rows_affected() == 0 {
            return Err(SongError::InvalidIndex);
        }
        Ok(())
    }
}
