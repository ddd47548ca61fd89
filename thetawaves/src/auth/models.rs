//! Authentication data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// User ID type, assigned by the store on creation
pub type UserId = Uuid;

/// Registered account as held by the credential store
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Public projection of the account; never carries the hash.
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            email: self.email.clone(),
            username: self.username.clone(),
        }
    }
}

/// `{id, email, username}` as returned to clients and persisted by them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub email: String,
    pub username: String,
}

/// Password as it travels towards the store.
///
/// Only a `Plain` value is ever fed to the hasher. A value loaded back from
/// the store is `Hashed` and passes through untouched, so a hash is never
/// hashed again.
#[derive(Clone, PartialEq, Eq)]
pub enum PasswordField {
    Plain(String),
    Hashed(String),
}

impl PasswordField {
    /// Whether the field was set from user input since it was last stored.
    pub fn is_modified(&self) -> bool {
        matches!(self, PasswordField::Plain(_))
    }
}

impl fmt::Debug for PasswordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordField::Plain(_) => f.write_str("Plain(<redacted>)"),
            PasswordField::Hashed(_) => f.write_str("Hashed(<redacted>)"),
        }
    }
}

/// Validated signup data, before the password is hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password: PasswordField,
}

/// Signup body. Fields are optional here so that a missing field is reported
/// as a bad request with a fixed message rather than as a parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignupRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Signin body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SigninRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// JWT claims carried by every session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: UserId,           // User ID
    pub username: String,
    pub iat: i64,              // Issued at timestamp
    pub exp: i64,              // Expiration timestamp
}

/// Result of a successful signup or signin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSuccess {
    pub message: String,
    pub token: String,
    pub user: UserSummary,
}
