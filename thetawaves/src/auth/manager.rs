//! Authentication manager implementation.

use super::{
    errors::{AuthError, AuthResult},
    hasher::PasswordHasher,
    models::{
        AuthSuccess, NewUser, SigninRequest, SignupRequest, TokenClaims, UserId, UserSummary,
    },
    tokens::TokenIssuer,
    validation::{validate_signin, validate_signup},
};
use crate::db::UserRepository;
use std::sync::Arc;

/// Orchestrates signup and signin over the credential store
#[derive(Clone)]
pub struct AuthManager {
    users: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
}

impl AuthManager {
    /// Create a new authentication manager
    ///
    /// # Arguments
    ///
    /// * `users` - Credential store
    /// * `hasher` - Password hasher (pepper and work factor already applied)
    /// * `tokens` - Token issuer (secret and lifetime already applied)
    pub fn new(users: Arc<dyn UserRepository>, hasher: PasswordHasher, tokens: TokenIssuer) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    /// Token issuer, for callers that verify tokens without the store
    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Credential store handle
    pub fn users(&self) -> &Arc<dyn UserRepository> {
        &self.users
    }

    /// Register a new user and issue their first token
    ///
    /// # Errors
    ///
    /// * `AuthError::MissingFields` - email, username or password absent
    /// * `AuthError::InvalidEmail` / `InvalidUsername` / `WeakPassword` - shape checks
    /// * `AuthError::UserExists` - email or username taken, including a lost insert race
    /// * `AuthError::Database` / `Timeout` / `HashingFailed` - internal failures
    pub async fn signup(&self, request: SignupRequest) -> AuthResult<AuthSuccess> {
        let NewUser {
            email,
            username,
            password,
        } = validate_signup(request)?;

        if self
            .users
            .find_by_email_or_username(&email, &username)
            .await?
            .is_some()
        {
            return Err(AuthError::UserExists);
        }

        let password_hash = self.hasher.resolve_blocking(password).await?;
        let user = self
            .users
            .create_user(&email, &username, &password_hash)
            .await?;

        log::info!("Registered user {} ({})", user.id, user.username);

        let token = self.tokens.issue(user.id, &user.username)?;

        Ok(AuthSuccess {
            message: "User created successfully".to_string(),
            token,
            user: user.summary(),
        })
    }

    /// Check credentials and issue a fresh token
    ///
    /// An unknown username and a wrong password both fail with
    /// `AuthError::InvalidCredentials`.
    pub async fn signin(&self, request: SigninRequest) -> AuthResult<AuthSuccess> {
        let credentials = validate_signin(request)?;

        let Some(user) = self.users.find_by_username(&credentials.username).await? else {
            // Same hashing cost as a wrong password
            self.hasher
                .verify_decoy_blocking(credentials.password)
                .await?;
            log::info!("Signin failed: no user '{}'", credentials.username);
            return Err(AuthError::InvalidCredentials);
        };

        let valid = self
            .hasher
            .verify_blocking(credentials.password, user.password_hash.clone())
            .await?;

        if !valid {
            log::info!("Signin failed: wrong password for '{}'", user.username);
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id, &user.username)?;

        Ok(AuthSuccess {
            message: "Logged in successfully".to_string(),
            token,
            user: user.summary(),
        })
    }

    /// Verify a token's signature and expiry. No store access.
    pub fn verify_token(&self, token: &str) -> AuthResult<TokenClaims> {
        self.tokens.verify(token)
    }

    /// Look up the account behind an already verified token's subject
    ///
    /// # Errors
    ///
    /// * `AuthError::UserNotFound` - account no longer exists
    pub async fn current_user(&self, user_id: UserId) -> AuthResult<UserSummary> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(|u| u.summary())
            .ok_or(AuthError::UserNotFound)
    }
}
