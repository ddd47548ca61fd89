//! Authentication module: signup, signin and token verification.
//!
//! This module implements:
//! - Argon2id password hashing with server-side pepper
//! - HS256 JWT session tokens with a configurable lifetime
//! - Input validation with fixed, enumeration-safe error messages
//!
//! ## Example
//!
//! ```no_run
//! use thetawaves::auth::{AuthManager, HasherConfig, PasswordHasher, SignupRequest, TokenIssuer, DEFAULT_TOKEN_TTL};
//! use thetawaves::db::MemoryStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let auth = AuthManager::new(
//!         Arc::new(MemoryStore::new()),
//!         PasswordHasher::new("secret_pepper".to_string(), HasherConfig::default())?,
//!         TokenIssuer::new("jwt_secret", DEFAULT_TOKEN_TTL),
//!     );
//!
//!     let request = SignupRequest {
//!         email: Some("a@b.com".to_string()),
//!         username: Some("alice".to_string()),
//!         password: Some("secret1".to_string()),
//!     };
//!
//!     let result = auth.signup(request).await?;
//!     println!("Registered user: {}", result.user.username);
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod hasher;
pub mod manager;
pub mod models;
pub mod tokens;
pub mod validation;

pub use errors::{AuthError, AuthResult, ErrorKind};
pub use hasher::{HasherConfig, PasswordHasher};
pub use manager::AuthManager;
pub use models::{
    AuthSuccess, NewUser, PasswordField, SigninRequest, SignupRequest, TokenClaims, User, UserId,
    UserSummary,
};
pub use tokens::{DEFAULT_TOKEN_TTL, TokenIssuer};
