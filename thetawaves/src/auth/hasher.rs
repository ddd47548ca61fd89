//! Argon2id password hashing with a server-side pepper.

use super::{
    errors::{AuthError, AuthResult},
    models::PasswordField,
};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        self, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use std::sync::Arc;
use uuid::Uuid;

/// Work factor for new hashes.
///
/// Existing hashes always verify with the parameters embedded in their PHC
/// string, so raising these only affects passwords hashed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HasherConfig {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl HasherConfig {
    /// Minimal work factor for tests and local development.
    pub fn fast() -> Self {
        Self {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        }
    }
}

/// Salted one-way password hasher
#[derive(Clone)]
pub struct PasswordHasher {
    pepper: String,
    params: Params,
    /// Hash of a random value under the same work factor. Verified against
    /// when no stored hash exists so that path costs the same as a real one.
    decoy: Arc<str>,
}

impl PasswordHasher {
    /// Create a hasher with the given pepper and work factor
    ///
    /// # Errors
    ///
    /// * `AuthError::HashingFailed` - Work factor rejected by Argon2
    pub fn new(pepper: String, config: HasherConfig) -> AuthResult<Self> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| AuthError::HashingFailed(e.to_string()))?;
        let mut hasher = Self {
            pepper,
            params,
            decoy: Arc::from(""),
        };
        hasher.decoy = Arc::from(hasher.hash(&Uuid::new_v4().to_string())?);
        Ok(hasher)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    fn peppered(&self, password: &str) -> String {
        format!("{}{}", password, self.pepper)
    }

    /// Hash a plaintext password with a fresh random salt.
    ///
    /// Returns a self-describing PHC string (`$argon2id$v=19$m=..,t=..,p=..$salt$digest`).
    pub fn hash(&self, plaintext: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        Ok(self
            .argon2()
            .hash_password(self.peppered(plaintext).as_bytes(), &salt)
            .map_err(|e| AuthError::HashingFailed(e.to_string()))?
            .to_string())
    }

    /// Check a candidate against a stored hash.
    ///
    /// A mismatch is `Ok(false)`. Only a stored hash that cannot be parsed is
    /// an error, and it is an internal one.
    pub fn verify(&self, plaintext: &str, stored: &str) -> AuthResult<bool> {
        let parsed = PasswordHash::new(stored).map_err(|_| AuthError::MalformedHash)?;

        match self
            .argon2()
            .verify_password(self.peppered(plaintext).as_bytes(), &parsed)
        {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::HashingFailed(e.to_string())),
        }
    }

    /// Resolve a password field to the value that gets persisted.
    ///
    /// Hashes `Plain` exactly once; `Hashed` is returned as is.
    pub fn resolve(&self, field: PasswordField) -> AuthResult<String> {
        match field {
            PasswordField::Plain(plaintext) => self.hash(&plaintext),
            PasswordField::Hashed(hash) => Ok(hash),
        }
    }

    /// [`resolve`](Self::resolve) on the blocking pool, off the async workers.
    pub async fn resolve_blocking(&self, field: PasswordField) -> AuthResult<String> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.resolve(field))
            .await
            .map_err(|e| AuthError::HashingFailed(e.to_string()))?
    }

    /// Spend one verification's worth of work on a candidate that has no
    /// stored hash. Always `false`.
    pub fn verify_decoy(&self, plaintext: &str) -> AuthResult<bool> {
        self.verify(plaintext, &self.decoy).map(|_| false)
    }

    /// [`verify_decoy`](Self::verify_decoy) on the blocking pool.
    pub async fn verify_decoy_blocking(&self, plaintext: String) -> AuthResult<bool> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify_decoy(&plaintext))
            .await
            .map_err(|e| AuthError::HashingFailed(e.to_string()))?
    }

    /// [`verify`](Self::verify) on the blocking pool.
    pub async fn verify_blocking(&self, plaintext: String, stored: String) -> AuthResult<bool> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &stored))
            .await
            .map_err(|e| AuthError::HashingFailed(e.to_string()))?
    }
}
