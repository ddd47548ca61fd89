//! Signed, time-limited session tokens (HS256 JWT).

use super::{
    errors::{AuthError, AuthResult},
    models::{TokenClaims, UserId},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

/// Default token lifetime
pub const DEFAULT_TOKEN_TTL: Duration = Duration::hours(24);

/// Issues and verifies bearer tokens without touching the store
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    /// Create an issuer for `secret` whose tokens live for `ttl`.
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Configured token lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `subject` valid for the configured lifetime.
    pub fn issue(&self, subject: UserId, username: &str) -> AuthResult<String> {
        self.issue_at(subject, username, Utc::now(), self.ttl)
    }

    /// Issue a token with an explicit issue time and lifetime.
    pub fn issue_at(
        &self,
        subject: UserId,
        username: &str,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> AuthResult<String> {
        let claims = TokenClaims {
            sub: subject,
            username: username.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(token)
    }

    /// Verify signature and expiry against the current time.
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidToken` - Bad signature, wrong algorithm or malformed claims
    /// * `AuthError::ExpiredToken` - Lifetime has elapsed
    pub fn verify(&self, token: &str) -> AuthResult<TokenClaims> {
        self.verify_at(token, Utc::now())
    }

    /// Verify against an explicit clock.
    ///
    /// Expiry is checked here rather than by `jsonwebtoken` so that it has no
    /// leeway: a token is expired once `now >= exp`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> AuthResult<TokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                log::debug!("Token rejected: {}", e);
                AuthError::InvalidToken
            })?
            .claims;

        if now.timestamp() >= claims.exp {
            return Err(AuthError::ExpiredToken);
        }

        Ok(claims)
    }
}
