//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use std::net::SocketAddr;
use thetawaves::{auth::HasherConfig, db::DatabaseConfig, session::SameSite};

/// Default token lifetime: 24 hours
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 86_400;

/// Deployment environment; decides cookie `Secure` and error detail exposure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

/// Where users and songs live
#[derive(Debug, Clone)]
pub enum StorageBackend {
    Postgres(DatabaseConfig),
    /// In-process store, lost on restart
    Memory,
}

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Deployment environment
    pub environment: Environment,
    /// Credential store
    pub storage: StorageBackend,
    /// Security configuration
    pub security: SecurityConfig,
    /// Allowed CORS origin; permissive in development when unset
    pub cors_origin: Option<String>,
    /// Prometheus exporter address; no exporter when unset
    pub metrics_bind: Option<SocketAddr>,
}

/// Security-related configuration
#[derive(Clone)]
pub struct SecurityConfig {
    /// JWT signing secret (required)
    pub jwt_secret: String,
    /// Password hashing pepper (required)
    pub password_pepper: String,
    /// Token and session cookie lifetime in seconds
    pub token_ttl_secs: i64,
    /// Argon2 work factor
    pub hasher: HasherConfig,
    /// Session cookie `SameSite`
    pub same_site: SameSite,
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("jwt_secret", &"<redacted>")
            .field("password_pepper", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("hasher", &self.hasher)
            .field("same_site", &self.same_site)
            .finish()
    }
}

/// Command-line overrides, applied on top of the environment
#[derive(Debug, Default)]
pub struct Overrides {
    pub bind: Option<SocketAddr>,
    pub database_url: Option<String>,
    pub in_memory: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(overrides: Overrides) -> Result<Self, ConfigError> {
        let bind = match overrides.bind {
            Some(bind) => bind,
            None => parse_env_required_format("SERVER_BIND", "127.0.0.1:5001")?,
        };

        let environment = match std::env::var("APP_ENV") {
            Ok(v) => match v.to_lowercase().as_str() {
                "production" | "prod" => Environment::Production,
                "development" | "dev" => Environment::Development,
                other => {
                    return Err(ConfigError::Invalid {
                        var: "APP_ENV".to_string(),
                        reason: format!("Expected 'production' or 'development', got '{other}'"),
                    });
                }
            },
            Err(_) => Environment::Development,
        };

        let storage = if overrides.in_memory || parse_env_or("STORAGE_IN_MEMORY", false) {
            StorageBackend::Memory
        } else {
            let database_url = overrides
                .database_url
                .or_else(|| std::env::var("DATABASE_URL").ok())
                .unwrap_or_else(|| DatabaseConfig::development().database_url);

            StorageBackend::Postgres(DatabaseConfig {
                database_url,
                max_connections: parse_env_or("DB_MAX_CONNECTIONS", 20),
                min_connections: parse_env_or("DB_MIN_CONNECTIONS", 1),
                connection_timeout_secs: parse_env_or("DB_CONNECTION_TIMEOUT_SECS", 5),
                idle_timeout_secs: parse_env_or("DB_IDLE_TIMEOUT_SECS", 300),
                max_lifetime_secs: parse_env_or("DB_MAX_LIFETIME_SECS", 1800),
            })
        };

        // Security configuration (REQUIRED)
        let jwt_secret = std::env::var("JWT_SECRET").map_err(|_| ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Generate with: openssl rand -hex 32".to_string(),
        })?;

        let password_pepper =
            std::env::var("PASSWORD_PEPPER").map_err(|_| ConfigError::MissingRequired {
                var: "PASSWORD_PEPPER".to_string(),
                hint: "Generate with: openssl rand -hex 16".to_string(),
            })?;

        let same_site = match std::env::var("COOKIE_SAME_SITE") {
            Ok(v) => v.parse().map_err(|reason| ConfigError::Invalid {
                var: "COOKIE_SAME_SITE".to_string(),
                reason,
            })?,
            Err(_) => SameSite::Strict,
        };

        let defaults = HasherConfig::default();
        let security = SecurityConfig {
            jwt_secret,
            password_pepper,
            token_ttl_secs: parse_env_or("TOKEN_TTL_SECS", DEFAULT_TOKEN_TTL_SECS),
            hasher: HasherConfig {
                memory_kib: parse_env_or("ARGON2_MEMORY_KIB", defaults.memory_kib),
                iterations: parse_env_or("ARGON2_ITERATIONS", defaults.iterations),
                parallelism: parse_env_or("ARGON2_PARALLELISM", defaults.parallelism),
            },
            same_site,
        };

        let metrics_bind = match std::env::var("METRICS_BIND") {
            Ok(v) => Some(v.parse().map_err(|_| ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("'{v}' is not a socket address"),
            })?),
            Err(_) => None,
        };

        let config = ServerConfig {
            bind,
            environment,
            storage,
            security,
            cors_origin: std::env::var("CORS_ORIGIN").ok(),
            metrics_bind,
        };
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.len() < 32 {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET".to_string(),
                reason: "Must be at least 32 characters (128-bit security)".to_string(),
            });
        }

        if self.security.password_pepper.len() < 16 {
            return Err(ConfigError::Invalid {
                var: "PASSWORD_PEPPER".to_string(),
                reason: "Must be at least 16 characters (64-bit security)".to_string(),
            });
        }

        if self.security.token_ttl_secs <= 0 {
            return Err(ConfigError::Invalid {
                var: "TOKEN_TTL_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.environment.is_production() && matches!(self.storage, StorageBackend::Memory) {
            return Err(ConfigError::Invalid {
                var: "STORAGE_IN_MEMORY".to_string(),
                reason: "The in-memory store is not durable; not allowed in production".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Like [`parse_env_or`], but a present and unparsable value is an error
fn parse_env_required_format<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse().map_err(|_| ConfigError::Invalid {
        var: key.to_string(),
        reason: format!("Could not parse '{raw}'"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn valid_config() -> ServerConfig {
        ServerConfig {
            bind: "127.0.0.1:8080".parse().unwrap(),
            environment: Environment::Development,
            storage: StorageBackend::Memory,
            security: SecurityConfig {
                jwt_secret: "a".repeat(32),
                password_pepper: "a".repeat(16),
                token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
                hasher: HasherConfig::fast(),
                same_site: SameSite::Strict,
            },
            cors_origin: None,
            metrics_bind: None,
        }
    }

    fn clear_env() {
        for key in [
            "SERVER_BIND",
            "APP_ENV",
            "DATABASE_URL",
            "STORAGE_IN_MEMORY",
            "JWT_SECRET",
            "PASSWORD_PEPPER",
            "TOKEN_TTL_SECS",
            "COOKIE_SAME_SITE",
            "METRICS_BIND",
            "CORS_ORIGIN",
        ] {
            // SAFETY: env mutation is confined to #[serial] tests
            unsafe { std::env::remove_var(key) };
        }
    }

    fn set(key: &str, value: &str) {
        // SAFETY: env mutation is confined to #[serial] tests
        unsafe { std::env::set_var(key, value) };
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Use openssl".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("JWT_SECRET"));
        assert!(msg.contains("Use openssl"));
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut config = valid_config();
        config.security.jwt_secret = "short".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "JWT_SECRET"));
    }

    #[test]
    fn test_non_positive_ttl_rejected() {
        let mut config = valid_config();
        config.security.token_ttl_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_memory_store_not_allowed_in_production() {
        let mut config = valid_config();
        config.environment = Environment::Production;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let shown = format!("{:?}", valid_config());
        assert!(!shown.contains(&"a".repeat(32)));
        assert!(shown.contains("<redacted>"));
    }

    #[test]
    #[serial]
    fn test_from_env_requires_secret() {
        clear_env();
        set("PASSWORD_PEPPER", &"p".repeat(16));
        let err = ServerConfig::from_env(Overrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { ref var, .. } if var == "JWT_SECRET"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_reads_values() {
        clear_env();
        set("JWT_SECRET", &"s".repeat(40));
        set("PASSWORD_PEPPER", &"p".repeat(16));
        set("TOKEN_TTL_SECS", "604800");
        set("COOKIE_SAME_SITE", "lax");
        set("APP_ENV", "production");
        set("DATABASE_URL", "postgres://u@db/tw");

        let config = ServerConfig::from_env(Overrides {
            bind: Some("0.0.0.0:9000".parse().unwrap()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.security.token_ttl_secs, 604_800);
        assert_eq!(config.security.same_site, SameSite::Lax);
        assert!(config.environment.is_production());
        assert!(
            matches!(config.storage, StorageBackend::Postgres(ref db) if db.database_url == "postgres://u@db/tw")
        );
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_bad_environment() {
        clear_env();
        set("JWT_SECRET", &"s".repeat(40));
        set("PASSWORD_PEPPER", &"p".repeat(16));
        set("APP_ENV", "staging");
        assert!(ServerConfig::from_env(Overrides::default()).is_err());
        clear_env();
    }
}
