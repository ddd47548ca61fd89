//! Thetawaves auth and session server.
//!
//! Serves the signup/signin API, the session-gated pages and the per-user
//! song list over PostgreSQL, or over an in-process store for development.

use std::sync::Arc;

use anyhow::Error;
use axum::http::HeaderValue;
use log::info;
use pico_args::Arguments;
use thetawaves::{
    RouteTable,
    auth::{AuthManager, PasswordHasher, TokenIssuer},
    db::{
        Database, MemoryStore, PgSongRepository, PgUserRepository, SongRepository, UserRepository,
    },
    session::SessionCookie,
    songs::SongManager,
};
use tw_server::{
    api,
    config::{Overrides, ServerConfig, StorageBackend},
    logging, metrics,
};

const HELP: &str = "\
Run the Thetawaves auth and session server

USAGE:
  tw_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:5001]
  --db-url     URL         Database connection string  [default: env DATABASE_URL or postgres://postgres@localhost/thetawaves]

FLAGS:
  --memory                 Keep users and songs in memory instead of PostgreSQL
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:5001)
  DATABASE_URL             PostgreSQL connection string
  JWT_SECRET               JWT signing secret (required, at least 32 characters)
  PASSWORD_PEPPER          Password hashing pepper (required, at least 16 characters)
  TOKEN_TTL_SECS           Token and session cookie lifetime [default: 86400]
  APP_ENV                  production | development [default: development]
  COOKIE_SAME_SITE         strict | lax [default: strict]
  CORS_ORIGIN              Allowed browser origin
  METRICS_BIND             Prometheus exporter address
  (See .env.example for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let overrides = Overrides {
        bind: pargs.opt_value_from_str("--bind")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
        in_memory: pargs.contains("--memory"),
    };

    logging::init();

    let config = ServerConfig::from_env(overrides)?;
    info!("Starting Thetawaves server at {}", config.bind);

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(|e| anyhow::anyhow!(e))?;
        info!("Prometheus exporter listening on {}", addr);
    }

    let (users, songs, database): (
        Arc<dyn UserRepository>,
        Arc<dyn SongRepository>,
        Option<Database>,
    ) = match &config.storage {
        StorageBackend::Postgres(db_config) => {
            info!("Connecting to database");
            let db = Database::new(db_config)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
            db.migrate()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to apply migrations: {}", e))?;
            info!("Database connected and migrated");

            let pool = db.pool().clone();
            let users: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(pool.clone()));
            let songs: Arc<dyn SongRepository> = Arc::new(PgSongRepository::new(pool));
            (users, songs, Some(db))
        }
        StorageBackend::Memory => {
            log::warn!("Using the in-memory store; accounts are lost on restart");
            let store = Arc::new(MemoryStore::new());
            (
                store.clone() as Arc<dyn UserRepository>,
                store as Arc<dyn SongRepository>,
                None,
            )
        }
    };

    let security = &config.security;
    let ttl = chrono::Duration::seconds(security.token_ttl_secs);
    let hasher = PasswordHasher::new(security.password_pepper.clone(), security.hasher)?;
    let tokens = TokenIssuer::new(&security.jwt_secret, ttl);
    let auth_manager = Arc::new(AuthManager::new(users, hasher, tokens));

    let production = config.environment.is_production();
    let cors_origin = config
        .cors_origin
        .as_deref()
        .map(HeaderValue::from_str)
        .transpose()
        .map_err(|e| anyhow::anyhow!("Invalid CORS_ORIGIN: {}", e))?;

    let state = api::AppState {
        auth_manager,
        song_manager: SongManager::new(songs),
        routes: Arc::new(RouteTable::default()),
        cookie: SessionCookie {
            same_site: security.same_site,
            secure: production,
            max_age_secs: security.token_ttl_secs,
        },
        production,
        cors_origin,
    };

    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");

    if let Some(db) = database {
        db.close().await;
        info!("Database pool closed");
    }

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
