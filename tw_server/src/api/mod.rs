//! HTTP API for the Thetawaves server.
//!
//! # Modules
//!
//! - [`auth`]: signup, signin, logout and the current-user lookup
//! - [`songs`]: per-user song list (authenticated)
//! - [`pages`]: placeholder pages behind the session gate
//! - [`session_gate`]: redirect policy in front of every request
//! - [`middleware`]: bearer/cookie authentication for API routes
//! - [`request_id`]: `x-request-id` propagation
//!
//! # Endpoints Overview
//!
//! ```text
//! POST   /api/auth/signup     - Register and sign in (public)
//! POST   /api/auth/signin     - Sign in (public)
//! POST   /api/auth/logout     - Clear the session cookie (public)
//! GET    /api/auth/me         - Current user (auth required)
//! GET    /api/songs           - List songs (auth required)
//! POST   /api/songs           - Add a song (auth required)
//! PUT    /api/songs           - Replace a song by index (auth required)
//! DELETE /api/songs           - Remove a song by index (auth required)
//! GET    /health, /test       - Store health
//! GET    /, /signin, /signup, /dashboard, /dashboard/*
//! ```
//!
//! The `/api/auth/*` routes are also served under `/auth/*`.

pub mod auth;
pub mod middleware;
pub mod pages;
pub mod request_id;
pub mod session_gate;
pub mod songs;

use axum::{
    Router,
    extract::State,
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Json},
    routing::{get, post},
};
use serde_json::json;
use std::sync::Arc;
use thetawaves::{auth::AuthManager, session::SessionCookie, songs::SongManager, RouteTable};
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
///
/// Cloned per request; the managers are cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub auth_manager: Arc<AuthManager>,
    pub song_manager: SongManager,
    pub routes: Arc<RouteTable>,
    /// Session cookie attributes (Secure, SameSite, Max-Age)
    pub cookie: SessionCookie,
    /// Production deployment: hide internal error detail, no permissive CORS
    pub production: bool,
    /// Allowed CORS origin
    pub cors_origin: Option<HeaderValue>,
}

/// Create the complete router with all endpoints and middleware.
///
/// # Example
///
/// ```rust,no_run
/// # use tw_server::api::{create_router, AppState};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let state: AppState = unimplemented!();
/// let app = create_router(state);
/// let listener = tokio::net::TcpListener::bind("127.0.0.1:5001").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
pub fn create_router(state: AppState) -> Router {
    let auth_routes = create_auth_router(state.clone());

    let song_routes = Router::new()
        .route(
            "/songs",
            get(songs::list_songs)
                .post(songs::add_song)
                .put(songs::replace_song)
                .delete(songs::remove_song),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let page_routes = Router::new()
        .route("/", get(pages::home))
        .route("/signin", get(pages::signin))
        .route("/signup", get(pages::signup))
        .route("/dashboard", get(pages::dashboard))
        .route("/dashboard/{*rest}", get(pages::dashboard));

    Router::new()
        .route("/health", get(health_check))
        .route("/test", get(health_check))
        .merge(page_routes)
        .nest("/api/auth", auth_routes.clone())
        .nest("/auth", auth_routes)
        .nest("/api", song_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_gate::session_gate,
        ))
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(cors_layer(&state))
        .with_state(state)
}

fn create_auth_router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/signin", post(auth::signin))
        .route("/logout", post(auth::logout));

    let protected_routes = Router::new().route("/me", get(auth::me)).layer(
        axum::middleware::from_fn_with_state(state, middleware::auth_middleware),
    );

    public_routes.merge(protected_routes)
}

/// Credentialed CORS for a configured origin; permissive in development
/// without one, same-origin only in production without one.
fn cors_layer(state: &AppState) -> CorsLayer {
    match (&state.cors_origin, state.production) {
        (Some(origin), _) => CorsLayer::new()
            .allow_origin(origin.clone())
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        (None, false) => CorsLayer::permissive(),
        (None, true) => CorsLayer::new(),
    }
}

/// Health check endpoint.
///
/// Returns `200 OK` when the credential store answers, `503` otherwise.
///
/// ```bash
/// curl http://localhost:5001/health
/// # {"status":"healthy","version":"0.3.0","database":true,"timestamp":"..."}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_healthy = match state.auth_manager.users().health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            false
        }
    };

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
