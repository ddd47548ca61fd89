//! Authentication middleware for protected API endpoints.
//!
//! Accepts the token either as `Authorization: Bearer <token>` or as the
//! `token` session cookie, fully verifies it, and injects the caller's id into
//! request extensions for downstream handlers.
//!
//! # Usage
//!
//! ```rust,no_run
//! use axum::{Router, routing::get, middleware};
//! # use tw_server::api::middleware::auth_middleware;
//! # use tw_server::api::AppState;
//! # async fn handler() {}
//! # let state: AppState = unimplemented!();
//!
//! let protected_routes: Router<AppState> = Router::new()
//!     .route("/api/songs", get(handler))
//!     .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));
//! # let _ = protected_routes;
//! ```

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{
        HeaderMap,
        header::{AUTHORIZATION, COOKIE},
        request::Parts,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use thetawaves::{
    auth::{AuthError, UserId},
    session::token_from_cookie_header,
};

use super::{AppState, auth::ApiError};
use crate::{logging::log_security_event, metrics};

/// Caller id injected by [`auth_middleware`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser(pub UserId);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthenticatedUser>().copied().ok_or_else(|| {
            tracing::warn!("AuthenticatedUser not found in request extensions");
            ApiError::unauthenticated()
        })
    }
}

/// Token presented with a request: the bearer header wins over the cookie.
pub fn presented_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    bearer.or_else(|| {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(token_from_cookie_header)
    })
}

/// Authentication middleware that validates tokens and injects the user id.
///
/// # Behavior
///
/// - **Valid token**: injects [`AuthenticatedUser`] and calls the next handler
/// - **Missing, invalid or expired token**: `401 {"message":"Unauthenticated"}`,
///   the same body in every case
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = presented_token(request.headers()) else {
        return ApiError::unauthenticated().into_response();
    };

    match state.auth_manager.verify_token(token) {
        Ok(claims) => {
            request
                .extensions_mut()
                .insert(AuthenticatedUser(claims.sub));
            next.run(request).await
        }
        Err(e) => {
            let path = request.uri().path().to_string();
            match e {
                AuthError::ExpiredToken => {
                    metrics::token_rejections_total("expired");
                    log_security_event("token_expired", None, Some(&path), "Expired token");
                }
                _ => {
                    metrics::token_rejections_total("invalid");
                    log_security_event("token_invalid", None, Some(&path), "Invalid token");
                }
            }
            ApiError::unauthenticated().into_response()
        }
    }
}
