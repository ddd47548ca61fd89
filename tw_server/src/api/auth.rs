//! Authentication API handlers.
//!
//! Signup and signin return `{message, token, user}` and set the session
//! cookie; logout expires it. Every failure is a JSON body with a single-line
//! `message`.
//!
//! # Examples
//!
//! Sign up:
//! ```bash
//! curl -X POST http://localhost:5001/api/auth/signup \
//!   -H "Content-Type: application/json" \
//!   -d '{"email": "a@b.com", "username": "alice", "password": "secret1"}'
//! ```
//!
//! Sign in:
//! ```bash
//! curl -X POST http://localhost:5001/api/auth/signin \
//!   -H "Content-Type: application/json" \
//!   -d '{"username": "alice", "password": "secret1"}'
//! ```

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thetawaves::auth::{
    AuthError, AuthSuccess, ErrorKind, SigninRequest, SignupRequest, UserSummary,
};

use super::{AppState, middleware::AuthenticatedUser};
use crate::{logging::log_security_event, metrics};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub message: String,
    /// Internal failure detail, only outside production
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub user: UserSummary,
}

/// Error leaving an HTTP handler: a status and a JSON body
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                message: message.into(),
                error: None,
            },
        }
    }

    /// 401 with the uniform body used for every unusable credential
    pub fn unauthenticated() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthenticated")
    }

    /// Map an auth failure onto a status code. Internal failures are logged
    /// and reported with `internal_message`; the underlying error is attached
    /// only when `expose_detail` is set.
    pub fn from_auth(err: AuthError, internal_message: &str, expose_detail: bool) -> Self {
        match err.kind() {
            // Duplicate accounts share the 400 of other signup input problems
            ErrorKind::BadRequest | ErrorKind::Conflict => {
                Self::new(StatusCode::BAD_REQUEST, err.client_message())
            }
            ErrorKind::Unauthorized => Self::new(StatusCode::UNAUTHORIZED, err.client_message()),
            ErrorKind::Internal => {
                tracing::error!("{}: {}", internal_message, err);
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: ErrorResponse {
                        message: internal_message.to_string(),
                        error: expose_detail.then(|| err.to_string()),
                    },
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Unwrap a JSON body, turning parser rejections (non-JSON, wrong types,
/// unknown fields) into a 400.
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AuthError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        AuthError::MalformedBody(rejection.body_text())
    })
}

fn with_session_cookie(state: &AppState, status: StatusCode, success: AuthSuccess) -> Response {
    let cookie = state.cookie.issue(&success.token);
    (status, [(SET_COOKIE, cookie)], Json(success)).into_response()
}

/// Register a new user account and sign them in.
///
/// # Request Body
///
/// ```json
/// { "email": "a@b.com", "username": "alice", "password": "secret1" }
/// ```
///
/// # Response
///
/// `201 Created` with the session cookie set:
/// ```json
/// {
///   "message": "User created successfully",
///   "token": "eyJhbGciOiJIUzI1NiIs...",
///   "user": { "id": "…", "email": "a@b.com", "username": "alice" }
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: missing or malformed fields, or the email or username is taken
/// - `500 Internal Server Error`: store or hashing failure
pub async fn signup(
    State(state): State<AppState>,
    body: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let expose = !state.production;
    let request = json_body(body).map_err(|e| {
        metrics::signup_total("rejected");
        ApiError::from_auth(e, "Error creating user", expose)
    })?;

    match state.auth_manager.signup(request).await {
        Ok(success) => {
            metrics::signup_total("created");
            Ok(with_session_cookie(&state, StatusCode::CREATED, success))
        }
        Err(e) => {
            metrics::signup_total(match e.kind() {
                ErrorKind::Conflict => "conflict",
                ErrorKind::Internal => "error",
                _ => "rejected",
            });
            Err(ApiError::from_auth(e, "Error creating user", expose))
        }
    }
}

/// Authenticate a user and issue a fresh token.
///
/// # Request Body
///
/// ```json
/// { "username": "alice", "password": "secret1" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: missing username or password
/// - `401 Unauthorized`: `Invalid username or password`, identical for an
///   unknown username and a wrong password
/// - `500 Internal Server Error`: store or hashing failure
pub async fn signin(
    State(state): State<AppState>,
    body: Result<Json<SigninRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let expose = !state.production;
    let request = json_body(body).map_err(|e| ApiError::from_auth(e, "Error logging in", expose))?;
    let username = request.username.clone().unwrap_or_default();

    match state.auth_manager.signin(request).await {
        Ok(success) => {
            metrics::signin_attempts_total(true);
            Ok(with_session_cookie(&state, StatusCode::OK, success))
        }
        Err(e) => {
            if e.kind() == ErrorKind::Unauthorized {
                metrics::signin_attempts_total(false);
                log_security_event(
                    "signin_failed",
                    Some(username.trim()),
                    Some("/api/auth/signin"),
                    "Invalid username or password",
                );
            }
            Err(ApiError::from_auth(e, "Error logging in", expose))
        }
    }
}

/// Clear the session cookie.
///
/// Tokens are stateless, so there is nothing to revoke server-side; this
/// always succeeds, with or without a current session.
pub async fn logout(State(state): State<AppState>) -> Response {
    (
        StatusCode::OK,
        [(SET_COOKIE, state.cookie.clear())],
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    )
        .into_response()
}

/// Current user for the presented token.
///
/// # Errors
///
/// - `401 Unauthorized`: the account behind the token no longer exists
pub async fn me(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> Result<Json<MeResponse>, ApiError> {
    let user = state
        .auth_manager
        .current_user(user_id)
        .await
        .map_err(|e| ApiError::from_auth(e, "Error loading user", !state.production))?;

    Ok(Json(MeResponse { user }))
}
