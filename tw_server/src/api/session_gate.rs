//! Session gate: redirects callers who are on the wrong side of the session
//! boundary before any page handler runs.
//!
//! Only the `token` cookie counts here, since browsers navigating to a page do
//! not send bearer headers. Open routes (the API, health checks, assets) are
//! not gated; the API authenticates on its own.

use axum::{
    extract::{Request, State},
    http::header::COOKIE,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use thetawaves::session::{Credential, GateDecision, RouteClass, token_from_cookie_header};

use super::{AppState, middleware::AuthenticatedUser};
use crate::{logging::log_security_event, metrics};

fn session_cookie(request: &Request) -> Option<&str> {
    request
        .headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(token_from_cookie_header)
}

pub async fn session_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    if state.routes.classify(request.uri().path()) == RouteClass::Open {
        return next.run(request).await;
    }

    let path = request.uri().path().to_owned();
    let query = request.uri().query().map(str::to_owned);
    let credential = Credential::check(session_cookie(&request), state.auth_manager.tokens());
    match credential {
        Credential::Invalid => {
            metrics::token_rejections_total("invalid");
            log_security_event("token_invalid", None, Some(&path), "Invalid session cookie");
        }
        Credential::Expired => {
            metrics::token_rejections_total("expired");
            log_security_event("token_expired", None, Some(&path), "Expired session cookie");
        }
        Credential::Missing | Credential::Valid(_) => {}
    }

    match state.routes.decide(&path, query.as_deref(), &credential) {
        GateDecision::PassThrough => {
            if let Credential::Valid(user_id) = credential {
                request.extensions_mut().insert(AuthenticatedUser(user_id));
            }
            next.run(request).await
        }
        GateDecision::RedirectToSignIn { location } => {
            metrics::gate_redirects_total("signin");
            tracing::debug!("Redirecting {} to {}", path, location);
            Redirect::temporary(&location).into_response()
        }
        GateDecision::RedirectToLanding { location } => {
            metrics::gate_redirects_total("landing");
            tracing::debug!("Redirecting signed-in caller from {} to {}", path, location);
            Redirect::temporary(&location).into_response()
        }
    }
}
