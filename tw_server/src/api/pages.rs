//! Placeholder pages.
//!
//! The real front end is served elsewhere; these exist so the session gate
//! has something to guard and so a browser can exercise the redirects.

use axum::{
    extract::{Query, State},
    response::Html,
};
use serde::Deserialize;
use thetawaves::session::safe_next;

use super::{AppState, middleware::AuthenticatedUser};

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{} | Thetawaves</title></head>\n<body>{}</body></html>\n",
        escape(title),
        body
    ))
}

pub async fn home() -> Html<String> {
    page(
        "Thetawaves",
        "<h1>Thetawaves</h1><p><a href=\"/signin\">Sign in</a> or <a href=\"/signup\">create an account</a>.</p>",
    )
}

/// Sign-in form. The form carries `next` through so the client can return
/// the user to where the gate stopped them; unsafe targets are dropped.
pub async fn signin(State(state): State<AppState>, Query(query): Query<NextQuery>) -> Html<String> {
    let target = state.routes.post_login_target(query.next.as_deref());
    page(
        "Sign in",
        &format!(
            "<h1>Sign in</h1><form method=\"post\" action=\"/api/auth/signin\" data-next=\"{}\">\
             <input name=\"username\" autocomplete=\"username\">\
             <input name=\"password\" type=\"password\" autocomplete=\"current-password\">\
             <button type=\"submit\">Sign in</button></form>",
            escape(target)
        ),
    )
}

pub async fn signup(Query(query): Query<NextQuery>) -> Html<String> {
    let next = query.next.as_deref().and_then(safe_next).unwrap_or("");
    page(
        "Sign up",
        &format!(
            "<h1>Create an account</h1><form method=\"post\" action=\"/api/auth/signup\" data-next=\"{}\">\
             <input name=\"email\" type=\"email\" autocomplete=\"email\">\
             <input name=\"username\" autocomplete=\"username\">\
             <input name=\"password\" type=\"password\" autocomplete=\"new-password\">\
             <button type=\"submit\">Sign up</button></form>",
            escape(next)
        ),
    )
}

/// Only reached with a valid session cookie; the gate redirects everyone else.
pub async fn dashboard(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> Html<String> {
    let name = match state.auth_manager.users().find_by_id(user_id).await {
        Ok(Some(user)) => user.username,
        Ok(None) => user_id.to_string(),
        Err(e) => {
            tracing::warn!("Dashboard user lookup failed: {}", e);
            user_id.to_string()
        }
    };
    page(
        "Dashboard",
        &format!("<h1>Dashboard</h1><p>Signed in as {}</p>", escape(&name)),
    )
}
