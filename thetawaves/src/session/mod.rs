//! Session boundary: which routes need a session, and where to send callers
//! who are on the wrong side of that line.
//!
//! Everything here is pure. The gate decides from the request path and the
//! verified state of the session cookie; it never touches the store and never
//! refreshes a token.

pub mod cookie;

pub use cookie::{SESSION_COOKIE, SameSite, SessionCookie, token_from_cookie_header};

use crate::auth::{AuthError, TokenIssuer, UserId};

/// Query parameter carrying the originally requested path to the sign-in page
pub const NEXT_PARAM: &str = "next";

/// How a path is gated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Sign-in / sign-up forms: only for callers without a session
    Public,
    /// Requires a valid session
    Protected,
    /// Not gated
    Open,
}

/// State of the credential presented with a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Missing,
    Invalid,
    Expired,
    Valid(UserId),
}

impl Credential {
    /// Fully verify a presented token. An empty token counts as missing.
    pub fn check(token: Option<&str>, issuer: &TokenIssuer) -> Self {
        match token.filter(|t| !t.is_empty()) {
            None => Credential::Missing,
            Some(token) => match issuer.verify(token) {
                Ok(claims) => Credential::Valid(claims.sub),
                Err(AuthError::ExpiredToken) => Credential::Expired,
                Err(_) => Credential::Invalid,
            },
        }
    }

    pub fn is_usable(&self) -> bool {
        matches!(self, Credential::Valid(_))
    }
}

/// What the gate does with a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    PassThrough,
    /// Protected route without a usable session
    RedirectToSignIn { location: String },
    /// Public route with a usable session
    RedirectToLanding { location: String },
}

/// Static route classification
#[derive(Debug, Clone)]
pub struct RouteTable {
    public_paths: Vec<String>,
    protected_prefixes: Vec<String>,
    sign_in_path: String,
    landing_path: String,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            public_paths: vec!["/signin".to_string(), "/signup".to_string()],
            protected_prefixes: vec!["/dashboard".to_string()],
            sign_in_path: "/signin".to_string(),
            landing_path: "/dashboard".to_string(),
        }
    }
}

fn normalize(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

impl RouteTable {
    /// Classify a request path. Public paths match exactly; protected
    /// prefixes match the prefix itself and anything below it.
    pub fn classify(&self, path: &str) -> RouteClass {
        let path = normalize(path);

        if self.public_paths.iter().any(|p| p == path) {
            return RouteClass::Public;
        }

        let protected = self.protected_prefixes.iter().any(|prefix| {
            path == prefix
                || path
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        });

        if protected {
            RouteClass::Protected
        } else {
            RouteClass::Open
        }
    }

    /// Decide what happens to a request for `path` (with optional raw query).
    pub fn decide(&self, path: &str, query: Option<&str>, credential: &Credential) -> GateDecision {
        match (self.classify(path), credential.is_usable()) {
            (RouteClass::Protected, false) => {
                let original = match query {
                    Some(q) if !q.is_empty() => format!("{path}?{q}"),
                    _ => path.to_string(),
                };
                GateDecision::RedirectToSignIn {
                    location: self.sign_in_location(&original),
                }
            }
            (RouteClass::Public, true) => GateDecision::RedirectToLanding {
                location: self.landing_path.clone(),
            },
            _ => GateDecision::PassThrough,
        }
    }

    /// Sign-in URL that returns to `original` after authenticating
    pub fn sign_in_location(&self, original: &str) -> String {
        format!(
            "{}?{}={}",
            self.sign_in_path,
            NEXT_PARAM,
            urlencoding::encode(original)
        )
    }

    /// Where to send a caller after a successful sign-in.
    pub fn post_login_target<'a>(&'a self, next: Option<&'a str>) -> &'a str {
        next.and_then(safe_next)
            .unwrap_or(self.landing_path.as_str())
    }
}

/// Accept only same-site absolute paths as return targets, so the `next`
/// parameter cannot bounce a user to another origin.
pub fn safe_next(next: &str) -> Option<&str> {
    let is_local = next.starts_with('/')
        && !next.starts_with("//")
        && !next.starts_with("/\\")
        && !next.contains("://");
    is_local.then_some(next)
}
