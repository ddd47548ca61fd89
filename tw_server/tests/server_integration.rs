//! Integration tests for the HTTP surface.
//!
//! Drives the full router (request id, session gate, auth middleware, CORS)
//! with `oneshot` over the in-memory store.

use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use chrono::Duration;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use thetawaves::RouteTable;
use thetawaves::auth::{AuthManager, HasherConfig, PasswordHasher, TokenIssuer};
use thetawaves::db::MemoryStore;
use thetawaves::session::{SameSite, SessionCookie};
use thetawaves::songs::SongManager;
use tower::ServiceExt; // For `oneshot` method
use tw_server::api::{AppState, create_router};

const JWT_SECRET: &str = "test_secret_key_for_testing_only_32b";
const PEPPER: &str = "test_pepper_for_testing_only";

/// Helper to create test server over a fresh in-memory store
fn create_test_server() -> (axum::Router, Arc<AuthManager>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());

    let auth_manager = Arc::new(AuthManager::new(
        store.clone(),
        PasswordHasher::new(PEPPER.to_string(), HasherConfig::fast()).unwrap(),
        TokenIssuer::new(JWT_SECRET, Duration::hours(24)),
    ));

    let state = AppState {
        auth_manager: auth_manager.clone(),
        song_manager: SongManager::new(store.clone()),
        routes: Arc::new(RouteTable::default()),
        cookie: SessionCookie {
            same_site: SameSite::Strict,
            secure: false,
            max_age_secs: 86_400,
        },
        production: false,
        cors_origin: None,
    };

    (create_router(state), auth_manager, store)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_with_cookie(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, format!("token={token}"))
        .body(Body::empty())
        .unwrap()
}

fn with_bearer(mut request: Request<Body>, token: &str) -> Request<Body> {
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {token}").parse().unwrap(),
    );
    request
}

async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn set_cookie(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("Set-Cookie header")
        .to_str()
        .unwrap()
        .to_string()
}

fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("Location header")
        .to_str()
        .unwrap()
}

fn alice_signup() -> Value {
    json!({ "email": "a@b.com", "username": "alice", "password": "secret1" })
}

/// Sign up alice and return her token
async fn signup_alice(app: &axum::Router) -> String {
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/auth/signup", alice_signup()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["token"]
        .as_str()
        .unwrap()
        .to_string()
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check_endpoint() {
    let (app, _, _) = create_test_server();

    for uri in ["/health", "/test"] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], true);
    }
}

#[tokio::test]
async fn test_request_id_on_every_response() {
    let (app, _, _) = create_test_server();

    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));

    let request = Request::builder()
        .uri("/dashboard")
        .header("x-request-id", "trace-42")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "trace-42");
}

// ============================================================================
// Signup / Signin
// ============================================================================

#[tokio::test]
async fn test_signup_signin_scenario() {
    let (app, _, store) = create_test_server();

    // Signup
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/auth/signup", alice_signup()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = set_cookie(&response);
    let raw = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(!raw.contains("password"), "response leaked a password field: {raw}");

    let body: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(body["message"], "User created successfully");
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["email"], "a@b.com");
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Max-Age=86400"));
    assert!(!cookie.contains("Secure"));

    // Same username, different email
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/signup",
            json!({ "email": "other@b.com", "username": "alice", "password": "secret1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["message"],
        "User with this email or username already exists"
    );
    assert_eq!(store.user_count(), 1);

    // Wrong password
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/signin",
            json!({ "username": "alice", "password": "wrong" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await["message"],
        "Invalid username or password"
    );

    // Correct password
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/signin",
            json!({ "username": "alice", "password": "secret1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response).starts_with("token="));
    let body = body_json(response).await;
    assert_eq!(body["message"], "Logged in successfully");
    assert!(!body["token"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_signin_failures_are_byte_identical() {
    let (app, _, _) = create_test_server();
    signup_alice(&app).await;

    let unknown = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/signin",
            json!({ "username": "nobody", "password": "secret1" }),
        ))
        .await
        .unwrap();
    let wrong = app
        .oneshot(json_request(
            "POST",
            "/api/auth/signin",
            json!({ "username": "alice", "password": "wrong-password" }),
        ))
        .await
        .unwrap();

    assert_eq!(unknown.status(), wrong.status());
    assert!(unknown.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(body_bytes(unknown).await, body_bytes(wrong).await);
}

#[tokio::test]
async fn test_missing_fields() {
    let (app, _, store) = create_test_server();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/signup",
            json!({ "email": "a@b.com", "password": "secret1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "Missing required fields");

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/signin",
            json!({ "username": "alice" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["message"],
        "Missing username or password"
    );
    assert_eq!(store.user_count(), 0);
}

#[tokio::test]
async fn test_malformed_bodies_are_bad_requests() {
    let (app, _, _) = create_test_server();

    let not_json = Request::builder()
        .method("POST")
        .uri("/api/auth/signup")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(not_json).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let extra_field = json!({
        "email": "a@b.com",
        "username": "alice",
        "password": "secret1",
        "isAdmin": true
    });
    let response = app
        .oneshot(json_request("POST", "/api/auth/signup", extra_field))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_auth_alias_routes() {
    let (app, _, _) = create_test_server();

    let response = app
        .clone()
        .oneshot(json_request("POST", "/auth/signup", alice_signup()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(json_request(
            "POST",
            "/auth/signin",
            json!({ "username": "alice", "password": "secret1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let (app, _, _) = create_test_server();

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/logout")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = set_cookie(&response);
    assert!(cookie.starts_with("token=;"));
    assert!(cookie.contains("Max-Age=0"));
    assert_eq!(
        body_json(response).await,
        json!({ "message": "Logged out successfully" })
    );
}

// ============================================================================
// Token-authenticated API
// ============================================================================

#[tokio::test]
async fn test_me_with_bearer_and_cookie() {
    let (app, _, _) = create_test_server();
    let token = signup_alice(&app).await;

    let response = app
        .clone()
        .oneshot(with_bearer(get("/api/auth/me"), &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["user"]["username"], "alice");

    let response = app
        .oneshot(get_with_cookie("/api/auth/me", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unusable_tokens_share_one_response() {
    let (app, auth, _) = create_test_server();
    let token = signup_alice(&app).await;
    let user_id = auth.verify_token(&token).unwrap().sub;

    let expired = TokenIssuer::new(JWT_SECRET, Duration::zero())
        .issue(user_id, "alice")
        .unwrap();
    let forged = TokenIssuer::new("another_secret_entirely_not_ours_x", Duration::hours(1))
        .issue(user_id, "alice")
        .unwrap();

    let missing = app.clone().oneshot(get("/api/auth/me")).await.unwrap();
    let expired = app
        .clone()
        .oneshot(with_bearer(get("/api/auth/me"), &expired))
        .await
        .unwrap();
    let forged = app
        .oneshot(with_bearer(get("/api/auth/me"), &forged))
        .await
        .unwrap();

    for response in [&missing, &expired, &forged] {
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let missing = body_bytes(missing).await;
    assert_eq!(missing, br#"{"message":"Unauthenticated"}"#);
    assert_eq!(body_bytes(expired).await, missing);
    assert_eq!(body_bytes(forged).await, missing);
}

#[tokio::test]
async fn test_me_for_unknown_account_is_unauthenticated() {
    let (app, _, _) = create_test_server();

    // Correctly signed, but no such account in the store
    let token = TokenIssuer::new(JWT_SECRET, Duration::hours(1))
        .issue(uuid::Uuid::new_v4(), "ghost")
        .unwrap();

    let response = app
        .oneshot(with_bearer(get("/api/auth/me"), &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_bytes(response).await, br#"{"message":"Unauthenticated"}"#);
}

// ============================================================================
// Session Gate
// ============================================================================

#[tokio::test]
async fn test_protected_page_redirects_to_signin_with_next() {
    let (app, _, _) = create_test_server();

    let response = app.clone().oneshot(get("/dashboard")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/signin?next=%2Fdashboard");

    let response = app
        .oneshot(get("/dashboard/settings?tab=a"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location(&response),
        "/signin?next=%2Fdashboard%2Fsettings%3Ftab%3Da"
    );
}

#[tokio::test]
async fn test_protected_page_with_valid_cookie() {
    let (app, _, _) = create_test_server();
    let token = signup_alice(&app).await;

    let response = app
        .clone()
        .oneshot(get_with_cookie("/dashboard", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(page.contains("alice"));

    let response = app
        .oneshot(get_with_cookie("/dashboard/library", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_garbage_and_expired_cookies_are_not_sessions() {
    let (app, auth, _) = create_test_server();
    let token = signup_alice(&app).await;
    let user_id = auth.verify_token(&token).unwrap().sub;
    let expired = TokenIssuer::new(JWT_SECRET, Duration::zero())
        .issue(user_id, "alice")
        .unwrap();

    for cookie in ["not-a-jwt", expired.as_str()] {
        let response = app
            .clone()
            .oneshot(get_with_cookie("/dashboard", cookie))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), "/signin?next=%2Fdashboard");

        // Public pages stay reachable
        let response = app
            .clone()
            .oneshot(get_with_cookie("/signin", cookie))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_signed_in_caller_bounced_from_public_pages() {
    let (app, _, _) = create_test_server();
    let token = signup_alice(&app).await;

    for uri in ["/signin", "/signup"] {
        let response = app
            .clone()
            .oneshot(get_with_cookie(uri, &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), "/dashboard");
    }

    let response = app.oneshot(get("/signin")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_open_routes_ignore_session() {
    let (app, _, _) = create_test_server();

    let response = app.clone().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get_with_cookie("/", "not-a-jwt"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_signin_page_drops_offsite_next() {
    let (app, _, _) = create_test_server();

    let response = app
        .clone()
        .oneshot(get("/signin?next=%2F%2Fevil.example"))
        .await
        .unwrap();
    let page = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(page.contains("data-next=\"/dashboard\""));
    assert!(!page.contains("evil.example"));

    let response = app
        .oneshot(get("/signin?next=%2Fdashboard%2Flibrary"))
        .await
        .unwrap();
    let page = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(page.contains("data-next=\"/dashboard/library\""));
}

// ============================================================================
// Songs
// ============================================================================

#[tokio::test]
async fn test_songs_require_authentication() {
    let (app, _, _) = create_test_server();

    let response = app.oneshot(get("/api/songs")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await,
        json!({ "message": "Unauthenticated" })
    );
}

#[tokio::test]
async fn test_song_list_lifecycle() {
    let (app, _, _) = create_test_server();
    let token = signup_alice(&app).await;

    for song in ["Blue in Green", "So What"] {
        let response = app
            .clone()
            .oneshot(with_bearer(
                json_request("POST", "/api/songs", json!({ "song": song })),
                &token,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "success": true }));
    }

    let response = app
        .clone()
        .oneshot(with_bearer(
            json_request("PUT", "/api/songs", json!({ "index": 0, "newSong": "Freddie Freeloader" })),
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(with_bearer(
            json_request("PUT", "/api/songs", json!({ "index": 7, "newSong": "All Blues" })),
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await, json!({ "error": "Invalid index" }));

    let response = app
        .clone()
        .oneshot(with_bearer(
            json_request("DELETE", "/api/songs", json!({ "index": 1 })),
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(with_bearer(
            json_request("DELETE", "/api/songs", json!({ "index": -1 })),
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(with_bearer(get("/api/songs"), &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!(["Freddie Freeloader"]));
}

#[tokio::test]
async fn test_song_lists_are_per_user() {
    let (app, _, _) = create_test_server();
    let alice = signup_alice(&app).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/signup",
            json!({ "email": "bob@b.com", "username": "bob", "password": "secret2" }),
        ))
        .await
        .unwrap();
    let bob = body_json(response).await["token"]
        .as_str()
        .unwrap()
        .to_string();

    app.clone()
        .oneshot(with_bearer(
            json_request("POST", "/api/songs", json!({ "song": "Naima" })),
            &alice,
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(get_with_cookie("/api/songs", &bob))
        .await
        .unwrap();
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn test_blank_song_title_rejected() {
    let (app, _, _) = create_test_server();
    let token = signup_alice(&app).await;

    let response = app
        .oneshot(with_bearer(
            json_request("POST", "/api/songs", json!({ "song": "   " })),
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
