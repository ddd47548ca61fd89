//! HTTP API client for the Thetawaves server.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thetawaves::auth::{AuthSuccess, UserSummary};

/// API client for communicating with the server
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
    token: Option<String>,
}

#[derive(Debug, Serialize)]
struct SignupRequest<'a> {
    email: &'a str,
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct SigninRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Error body: auth routes answer `{message}`, the song API `{error}`
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct MeBody {
    user: UserSummary,
}

/// Turn a non-success response into an error carrying the server's one-line
/// message.
async fn check(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let text = response
        .text()
        .await
        .unwrap_or_else(|e| format!("Failed to read error response: {}", e));
    let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
    let message = body.message.or(body.error).unwrap_or(text);

    anyhow::bail!("{} failed ({}): {}", what, status.as_u16(), message)
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            token: None,
        }
    }

    /// Reuse a token from an earlier session
    pub fn with_token(mut self, token: String) -> Self {
        self.token = Some(token);
        self
    }

    /// Token sent as `Authorization: Bearer`, if signed in
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn bearer(&self) -> Result<&str> {
        self.token.as_deref().context("Not signed in")
    }

    /// Register a new user; on success the client holds their token
    pub async fn signup(&mut self, email: &str, username: &str, password: &str) -> Result<AuthSuccess> {
        let request = SignupRequest {
            email,
            username,
            password,
        };

        let response = self
            .client
            .post(format!("{}/api/auth/signup", self.base_url))
            .json(&request)
            .send()
            .await
            .context("Failed to send signup request")?;

        let success: AuthSuccess = check(response, "Signup")
            .await?
            .json()
            .await
            .context("Failed to parse signup response")?;

        self.token = Some(success.token.clone());
        Ok(success)
    }

    /// Sign in with username and password
    pub async fn signin(&mut self, username: &str, password: &str) -> Result<AuthSuccess> {
        let request = SigninRequest { username, password };

        let response = self
            .client
            .post(format!("{}/api/auth/signin", self.base_url))
            .json(&request)
            .send()
            .await
            .context("Failed to send signin request")?;

        let success: AuthSuccess = check(response, "Signin")
            .await?
            .json()
            .await
            .context("Failed to parse signin response")?;

        self.token = Some(success.token.clone());
        Ok(success)
    }

    /// Forget the token and tell the server to clear its session cookie.
    /// The token is dropped even when the request fails.
    pub async fn logout(&mut self) -> Result<String> {
        self.token = None;

        let response = self
            .client
            .post(format!("{}/api/auth/logout", self.base_url))
            .send()
            .await
            .context("Failed to send logout request")?;

        let body: MessageBody = check(response, "Logout")
            .await?
            .json()
            .await
            .context("Failed to parse logout response")?;

        Ok(body.message)
    }

    /// Account behind the current token
    pub async fn me(&self) -> Result<UserSummary> {
        let response = self
            .client
            .get(format!("{}/api/auth/me", self.base_url))
            .bearer_auth(self.bearer()?)
            .send()
            .await
            .context("Failed to send user request")?;

        let body: MeBody = check(response, "User lookup")
            .await?
            .json()
            .await
            .context("Failed to parse user response")?;

        Ok(body.user)
    }

    /// The signed-in user's song list
    pub async fn list_songs(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(format!("{}/api/songs", self.base_url))
            .bearer_auth(self.bearer()?)
            .send()
            .await
            .context("Failed to list songs")?;

        check(response, "List songs")
            .await?
            .json()
            .await
            .context("Failed to parse song list")
    }

    pub async fn add_song(&self, title: &str) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/api/songs", self.base_url))
            .bearer_auth(self.bearer()?)
            .json(&serde_json::json!({ "song": title }))
            .send()
            .await
            .context("Failed to send add song request")?;

        check(response, "Add song").await?;
        Ok(())
    }

    pub async fn replace_song(&self, index: i64, title: &str) -> Result<()> {
        let response = self
            .client
            .put(format!("{}/api/songs", self.base_url))
            .bearer_auth(self.bearer()?)
            .json(&serde_json::json!({ "index": index, "newSong": title }))
            .send()
            .await
            .context("Failed to send replace song request")?;

        check(response, "Replace song").await?;
        Ok(())
    }

    pub async fn remove_song(&self, index: i64) -> Result<()> {
        let response = self
            .client
            .delete(format!("{}/api/songs", self.base_url))
            .bearer_auth(self.bearer()?)
            .json(&serde_json::json!({ "index": index }))
            .send()
            .await
            .context("Failed to send remove song request")?;

        check(response, "Remove song").await?;
        Ok(())
    }
}
