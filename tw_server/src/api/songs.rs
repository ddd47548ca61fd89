//! Song list API handlers.
//!
//! All routes sit behind [`auth_middleware`](super::middleware::auth_middleware);
//! each caller sees only their own list. Indices are zero-based positions in
//! the list as returned by `GET /api/songs`.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thetawaves::songs::SongError;

use super::{AppState, middleware::AuthenticatedUser};

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AddSongRequest {
    pub song: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReplaceSongRequest {
    pub index: i64,
    #[serde(rename = "newSong")]
    pub new_song: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RemoveSongRequest {
    pub index: i64,
}

type SongApiResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;

fn song_error(err: SongError) -> (StatusCode, Json<Value>) {
    if err.is_client_error() {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": err.to_string() })))
    } else {
        tracing::error!("Song list operation failed: {}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Internal server error" })),
        )
    }
}

fn body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, (StatusCode, Json<Value>)> {
    body.map(|Json(value)| value).map_err(|rejection| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": rejection.body_text() })),
        )
    })
}

fn success() -> Json<Value> {
    Json(json!({ "success": true }))
}

/// `GET /api/songs` → `["title", ...]`
pub async fn list_songs(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> SongApiResult<Vec<String>> {
    state
        .song_manager
        .list(user_id)
        .await
        .map(Json)
        .map_err(song_error)
}

/// `POST /api/songs {song}`
pub async fn add_song(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    payload: Result<Json<AddSongRequest>, JsonRejection>,
) -> SongApiResult<Value> {
    let payload = body(payload)?;
    state
        .song_manager
        .add(user_id, &payload.song)
        .await
        .map_err(song_error)?;
    Ok(success())
}

/// `PUT /api/songs {index, newSong}`; `400 {"error":"Invalid index"}` when out of range
pub async fn replace_song(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    payload: Result<Json<ReplaceSongRequest>, JsonRejection>,
) -> SongApiResult<Value> {
    let payload = body(payload)?;
    state
        .song_manager
        .replace(user_id, payload.index, &payload.new_song)
        .await
        .map_err(song_error)?;
    Ok(success())
}

/// `DELETE /api/songs {index}`
pub async fn remove_song(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    payload: Result<Json<RemoveSongRequest>, JsonRejection>,
) -> SongApiResult<Value> {
    let payload = body(payload)?;
    state
        .song_manager
        .remove(user_id, payload.index)
        .await
        .map_err(song_error)?;
    Ok(success())
}
