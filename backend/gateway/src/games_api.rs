//! Game catalogue endpoints: list, upload and delete puzzle files.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use tracing::{error, info, warn};

use crossgrid_core::{is_valid_game_name, Board, GridError, Layout, StorageError};

use crate::server::GatewayState;

type ApiResult = Result<(StatusCode, &'static str), (StatusCode, String)>;

/// Handler for `GET /games`
pub async fn list_games(State(state): State<GatewayState>) -> Json<Vec<String>> {
    match state.sessions.store().list().await {
        Ok(games) => Json(games),
        Err(e) => {
            error!(error = %e, "Error while reading directory content");
            Json(Vec::new())
        }
    }
}

/// Handler for `POST /game/:name`
pub async fn create_game(
    State(state): State<GatewayState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult {
    require_valid_name(&name)?;
    let store = state.sessions.store();

    if store.exists(&name).await {
        return Err((StatusCode::CONFLICT, "already exists".into()));
    }
    if !is_json(&headers) {
        return Err((StatusCode::UNSUPPORTED_MEDIA_TYPE, "expected application/json".into()));
    }

    let board = parse_layout(&body).map_err(|e| {
        warn!(game = %name, error = %e, "Error while parsing the game");
        (StatusCode::BAD_REQUEST, e.to_string())
    })?;

    match store.create(&name, &board).await {
        Ok(()) => {
            info!(game = %name, "Game uploaded");
            Ok((StatusCode::OK, "upload"))
        }
        Err(GridError::Storage(StorageError::AlreadyExists)) => {
            Err((StatusCode::CONFLICT, "already exists".into()))
        }
        Err(e) => {
            error!(game = %name, error = %e, "Error while writing the game out");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "File-System error storing the game".into(),
            ))
        }
    }
}

/// Handler for `DELETE /game/:name`
pub async fn delete_game(State(state): State<GatewayState>, Path(name): Path<String>) -> ApiResult {
    require_valid_name(&name)?;
    let store = state.sessions.store();

    if !store.exists(&name).await {
        return Err((StatusCode::NOT_FOUND, "not found".into()));
    }
    match store.delete(&name).await {
        Ok(()) => Ok((StatusCode::OK, "delete")),
        Err(GridError::Storage(StorageError::NotFound)) => {
            Err((StatusCode::NOT_FOUND, "not found".into()))
        }
        Err(e) => {
            error!(game = %name, error = %e, "Error while removing game");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "File-System error removing the game".into(),
            ))
        }
    }
}

fn require_valid_name(name: &str) -> Result<(), (StatusCode, String)> {
    if is_valid_game_name(name) {
        Ok(())
    } else {
        Err((StatusCode::NOT_FOUND, "not found".into()))
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

/// Parse an uploaded layout into a fresh board.
pub fn parse_layout(body: &[u8]) -> Result<Board, GridError> {
    let layout: Layout = serde_json::from_slice(body)?;
    Board::from_layout(&layout)
}
