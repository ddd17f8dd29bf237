//! Static client assets.

use std::path::Path;

use axum::Router;
use tower_http::services::{ServeDir, ServeFile};

use crate::server::GatewayState;

/// Serve the puzzle client from `dir`, with short aliases for the pages.
pub fn static_router(dir: &Path) -> Router<GatewayState> {
    Router::new()
        .route_service("/", ServeFile::new(dir.join("main.html")))
        .route_service("/main", ServeFile::new(dir.join("main.html")))
        .route_service("/play", ServeFile::new(dir.join("play.html")))
        .route_service("/editor", ServeFile::new(dir.join("editor.html")))
        .fallback_service(ServeDir::new(dir))
}
