//! Main HTTP Gateway Server.
//!
//! Routes the game catalogue API, the websocket endpoint and the optional
//! static client assets.

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use crate::games_api;
use crate::health_api;
use crate::session_manager::SessionManager;
use crate::static_assets;
use crate::ws_server;

/// Default silence allowed on a websocket before it is probed.
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(60);

/// Default upper bound for uploaded game layouts.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 1_000_000;

#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub ping_interval: Duration,
    pub max_upload_bytes: usize,
    pub static_dir: Option<PathBuf>,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            ping_interval: DEFAULT_PING_INTERVAL,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            static_dir: None,
        }
    }
}

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub sessions: SessionManager,
    pub settings: Arc<GatewaySettings>,
    pub started_at: DateTime<Utc>,
}

impl GatewayState {
    pub fn new(sessions: SessionManager, settings: GatewaySettings) -> Self {
        Self {
            sessions,
            settings: Arc::new(settings),
            started_at: Utc::now(),
        }
    }
}

/// Build the router with every endpoint.
pub fn build_router(state: GatewayState) -> Router {
    let mut app = Router::new()
        .route("/api/health", get(health_api::get_health))
        .route("/games", get(games_api::list_games))
        .route(
            "/game/:name",
            post(games_api::create_game).delete(games_api::delete_game),
        )
        .route("/ws/:name", get(ws_server::ws_handler))
        .layer(DefaultBodyLimit::max(state.settings.max_upload_bytes));

    if let Some(dir) = &state.settings.static_dir {
        app = app.merge(static_assets::static_router(dir));
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Bind `addr` and serve until `shutdown` resolves.
#[instrument(skip(state, shutdown))]
pub async fn start_server<F>(addr: SocketAddr, state: GatewayState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(&addr).await?;
    info!("Gateway HTTP server listening on {}", addr);
    serve(listener, state, shutdown).await
}

/// Serve on an already bound listener, then flush every live session.
pub async fn serve<F>(listener: TcpListener, state: GatewayState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let sessions = state.sessions.clone();
    let app = build_router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    sessions.shutdown().await;
    info!("Gateway stopped");
    Ok(())
}
