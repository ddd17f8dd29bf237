//! crossgrid Gateway
//!
//! Hosts the live puzzle sessions behind a websocket endpoint, plus the game
//! catalogue API and optional static client assets.

pub mod games_api;
pub mod health_api;
pub mod liveness;
pub mod roster;
pub mod server;
pub mod session;
pub mod session_manager;
pub mod static_assets;
pub mod write_back;
pub mod ws_server;

pub use server::{build_router, serve, start_server, GatewaySettings, GatewayState};
pub use session::{SessionSettings, DEFAULT_WRITE_BACK_DELAY};
pub use session_manager::{Membership, SessionManager};
