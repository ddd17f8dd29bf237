//! Websocket frames exchanged with puzzle clients.

use serde::Deserialize;
use serde_json::Value;

/// Reply sent before closing a connection to a game that does not exist.
pub const UNKNOWN_GAME: &str = "\"unknown-game\"";

/// Client -> server commands.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "cmd", rename_all = "lowercase")]
pub enum ClientCommand {
    /// Set this connection's display name.
    Name { name: String },
    /// Offer the client's whole grid for merging. The payload is validated
    /// by the board, so a malformed grid is a rejected update rather than a
    /// protocol error.
    Update {
        #[serde(default)]
        data: Value,
    },
}

impl ClientCommand {
    /// Parse a frame; `None` means the connection must be closed.
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ClientCommand::Name { .. } => "name",
            ClientCommand::Update { .. } => "update",
        }
    }
}
