//! WebSocket entrypoint and connection handler.
//!
//! Upgrades `/ws/:name` to a websocket, attaches it to the game's session and
//! runs the connection loop: outbound views, inbound commands and the
//! liveness timer.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crossgrid_core::{is_valid_game_name, ClientCommand, GridError, UNKNOWN_GAME};

use crate::liveness::{Liveness, LivenessAction};
use crate::server::GatewayState;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(name): Path<String>,
    State(state): State<GatewayState>,
) -> Response {
    if !is_valid_game_name(&name) {
        warn!(game = %name, "Invalid request for websocket endpoint");
        return StatusCode::NOT_FOUND.into_response();
    }
    ws.on_upgrade(move |socket| handle_connection(socket, name, state))
}

async fn handle_connection(socket: WebSocket, name: String, state: GatewayState) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Arc<str>>();

    let membership = match state.sessions.join(&name, tx).await {
        Ok(membership) => membership,
        Err(GridError::UnknownGame(_)) => {
            info!(game = %name, "Websocket for unknown game");
            let _ = sender.send(Message::Text(UNKNOWN_GAME.to_string())).await;
            let _ = sender.close().await;
            return;
        }
        Err(e) => {
            error!(game = %name, error = %e, "Failed to join session");
            let _ = sender.close().await;
            return;
        }
    };
    let client = membership.client();
    info!(game = %name, client, "Registered websocket");

    let mut liveness = Liveness::new(state.settings.ping_interval);

    loop {
        tokio::select! {
            frame = rx.recv() => {
                let Some(frame) = frame else { break };
                if sender.send(Message::Text(frame.to_string())).await.is_err() {
                    break;
                }
            }
            msg = receiver.next() => {
                let text = match msg {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                        Ok(text) => text,
                        Err(_) => {
                            warn!(game = %name, client, "Received non UTF-8 frame");
                            break;
                        }
                    },
                    Some(Ok(Message::Pong(_))) => {
                        liveness.touch();
                        continue;
                    }
                    Some(Ok(Message::Ping(_))) => continue,
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                };

                liveness.touch();
                match ClientCommand::parse(&text) {
                    Some(command) => {
                        debug!(game = %name, client, cmd = command.kind(), "Received command");
                        membership.send(command);
                    }
                    None => {
                        warn!(game = %name, client, "Failed to parse websocket message");
                        break;
                    }
                }
            }
            _ = tokio::time::sleep_until(liveness.deadline()) => {
                match liveness.on_timer() {
                    LivenessAction::SendPing => {
                        if sender.send(Message::Ping(Vec::new())).await.is_err() {
                            break;
                        }
                    }
                    LivenessAction::Close => {
                        info!(game = %name, client, "Closing unresponsive websocket");
                        break;
                    }
                }
            }
        }
    }

    drop(membership);
    let _ = sender.close().await;
    info!(game = %name, client, "Websocket disconnected");
}
