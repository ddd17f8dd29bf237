//! One live puzzle session.
//!
//! Every session runs as a single Tokio task that owns its board, roster and
//! write-back state, and reacts to [`SessionEvent`]s one at a time, so no
//! lock guards session-local state.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crossgrid_core::{Board, ClientCommand, GameStore, MergeOutcome, PublicView};

use crate::roster::{ClientId, ClientSender, Roster};
use crate::session_manager::SessionManager;
use crate::write_back::{sleep_until, WriteBack};

/// Default quiet period before a dirty board is written back.
pub const DEFAULT_WRITE_BACK_DELAY: Duration = Duration::from_secs(20);

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub write_back_delay: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            write_back_delay: DEFAULT_WRITE_BACK_DELAY,
        }
    }
}

/// Inputs to a session task.
#[derive(Debug)]
pub enum SessionEvent {
    Join {
        client: ClientId,
        sender: ClientSender,
    },
    Command {
        client: ClientId,
        command: ClientCommand,
    },
    Leave {
        client: ClientId,
    },
    /// Server shutdown: flush and stop.
    Shutdown,
}

pub struct Session {
    name: String,
    store: GameStore,
    board: Option<Board>,
    roster: Roster,
    write_back: WriteBack,
}

impl Session {
    pub fn new(name: impl Into<String>, store: GameStore, settings: &SessionSettings) -> Self {
        Self {
            name: name.into(),
            store,
            board: None,
            roster: Roster::new(),
            write_back: WriteBack::new(settings.write_back_delay),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Load the board from storage. A failure is permanent for this session:
    /// it keeps serving a degenerate view until it is unloaded.
    pub async fn load(&mut self) {
        match self.store.load(&self.name).await {
            Ok(board) => {
                info!(session = %self.name, width = board.width(), height = board.height(), "Loaded game");
                self.board = Some(board);
            }
            Err(e) => {
                warn!(session = %self.name, error = %e, "Failed to read the current game state");
            }
        }
    }

    /// Returns `true` once the last client has left.
    pub async fn handle(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::Join { client, sender } => {
                self.join(client, sender);
                false
            }
            SessionEvent::Command { client, command } => {
                self.command(client, command);
                false
            }
            SessionEvent::Leave { client } => self.leave(client).await,
            SessionEvent::Shutdown => {
                self.flush(true).await;
                true
            }
        }
    }

    pub fn join(&mut self, client: ClientId, sender: ClientSender) {
        self.roster.register(client, sender);
        debug!(session = %self.name, client, "Registered client");
        self.notify_one(client);
    }

    pub fn command(&mut self, client: ClientId, command: ClientCommand) {
        if !self.roster.contains(client) {
            return;
        }
        match command {
            ClientCommand::Name { name } => self.update_name(client, &name),
            ClientCommand::Update { data } => self.update_grid(client, &data),
        }
    }

    /// Remove a client. When it was the last one, the board is flushed
    /// immediately and `true` is returned so the session can be unloaded.
    pub async fn leave(&mut self, client: ClientId) -> bool {
        let Some(departure) = self.roster.drop_client(client) else {
            return false;
        };
        debug!(session = %self.name, client, "Client left");

        if departure.now_empty {
            self.flush(true).await;
            return true;
        }
        if departure.was_named {
            self.broadcast_all();
        }
        false
    }

    pub fn update_name(&mut self, client: ClientId, name: &str) {
        if self.roster.set_name(client, name) {
            self.broadcast_all();
        }
    }

    pub fn update_grid(&mut self, client: ClientId, data: &Value) {
        if self.board.is_none() {
            debug!(session = %self.name, client, "Discarding grid update for failed load");
            self.notify_one(client);
            return;
        }
        if self.roster.name(client).is_none_or(str::is_empty) {
            debug!(session = %self.name, client, "Discarding grid update of unnamed player");
            self.notify_one(client);
            return;
        }
        let Some(board) = self.board.as_mut() else {
            return;
        };

        match board.merge_update(data) {
            MergeOutcome::Invalid => {
                debug!(session = %self.name, client, "Discarding invalid grid update");
                self.notify_one(client);
            }
            MergeOutcome::Unchanged => {
                debug!(session = %self.name, client, "Discarding empty grid update");
                self.notify_one(client);
            }
            MergeOutcome::Changed => {
                self.broadcast_all();
                self.request_write_back();
            }
        }
    }

    pub fn public_view(&self) -> PublicView<'_> {
        PublicView::build(
            self.board.as_ref(),
            self.write_back.failed(),
            self.roster.names(),
        )
    }

    pub fn broadcast_all(&self) {
        let frame: Arc<str> = Arc::from(self.public_view().to_json());
        self.roster.send_all(frame);
    }

    pub fn notify_one(&self, client: ClientId) {
        let frame: Arc<str> = Arc::from(self.public_view().to_json());
        self.roster.send_to(client, frame);
    }

    fn request_write_back(&mut self) {
        if self.board.is_some() {
            self.write_back.request();
        }
    }

    /// Persist the board if a write-back is pending.
    ///
    /// A failed regular flush re-arms the timer; a failed final flush gives
    /// up since the in-memory state is about to be dropped. Clients hear about
    /// the first failure of a streak through the `failed` flag.
    pub async fn flush(&mut self, final_flush: bool) {
        if !self.write_back.take() {
            return;
        }
        let Some(board) = &self.board else {
            return;
        };

        match self.store.replace(&self.name, board).await {
            Ok(()) => {
                if self.write_back.failed() {
                    info!(session = %self.name, "Write-back recovered");
                }
                self.write_back.succeeded();
                debug!(session = %self.name, "Wrote game state");
            }
            Err(e) => {
                if final_flush {
                    warn!(session = %self.name, error = %e, "Discarding write-back as state is lost");
                } else {
                    self.write_back.request();
                }
                if self.write_back.record_failure() {
                    self.broadcast_all();
                }
            }
        }
    }
}

/// Drive a session until its last client leaves or the server shuts down.
pub(crate) async fn run(
    mut session: Session,
    mut rx: mpsc::UnboundedReceiver<SessionEvent>,
    manager: SessionManager,
    generation: u64,
) {
    session.load().await;

    loop {
        let deadline = session.write_back.deadline();
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else {
                    session.flush(true).await;
                    break;
                };
                let shutdown = matches!(event, SessionEvent::Shutdown);
                if session.handle(event).await
                    && (shutdown || manager.retire(session.name(), generation, &rx).await)
                {
                    break;
                }
            }
            _ = sleep_until(deadline) => session.flush(false).await,
        }
    }

    debug!(session = %session.name, "Session task finished");
}
