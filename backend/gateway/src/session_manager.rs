//! Active Session Registry.
//!
//! Maps game names to running session tasks, starting a task on the first
//! connection and retiring it after the last one leaves.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crossgrid_core::{ClientCommand, GameStore, GridError};

use crate::roster::{ClientId, ClientSender};
use crate::session::{self, Session, SessionEvent, SessionSettings};

struct SessionHandle {
    generation: u64,
    tx: mpsc::UnboundedSender<SessionEvent>,
    task: JoinHandle<()>,
}

struct Inner {
    sessions: Mutex<HashMap<String, SessionHandle>>,
    store: GameStore,
    settings: SessionSettings,
    next_client: AtomicU64,
    next_generation: AtomicU64,
}

/// Owns every live session.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    pub fn new(store: GameStore, settings: SessionSettings) -> Self {
        Self {
            inner: Arc::new(Inner {
                sessions: Mutex::new(HashMap::new()),
                store,
                settings,
                next_client: AtomicU64::new(1),
                next_generation: AtomicU64::new(1),
            }),
        }
    }

    pub fn store(&self) -> &GameStore {
        &self.inner.store
    }

    /// Attach a new connection to the named game.
    ///
    /// The caller must have validated `name`. Games without a backing file
    /// are rejected before any session is created. The file check runs
    /// outside the registry lock.
    pub async fn join(&self, name: &str, sender: ClientSender) -> Result<Membership, GridError> {
        let client = self.inner.next_client.fetch_add(1, Ordering::Relaxed);

        {
            let mut sessions = self.inner.sessions.lock().await;
            if let Some(membership) = attach(&mut sessions, name, client, &sender) {
                return Ok(membership);
            }
        }

        if !self.inner.store.exists(name).await {
            return Err(GridError::UnknownGame(name.to_string()));
        }

        let mut sessions = self.inner.sessions.lock().await;
        // Another connection may have started the session meanwhile.
        if let Some(membership) = attach(&mut sessions, name, client, &sender) {
            return Ok(membership);
        }

        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(SessionEvent::Join { client, sender });

        let session = Session::new(name, self.inner.store.clone(), &self.inner.settings);
        let task = tokio::spawn(session::run(session, rx, self.clone(), generation));
        sessions.insert(
            name.to_string(),
            SessionHandle {
                generation,
                tx: tx.clone(),
                task,
            },
        );
        info!(session = name, client, "Started session");

        Ok(Membership { client, tx })
    }

    /// Called by a session task whose roster just became empty.
    ///
    /// Returns `false` if a join was queued in the meantime, in which case the
    /// session keeps running.
    pub(crate) async fn retire(
        &self,
        name: &str,
        generation: u64,
        rx: &mpsc::UnboundedReceiver<SessionEvent>,
    ) -> bool {
        let mut sessions = self.inner.sessions.lock().await;
        if !rx.is_empty() {
            debug!(session = name, "Session revived while unloading");
            return false;
        }
        if sessions.get(name).is_some_and(|h| h.generation == generation) {
            sessions.remove(name);
        }
        info!(session = name, "Unloaded session");
        true
    }

    pub async fn active_sessions(&self) -> usize {
        self.inner.sessions.lock().await.len()
    }

    pub async fn is_active(&self, name: &str) -> bool {
        self.inner.sessions.lock().await.contains_key(name)
    }

    /// Flush every session and wait for the tasks to finish.
    pub async fn shutdown(&self) {
        let handles: Vec<SessionHandle> = {
            let mut sessions = self.inner.sessions.lock().await;
            sessions.drain().map(|(_, handle)| handle).collect()
        };
        info!(count = handles.len(), "Shutting down sessions");
        for handle in handles {
            let _ = handle.tx.send(SessionEvent::Shutdown);
            let _ = handle.task.await;
        }
    }
}

/// Queue a join on a running session. Drops the entry if its task is gone.
fn attach(
    sessions: &mut HashMap<String, SessionHandle>,
    name: &str,
    client: ClientId,
    sender: &ClientSender,
) -> Option<Membership> {
    let handle = sessions.get(name)?;
    let join = SessionEvent::Join {
        client,
        sender: sender.clone(),
    };
    if handle.tx.send(join).is_ok() {
        debug!(session = name, client, "Joined active session");
        return Some(Membership {
            client,
            tx: handle.tx.clone(),
        });
    }
    sessions.remove(name);
    None
}

/// A connection's seat in a session. Dropping it leaves the session.
pub struct Membership {
    client: ClientId,
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl Membership {
    pub fn client(&self) -> ClientId {
        self.client
    }

    pub fn send(&self, command: ClientCommand) {
        let _ = self.tx.send(SessionEvent::Command {
            client: self.client,
            command,
        });
    }
}

impl Drop for Membership {
    fn drop(&mut self) {
        let _ = self.tx.send(SessionEvent::Leave {
            client: self.client,
        });
    }
}
