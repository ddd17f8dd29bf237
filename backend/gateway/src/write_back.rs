//! Debounced write-back bookkeeping.
//!
//! The session task owns one [`WriteBack`] and polls its deadline; the actual
//! I/O happens in [`crate::session`] through
//! [`crossgrid_core::GameStore::replace`].

use std::time::Duration;

use tokio::time::Instant;

/// Pending-flush deadline plus the sticky failure flag.
#[derive(Debug)]
pub struct WriteBack {
    delay: Duration,
    deadline: Option<Instant>,
    failed: bool,
}

impl WriteBack {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
            failed: false,
        }
    }

    /// (Re)arm the timer; a burst of requests collapses into one flush after
    /// the last of them.
    pub fn request(&mut self) {
        self.deadline = Some(Instant::now() + self.delay);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Cancel the timer, returning whether anything was dirty.
    pub fn take(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn succeeded(&mut self) {
        self.failed = false;
    }

    /// Record a failed flush. Returns `true` the first time, when clients
    /// still need to be told.
    pub fn record_failure(&mut self) -> bool {
        !std::mem::replace(&mut self.failed, true)
    }
}

/// Sleep until `deadline`, or forever when nothing is pending.
pub async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
