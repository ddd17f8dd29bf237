//! Connection liveness monitor.
//!
//! A connection that stays silent for one ping interval is probed with a
//! websocket ping; if the next interval also passes without any frame or
//! pong, the connection is declared dead.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessState {
    Alive,
    Probing,
    Dead,
}

/// What the connection task must do when the timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessAction {
    SendPing,
    Close,
}

#[derive(Debug)]
pub struct Liveness {
    state: LivenessState,
    interval: Duration,
    deadline: Instant,
}

impl Liveness {
    /// Start in `Alive` with the timer armed.
    pub fn new(interval: Duration) -> Self {
        Self {
            state: LivenessState::Alive,
            interval,
            deadline: Instant::now() + interval,
        }
    }

    pub fn state(&self) -> LivenessState {
        self.state
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Any inbound frame or pong proves the peer is there.
    pub fn touch(&mut self) {
        if self.state == LivenessState::Dead {
            return;
        }
        self.state = LivenessState::Alive;
        self.deadline = Instant::now() + self.interval;
    }

    pub fn on_timer(&mut self) -> LivenessAction {
        match self.state {
            LivenessState::Alive => {
                self.state = LivenessState::Probing;
                self.deadline = Instant::now() + self.interval;
                LivenessAction::SendPing
            }
            LivenessState::Probing | LivenessState::Dead => {
                self.state = LivenessState::Dead;
                LivenessAction::Close
            }
        }
    }
}
