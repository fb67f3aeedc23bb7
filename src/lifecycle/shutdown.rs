//! Shutdown coordination for the server.

use tokio::sync::{broadcast, watch};

/// Server lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Accepting connections.
    Running,
    /// No longer accepting; in-flight requests are draining.
    ShuttingDown,
    /// Drain finished or abandoned.
    Stopped,
}

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that the server subscribes to, and tracks
/// the Running → ShuttingDown → Stopped transitions. Only the first
/// `trigger` has any effect.
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
    /// Current lifecycle state.
    state: watch::Sender<ServerState>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        let (state, _) = watch::channel(ServerState::Running);
        Self { tx, state }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    ///
    /// Returns `true` if this call started the shutdown.
    pub fn trigger(&self) -> bool {
        let started = self.state.send_if_modified(|state| {
            if *state == ServerState::Running {
                *state = ServerState::ShuttingDown;
                true
            } else {
                false
            }
        });
        if started {
            let _ = self.tx.send(());
        }
        started
    }

    /// Record that the server has stopped.
    pub fn mark_stopped(&self) {
        self.state.send_replace(ServerState::Stopped);
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ServerState {
        *self.state.borrow()
    }

    /// Watch lifecycle transitions.
    pub fn watch_state(&self) -> watch::Receiver<ServerState> {
        self.state.subscribe()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
