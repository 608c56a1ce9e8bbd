//! Session events for the external session collaborator.
//!
//! The engine never handles credentials. When the latest request on a screen
//! is rejected with [`CoreError::Auth`](entoscope_core::error::CoreError::Auth)
//! it publishes a [`SessionEvent`] here and leaves re-authentication to
//! whoever subscribes.

use serde::Serialize;
use tokio::sync::broadcast;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 64;

/// Something the session layer needs to react to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The record source rejected the caller's credentials.
    AuthRejected { message: String },
}

/// Fan-out channel for [`SessionEvent`]s, shared via `Arc<SessionBus>`.
pub struct SessionBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionBus {
    /// Bus buffering up to `capacity` events per lagging subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers; dropped if there are none.
    pub fn publish(&self, event: SessionEvent) {
        // A SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }
}

impl Default for SessionBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
