//! Notification handle shared by the engine and its services.
//!
//! Constructed once at startup and handed to whoever needs to publish
//! change or error notifications. Cloning shares the same channel.

use tokio::sync::broadcast;
use tracing::{error, warn};

use crate::types::errors::{EngineError, ErrorKind};
use crate::types::events::{ErrorReport, StateEvent};

/// Default number of undelivered events kept per subscriber.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct Reporter {
    tx: broadcast::Sender<StateEvent>,
}

impl Reporter {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.tx.subscribe()
    }

    /// Announces a committed mutation.
    pub fn changed(&self) {
        // No subscribers is fine.
        let _ = self.tx.send(StateEvent::Changed);
    }

    /// Logs `err` and forwards it to subscribers if it is user-facing.
    pub fn error(&self, err: &EngineError) {
        if !err.is_reportable() {
            return;
        }
        match err.kind() {
            ErrorKind::CorruptedData => warn!("{}", err),
            _ => error!("{}", err),
        }
        let _ = self.tx.send(StateEvent::Error(ErrorReport::from(err)));
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}
