//! Host storage with cross-context change notifications
//!
//! [`StorageBus`] plays the role of the host's storage-event channel: every
//! change made through any attached store is published on it. Listeners are
//! expected to drop events from their own context, since hosts only notify
//! *other* contexts.

mod memory;

pub use memory::{MemoryStorage, MemoryStore};

use statecast_core::StorageEvent;
use tokio::sync::broadcast;

/// Default capacity of a [`StorageBus`].
pub const DEFAULT_EVENT_BUFFER: usize = 256;

/// Fan-out of [`StorageEvent`]s to every subscribed context.
#[derive(Debug, Clone)]
pub struct StorageBus {
    sender: broadcast::Sender<StorageEvent>,
}

impl StorageBus {
    /// Bus holding up to `capacity` undelivered events per subscriber.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Announce a change. Returns how many subscribers will see it.
    pub fn publish(&self, event: StorageEvent) -> usize {
        // No subscribers is not an error: nobody is listening yet.
        self.sender.send(event).unwrap_or(0)
    }

    /// Receive every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for StorageBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER)
    }
}
