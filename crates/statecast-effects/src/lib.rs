//! Statecast Effects - host-facing handlers
//!
//! Stateful pieces built on `statecast-core` that talk to a backing store
//! and need a tokio runtime:
//!
//! - [`storage`]: in-memory storage areas publishing change events on a
//!   [`StorageBus`]
//! - [`registry`]: the [`ChannelRegistry`], one channel per stored key,
//!   fed by the bus
//! - [`persisted`]: [`PersistedChannel`] and the persisted variables built
//!   on it
//! - `testing` (feature `testing`): tracing setup and a multi-context host

#![forbid(unsafe_code)]

/// Persisted channels and variables
pub mod persisted;

/// Per-key channel registry
pub mod registry;

/// In-memory host storage
pub mod storage;

/// Test utilities
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use persisted::{persisted, raw, PersistedChannel, StorageCell, StoreCodec};
pub use registry::{ChannelRegistry, RegistryLease, RegistryStats};
pub use storage::{MemoryStorage, MemoryStore, StorageBus};
