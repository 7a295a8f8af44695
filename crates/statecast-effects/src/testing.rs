//! Test utilities: tracing setup and a multi-context host

use crate::persisted::{persisted, raw};
use crate::registry::ChannelRegistry;
use crate::storage::{MemoryStorage, StorageBus};
use statecast_core::codec::Transcoder;
use statecast_core::var::StoredVar;
use statecast_core::{ContextId, KeyValueStore, StateConfig, StoreId};
use std::fmt;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber writing through the test harness.
///
/// Honors `RUST_LOG`, defaulting to `debug`. Safe to call from every test.
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_test_writer()
        .try_init();
}

/// A storage area shared by any number of simulated contexts.
#[derive(Debug, Clone)]
pub struct TestHost {
    storage: MemoryStorage,
    config: StateConfig,
}

impl TestHost {
    /// Host with one area named `local` and default configuration.
    pub fn new() -> Self {
        Self::with_config(StateConfig::default())
    }

    /// Host configured by `config`.
    pub fn with_config(config: StateConfig) -> Self {
        let bus = StorageBus::new(config.storage.event_buffer);
        let storage = MemoryStorage::from_config("local", bus, &config.storage);
        Self { storage, config }
    }

    /// The shared area.
    pub fn storage(&self) -> &MemoryStorage {
        &self.storage
    }

    /// Open a new context on this host.
    pub fn context(&self) -> TestContext {
        let id = ContextId::new();
        let registry = ChannelRegistry::new(
            id,
            self.storage.bus().clone(),
            self.config.registry.clone(),
        );
        TestContext {
            id,
            registry,
            store: Arc::new(self.storage.attach(id)),
        }
    }
}

impl Default for TestHost {
    fn default() -> Self {
        Self::new()
    }
}

/// One simulated context: its own store handle and registry.
#[derive(Clone)]
pub struct TestContext {
    id: ContextId,
    registry: ChannelRegistry,
    store: Arc<dyn KeyValueStore>,
}

impl fmt::Debug for TestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestContext")
            .field("id", &self.id)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl TestContext {
    /// Context identity.
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// This context's registry.
    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    /// This context's store handle.
    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        self.store.clone()
    }

    /// Area the store handle writes to.
    pub fn store_id(&self) -> &StoreId {
        self.store.id()
    }

    /// Persisted variable over `key`.
    pub fn var<T, C>(&self, key: &str, codec: C) -> StoredVar<T>
    where
        T: Clone + Send + Sync + 'static,
        C: Transcoder<Option<String>, T> + 'static,
    {
        persisted(&self.registry, self.store(), key, codec)
    }

    /// Raw text variable over `key`.
    pub fn raw(&self, key: &str) -> StoredVar<Option<String>> {
        raw(&self.registry, self.store(), key)
    }
}
