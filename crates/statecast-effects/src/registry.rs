//! Channel Registry
//!
//! One [`BroadcastChannel`] per (store, key) pair, fed by a single
//! subscription to the host storage bus. Host notifications arrive as
//! [`StorageEvent`]s; each is routed to the channel registered for its
//! store and key.
//!
//! The registry is an explicit component: build one per context and hand it
//! to whoever needs it. Entries are reference counted through
//! [`RegistryLease`] and, unless `evict_idle` is off, dropped with their
//! last lease.

use crate::storage::StorageBus;
use parking_lot::Mutex;
use statecast_core::reactive::BroadcastChannel;
use statecast_core::{ContextId, RegistryConfig, Result, StateError, StorageEvent, StoreId};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

// ─────────────────────────────────────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ChannelKey {
    store: StoreId,
    key: String,
}

struct RegistryEntry {
    channel: BroadcastChannel<Option<String>>,
    leases: usize,
}

struct RegistryInner {
    context: ContextId,
    bus: StorageBus,
    config: RegistryConfig,
    entries: Mutex<HashMap<ChannelKey, RegistryEntry>>,
    listener: Mutex<Option<JoinHandle<()>>>,
    /// Set by `stop`, cleared by `start`; suppresses auto-start.
    stopped: AtomicBool,
}

/// Snapshot of a registry's bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistryStats {
    /// Registered (store, key) channels
    pub channels: usize,
    /// Outstanding leases across all channels
    pub leases: usize,
    /// Whether the bus subscription is running
    pub running: bool,
}

/// Table of per-key channels fed by host storage notifications.
///
/// Clones share the same table and subscription.
#[derive(Clone)]
pub struct ChannelRegistry {
    inner: Arc<RegistryInner>,
}

impl ChannelRegistry {
    /// Registry for `context` listening on `bus`.
    pub fn new(context: ContextId, bus: StorageBus, config: RegistryConfig) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                context,
                bus,
                config,
                entries: Mutex::new(HashMap::new()),
                listener: Mutex::new(None),
                stopped: AtomicBool::new(false),
            }),
        }
    }

    /// Context whose own changes this registry ignores.
    pub fn context(&self) -> ContextId {
        self.inner.context
    }

    /// Lease the channel for `key` in `store`, creating it if needed.
    ///
    /// With `auto_start` set, this also starts the bus subscription when a
    /// tokio runtime is available, unless the registry was explicitly
    /// stopped.
    pub fn listen(&self, store: &StoreId, key: &str) -> RegistryLease {
        let id = ChannelKey {
            store: store.clone(),
            key: key.to_string(),
        };
        let channel = {
            let mut entries = self.inner.entries.lock();
            let entry = entries.entry(id.clone()).or_insert_with(|| RegistryEntry {
                channel: BroadcastChannel::new(),
                leases: 0,
            });
            entry.leases += 1;
            entry.channel.clone()
        };

        if self.inner.config.auto_start
            && !self.inner.stopped.load(Ordering::Acquire)
            && !self.is_running()
        {
            if let Err(err) = self.start() {
                tracing::warn!(error = %err, "Registry not started; notifications will not be routed");
            }
        }

        RegistryLease {
            registry: Arc::downgrade(&self.inner),
            id,
            channel,
        }
    }

    /// Subscribe to the bus and start routing notifications.
    ///
    /// Calling `start` on a running registry does nothing. Must be called
    /// from within a tokio runtime.
    pub fn start(&self) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|err| StateError::internal(format!("no tokio runtime: {err}")))?;

        let mut listener = self.inner.listener.lock();
        self.inner.stopped.store(false, Ordering::Release);
        if listener.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return Ok(());
        }

        // Subscribe before spawning so nothing published after `start`
        // returns is missed.
        let mut events = self.inner.bus.subscribe();
        let registry = Arc::downgrade(&self.inner);
        *listener = Some(runtime.spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => match registry.upgrade() {
                        Some(inner) => inner.route(event),
                        None => break,
                    },
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Registry lagged behind storage bus");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }));
        tracing::debug!(context = %self.inner.context, "Registry started");
        Ok(())
    }

    /// Stop routing notifications. Entries are kept.
    ///
    /// Auto-start no longer applies afterwards; only [`start`](Self::start)
    /// resumes routing.
    pub fn stop(&self) {
        let mut listener = self.inner.listener.lock();
        self.inner.stopped.store(true, Ordering::Release);
        if let Some(handle) = listener.take() {
            handle.abort();
            tracing::debug!(context = %self.inner.context, "Registry stopped");
        }
    }

    /// Whether the bus subscription is running.
    pub fn is_running(&self) -> bool {
        self.inner
            .listener
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Current bookkeeping.
    pub fn stats(&self) -> RegistryStats {
        let entries = self.inner.entries.lock();
        RegistryStats {
            channels: entries.len(),
            leases: entries.values().map(|entry| entry.leases).sum(),
            running: self.is_running(),
        }
    }
}

impl fmt::Debug for ChannelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelRegistry")
            .field("context", &self.inner.context)
            .field("stats", &self.stats())
            .finish()
    }
}

impl RegistryInner {
    fn route(&self, event: StorageEvent) {
        if event.origin == self.context {
            return;
        }
        let id = ChannelKey {
            store: event.store,
            key: event.key,
        };
        // Write outside the lock; readers woken by it may call `listen`.
        let channel = self.entries.lock().get(&id).map(|entry| entry.channel.clone());
        if let Some(channel) = channel {
            channel.write(event.new_value);
        }
    }

    fn release(&self, id: &ChannelKey) {
        let mut entries = self.entries.lock();
        let Some(entry) = entries.get_mut(id) else {
            return;
        };
        entry.leases = entry.leases.saturating_sub(1);
        if entry.leases == 0 && self.config.evict_idle {
            entries.remove(id);
            tracing::debug!(store = %id.store, key = %id.key, "Registry entry evicted");
        }
    }
}

impl Drop for RegistryInner {
    fn drop(&mut self) {
        if let Some(handle) = self.listener.get_mut().take() {
            handle.abort();
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Lease
// ─────────────────────────────────────────────────────────────────────────────

/// Counted handle on a registry channel. Dropping it releases the entry.
pub struct RegistryLease {
    registry: Weak<RegistryInner>,
    id: ChannelKey,
    channel: BroadcastChannel<Option<String>>,
}

impl RegistryLease {
    /// The leased channel.
    pub fn channel(&self) -> &BroadcastChannel<Option<String>> {
        &self.channel
    }

    /// Store the channel belongs to.
    pub fn store(&self) -> &StoreId {
        &self.id.store
    }

    /// Key the channel belongs to.
    pub fn key(&self) -> &str {
        &self.id.key
    }
}

impl Clone for RegistryLease {
    fn clone(&self) -> Self {
        if let Some(inner) = self.registry.upgrade() {
            if let Some(entry) = inner.entries.lock().get_mut(&self.id) {
                entry.leases += 1;
            }
        }
        Self {
            registry: self.registry.clone(),
            id: self.id.clone(),
            channel: self.channel.clone(),
        }
    }
}

impl Drop for RegistryLease {
    fn drop(&mut self) {
        if let Some(inner) = self.registry.upgrade() {
            inner.release(&self.id);
        }
    }
}

impl fmt::Debug for RegistryLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryLease")
            .field("store", &self.id.store)
            .field("key", &self.id.key)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    fn registry(config: RegistryConfig) -> (ChannelRegistry, StorageBus) {
        let bus = StorageBus::default();
        (ChannelRegistry::new(ContextId::new(), bus.clone(), config), bus)
    }

    fn manual() -> RegistryConfig {
        RegistryConfig {
            auto_start: false,
            ..RegistryConfig::default()
        }
    }

    #[test]
    fn test_listen_shares_one_channel_per_key() {
        let (registry, _bus) = registry(manual());
        let store = StoreId::new("local");

        let a = registry.listen(&store, "k");
        let b = registry.listen(&store, "k");
        let other = registry.listen(&store, "j");

        let read = b.channel().next();
        a.channel().write(Some("v".into()));
        assert_eq!(read.now_or_never(), Some(Some("v".to_string())));
        assert_eq!(other.channel().pending_reads(), 0);

        let stats = registry.stats();
        assert_eq!((stats.channels, stats.leases, stats.running), (2, 3, false));
    }

    #[test]
    fn test_last_lease_evicts_entry() {
        let (registry, _bus) = registry(manual());
        let store = StoreId::new("local");

        let a = registry.listen(&store, "k");
        let b = a.clone();
        drop(a);
        assert_eq!(registry.stats().channels, 1);
        drop(b);
        assert_eq!(registry.stats(), RegistryStats::default());
    }

    #[test]
    fn test_entries_kept_without_eviction() {
        let (registry, _bus) = registry(RegistryConfig {
            auto_start: false,
            evict_idle: false,
        });
        drop(registry.listen(&StoreId::new("local"), "k"));

        let stats = registry.stats();
        assert_eq!((stats.channels, stats.leases), (1, 0));
    }

    #[test]
    fn test_start_requires_runtime() {
        let (registry, _bus) = registry(manual());
        assert!(registry.start().is_err());
        assert!(!registry.is_running());
    }

    #[tokio::test]
    async fn test_start_is_idempotent_and_stop_aborts() {
        let (registry, bus) = registry(manual());
        registry.start().unwrap();
        registry.start().unwrap();
        assert!(registry.is_running());
        assert_eq!(bus.subscriber_count(), 1);

        registry.stop();
        assert!(!registry.is_running());
    }

    #[tokio::test]
    async fn test_listen_after_stop_does_not_restart() {
        let (registry, _bus) = registry(RegistryConfig::default());
        let store = StoreId::new("local");
        let _first = registry.listen(&store, "k");
        assert!(registry.is_running());

        registry.stop();
        let _second = registry.listen(&store, "j");
        assert!(!registry.is_running());

        registry.start().unwrap();
        assert!(registry.is_running());
    }

    #[tokio::test]
    async fn test_keeps_routing_after_lag() {
        let bus = StorageBus::new(1);
        let registry = ChannelRegistry::new(ContextId::new(), bus.clone(), manual());
        let store = StoreId::new("local");
        let lease = registry.listen(&store, "k");
        registry.start().unwrap();

        let event = |value: &str| StorageEvent {
            store: store.clone(),
            key: "k".into(),
            old_value: None,
            new_value: Some(value.into()),
            origin: ContextId::new(),
        };

        // Both land before the task runs; the first is overwritten.
        bus.publish(event("dropped"));
        bus.publish(event("kept"));
        let read = lease.channel().next();
        assert_eq!(read.await, Some("kept".to_string()));

        let read = lease.channel().next();
        bus.publish(event("after"));
        assert_eq!(read.await, Some("after".to_string()));
        assert!(registry.is_running());
    }

    #[tokio::test]
    async fn test_routes_foreign_events_only() {
        let (registry, bus) = registry(RegistryConfig::default());
        let store = StoreId::new("local");
        let lease = registry.listen(&store, "k");
        assert!(registry.is_running());

        let event = |origin| StorageEvent {
            store: store.clone(),
            key: "k".into(),
            old_value: None,
            new_value: Some("remote".into()),
            origin,
        };

        let mut own = lease.channel().next();
        bus.publish(event(registry.context()));
        tokio::task::yield_now().await;
        assert_eq!((&mut own).now_or_never(), None);

        bus.publish(event(ContextId::new()));
        assert_eq!(own.await, Some("remote".to_string()));
    }
}
