//! Persisted channels and variables
//!
//! A [`PersistedChannel`] merges two change sources for one stored key:
//! - the registry channel, fed by notifications from other contexts
//! - a private local channel, fed by this handle's own writes, since hosts
//!   do not notify the context that made a change
//!
//! A read resolves with whichever source fires first. A local write and a
//! near-simultaneous notification can both be delivered, so consumers must
//! treat repeated values as idempotent.

use crate::registry::{ChannelRegistry, RegistryLease};
use futures::future::{self, BoxFuture, Either, FutureExt};
use statecast_core::codec::{TextCodec, Transcoder};
use statecast_core::reactive::{Broadcast, BroadcastChannel};
use statecast_core::var::{Cell, StoredVar};
use statecast_core::{KeyValueStore, Result};
use std::fmt;
use std::sync::Arc;

/// Codec between stored text and a value.
pub type StoreCodec<T> = Arc<dyn Transcoder<Option<String>, T>>;

// ─────────────────────────────────────────────────────────────────────────────
// Channel
// ─────────────────────────────────────────────────────────────────────────────

/// Broadcast channel backed by one key of a [`KeyValueStore`].
pub struct PersistedChannel<T: Clone> {
    store: Arc<dyn KeyValueStore>,
    key: String,
    codec: StoreCodec<T>,
    local: BroadcastChannel<T>,
    lease: RegistryLease,
}

impl<T> PersistedChannel<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Channel for `key` in `store`, listening through `registry`.
    pub fn new<C>(
        registry: &ChannelRegistry,
        store: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
        codec: C,
    ) -> Self
    where
        C: Transcoder<Option<String>, T> + 'static,
    {
        Self::with_shared_codec(registry, store, key, Arc::new(codec))
    }

    /// Like [`new`](Self::new), with a codec shared with other holders.
    pub fn with_shared_codec(
        registry: &ChannelRegistry,
        store: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
        codec: StoreCodec<T>,
    ) -> Self {
        let key = key.into();
        let lease = registry.listen(store.id(), &key);
        Self {
            store,
            key,
            codec,
            local: BroadcastChannel::new(),
            lease,
        }
    }

    /// The stored key.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<T> Broadcast<T> for PersistedChannel<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn read(&self) -> BoxFuture<'static, Result<T>> {
        let remote = self.lease.channel().next();
        let local = self.local.next();
        let codec = self.codec.clone();
        async move {
            match future::select(remote, local).await {
                Either::Left((raw, _)) => codec.decode(raw),
                Either::Right((value, _)) => Ok(value),
            }
        }
        .boxed()
    }

    fn write(&self, value: T) -> Result<()> {
        match self.codec.encode(value.clone())? {
            Some(text) => self.store.set(&self.key, &text)?,
            None => self.store.remove(&self.key)?,
        }
        self.local.write(value);
        Ok(())
    }
}

impl<T: Clone> fmt::Debug for PersistedChannel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistedChannel")
            .field("store", self.store.id())
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cell
// ─────────────────────────────────────────────────────────────────────────────

/// Read side of a stored key. Writes go through the channel, so the
/// default no-op `set` is kept.
pub struct StorageCell<T> {
    store: Arc<dyn KeyValueStore>,
    key: String,
    codec: StoreCodec<T>,
}

impl<T> StorageCell<T> {
    /// Cell reading `key` from `store` through `codec`.
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>, codec: StoreCodec<T>) -> Self {
        Self {
            store,
            key: key.into(),
            codec,
        }
    }
}

impl<T> Cell<T> for StorageCell<T> {
    fn get(&self) -> Result<T> {
        let raw = self.store.get(&self.key)?;
        self.codec.decode(raw)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Variables
// ─────────────────────────────────────────────────────────────────────────────

/// Variable over `key` in `store`: reads come straight from the store,
/// writes are durable and announced locally and to other contexts.
pub fn persisted<T, C>(
    registry: &ChannelRegistry,
    store: Arc<dyn KeyValueStore>,
    key: impl Into<String>,
    codec: C,
) -> StoredVar<T>
where
    T: Clone + Send + Sync + 'static,
    C: Transcoder<Option<String>, T> + 'static,
{
    let key = key.into();
    let codec: StoreCodec<T> = Arc::new(codec);
    let cell = StorageCell::new(store.clone(), key.clone(), codec.clone());
    let channel = PersistedChannel::with_shared_codec(registry, store, key, codec);
    StoredVar::new(Arc::new(cell), Arc::new(channel))
}

/// Variable over the raw text of `key`; `None` is a missing key.
pub fn raw(
    registry: &ChannelRegistry,
    store: Arc<dyn KeyValueStore>,
    key: impl Into<String>,
) -> StoredVar<Option<String>> {
    persisted(registry, store, key, TextCodec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, StorageBus};
    use statecast_core::strconv::bmap;
    use statecast_core::var::{Readable, Writable};
    use statecast_core::{ContextId, RegistryConfig};

    fn setup() -> (ChannelRegistry, Arc<dyn KeyValueStore>) {
        let bus = StorageBus::default();
        let context = ContextId::new();
        let storage = MemoryStorage::new("local", bus.clone());
        let config = RegistryConfig {
            auto_start: false,
            ..RegistryConfig::default()
        };
        let registry = ChannelRegistry::new(context, bus, config);
        (registry, Arc::new(storage.attach(context)))
    }

    #[test]
    fn test_write_absent_removes_key() {
        let (registry, store) = setup();
        let channel = PersistedChannel::new(&registry, store.clone(), "k", TextCodec);

        channel.write(Some("v".into())).unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));

        channel.write(None).unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_local_write_reaches_local_reader() {
        let (registry, store) = setup();
        let channel = PersistedChannel::new(&registry, store, "n", bmap::number());

        let read = channel.read();
        channel.write(Some(3.0)).unwrap();
        assert_eq!(read.now_or_never(), Some(Ok(Some(3.0))));
    }

    #[test]
    fn test_registry_write_is_decoded() {
        let (registry, store) = setup();
        let channel = PersistedChannel::new(&registry, store.clone(), "n", bmap::number());
        let lease = registry.listen(store.id(), "n");

        let read = channel.read();
        lease.channel().write(Some("12".into()));
        assert_eq!(read.now_or_never(), Some(Ok(Some(12.0))));
    }

    #[test]
    fn test_persisted_var_reads_store() {
        let (registry, store) = setup();
        let var = persisted(&registry, store.clone(), "flag", bmap::bool());

        assert_eq!(var.get().unwrap(), None);
        var.set(Some(true)).unwrap();
        assert_eq!(store.get("flag").unwrap().as_deref(), Some("true"));
        assert_eq!(var.get().unwrap(), Some(true));

        store.set("flag", "nonsense").unwrap();
        assert_eq!(var.get().unwrap(), None);

        let text = raw(&registry, store, "flag");
        assert_eq!(text.get().unwrap().as_deref(), Some("nonsense"));
    }
}
