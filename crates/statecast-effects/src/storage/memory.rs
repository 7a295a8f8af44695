//! In-memory storage area shared by several contexts

use super::StorageBus;
use parking_lot::RwLock;
use statecast_core::{ContextId, KeyValueStore, StorageConfig, StorageEvent, StoreError, StoreId};
use std::collections::HashMap;
use std::sync::Arc;

/// One storage area, like a browser origin's local storage.
///
/// Contexts obtain their own handle with [`attach`](Self::attach); changes
/// made through a handle are published on the bus tagged with that
/// handle's context.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    inner: Arc<StorageArea>,
}

#[derive(Debug)]
struct StorageArea {
    id: StoreId,
    data: RwLock<HashMap<String, String>>,
    bus: StorageBus,
    quota_bytes: Option<usize>,
}

impl MemoryStorage {
    /// Empty area publishing on `bus`, without a quota.
    pub fn new(id: impl Into<StoreId>, bus: StorageBus) -> Self {
        Self::with_quota(id, bus, None)
    }

    /// Empty area sized by `config`.
    pub fn from_config(id: impl Into<StoreId>, bus: StorageBus, config: &StorageConfig) -> Self {
        Self::with_quota(id, bus, config.quota_bytes)
    }

    /// Empty area that refuses writes growing it past `quota_bytes`.
    pub fn with_quota(id: impl Into<StoreId>, bus: StorageBus, quota_bytes: Option<usize>) -> Self {
        Self {
            inner: Arc::new(StorageArea {
                id: id.into(),
                data: RwLock::new(HashMap::new()),
                bus,
                quota_bytes,
            }),
        }
    }

    /// Area identity.
    pub fn id(&self) -> &StoreId {
        &self.inner.id
    }

    /// The bus changes are published on.
    pub fn bus(&self) -> &StorageBus {
        &self.inner.bus
    }

    /// A handle acting on behalf of `context`.
    pub fn attach(&self, context: ContextId) -> MemoryStore {
        MemoryStore {
            area: self.inner.clone(),
            context,
        }
    }

    /// Bytes currently used by keys and values.
    pub fn used_bytes(&self) -> usize {
        self.inner.data.read().iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.inner.data.read().len()
    }

    /// True when no keys are stored.
    pub fn is_empty(&self) -> bool {
        self.inner.data.read().is_empty()
    }
}

/// One context's handle on a [`MemoryStorage`] area.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    area: Arc<StorageArea>,
    context: ContextId,
}

impl MemoryStore {
    /// Context this handle writes as.
    pub fn context(&self) -> ContextId {
        self.context
    }

    fn announce(&self, key: &str, old_value: Option<String>, new_value: Option<String>) {
        if old_value == new_value {
            return;
        }
        let event = StorageEvent {
            store: self.area.id.clone(),
            key: key.to_string(),
            old_value,
            new_value,
            origin: self.context,
        };
        let receivers = self.area.bus.publish(event);
        tracing::trace!(store = %self.area.id, key, receivers, "Storage change published");
    }
}

impl KeyValueStore for MemoryStore {
    fn id(&self) -> &StoreId {
        &self.area.id
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.area.data.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey {
                reason: "key must not be empty".to_string(),
            });
        }

        let old_value = {
            let mut data = self.area.data.write();
            if let Some(limit) = self.area.quota_bytes {
                let used: usize = data
                    .iter()
                    .filter(|(k, _)| k.as_str() != key)
                    .map(|(k, v)| k.len() + v.len())
                    .sum();
                if used + key.len() + value.len() > limit {
                    return Err(StoreError::QuotaExceeded {
                        key: key.to_string(),
                        limit,
                    });
                }
            }
            data.insert(key.to_string(), value.to_string())
        };

        self.announce(key, old_value, Some(value.to_string()));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let old_value = self.area.data.write().remove(key);
        if old_value.is_some() {
            self.announce(key, old_value, None);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_handles_share_data() {
        let storage = MemoryStorage::new("local", StorageBus::default());
        let a = storage.attach(ContextId::new());
        let b = storage.attach(ContextId::new());

        a.set("k", "v").unwrap();
        assert_eq!(b.get("k").unwrap().as_deref(), Some("v"));

        b.remove("k").unwrap();
        assert_eq!(a.get("k").unwrap(), None);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_changes_are_published_with_origin() {
        let bus = StorageBus::default();
        let mut events = bus.subscribe();
        let storage = MemoryStorage::new("local", bus);
        let context = ContextId::new();
        let store = storage.attach(context);

        store.set("k", "1").unwrap();
        store.set("k", "1").unwrap();
        store.set("k", "2").unwrap();
        store.remove("k").unwrap();
        store.remove("k").unwrap();

        let first = events.try_recv().unwrap();
        assert_eq!(first.origin, context);
        assert_eq!((first.old_value, first.new_value), (None, Some("1".into())));

        let second = events.try_recv().unwrap();
        assert_eq!(second.old_value.as_deref(), Some("1"));
        assert_eq!(second.new_value.as_deref(), Some("2"));

        let third = events.try_recv().unwrap();
        assert_eq!(third.new_value, None);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_quota_and_key_validation() {
        let storage = MemoryStorage::with_quota("local", StorageBus::default(), Some(8));
        let store = storage.attach(ContextId::new());

        store.set("ab", "123456").unwrap();
        assert_eq!(storage.used_bytes(), 8);
        // Replacing counts only the new value.
        store.set("ab", "654321").unwrap();
        assert_matches!(store.set("c", "1"), Err(StoreError::QuotaExceeded { limit: 8, .. }));
        assert_matches!(store.set("", "x"), Err(StoreError::InvalidKey { .. }));
    }
}
