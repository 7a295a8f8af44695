//! Side metadata carried by variables

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// String metadata attached to a variable.
///
/// Clones share the same map. Derived variables receive a [`detached`]
/// copy, so later edits on either side stay local.
///
/// [`detached`]: Annotations::detached
#[derive(Clone, Default)]
pub struct Annotations {
    entries: Arc<RwLock<BTreeMap<String, String>>>,
}

impl Annotations {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Look up one entry.
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    /// Set one entry, returning the previous value.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.write().insert(key.into(), value.into())
    }

    /// Remove one entry.
    pub fn remove(&self, key: &str) -> Option<String> {
        self.entries.write().remove(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True when no entries are set.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// An independent copy of the current entries.
    pub fn detached(&self) -> Self {
        Self {
            entries: Arc::new(RwLock::new(self.entries.read().clone())),
        }
    }
}

impl fmt::Debug for Annotations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.read().iter()).finish()
    }
}
