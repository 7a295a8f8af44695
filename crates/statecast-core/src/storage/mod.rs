//! Store boundary
//!
//! The host key-value store is an external collaborator. This crate only
//! needs `get`/`set`/`remove` on text values plus a feed of
//! [`StorageEvent`]s describing changes made by *other* contexts. Concrete
//! stores live in `statecast-effects`.
//!
//! Values are UTF-8 text. Absence is a missing key, never an empty string.

use crate::errors::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of one storage area.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StoreId(String);

impl StoreId {
    /// Name a storage area.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The area's name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StoreId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Identity of one execution context (a window, a tab, a process).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContextId(Uuid);

impl ContextId {
    /// A fresh random context identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "context-{}", self.0)
    }
}

/// One change to a store, as announced to listening contexts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEvent {
    /// Area the change happened in
    pub store: StoreId,
    /// Changed key
    pub key: String,
    /// Value before the change
    pub old_value: Option<String>,
    /// Value after the change; `None` when the key was removed
    pub new_value: Option<String>,
    /// Context that made the change
    pub origin: ContextId,
}

/// Synchronous text key-value store seen from one context.
pub trait KeyValueStore: Send + Sync {
    /// Area this handle writes to.
    fn id(&self) -> &StoreId;

    /// Current value of `key`.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete `key`. Removing a missing key succeeds.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

impl<S> KeyValueStore for std::sync::Arc<S>
where
    S: KeyValueStore + ?Sized,
{
    fn id(&self) -> &StoreId {
        (**self).id()
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}
