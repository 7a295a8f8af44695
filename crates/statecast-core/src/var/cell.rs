//! Cells: the synchronous value cache behind a stored variable

use crate::errors::Result;
use parking_lot::RwLock;
use std::fmt;

/// Synchronous storage for a variable's current value.
///
/// `get` never waits on a channel. A cell that cannot be written keeps the
/// default `set`, which accepts and ignores the value.
pub trait Cell<T>: Send + Sync {
    /// The current value.
    fn get(&self) -> Result<T>;

    /// Store a new value.
    fn set(&self, _value: T) -> Result<()> {
        Ok(())
    }
}

/// Cell holding its value in process memory.
pub struct MemoryCell<T> {
    value: RwLock<T>,
}

impl<T> MemoryCell<T> {
    /// Cell starting at `initial`.
    pub fn new(initial: T) -> Self {
        Self {
            value: RwLock::new(initial),
        }
    }
}

impl<T> Cell<T> for MemoryCell<T>
where
    T: Clone + Send + Sync,
{
    fn get(&self) -> Result<T> {
        Ok(self.value.read().clone())
    }

    fn set(&self, value: T) -> Result<()> {
        *self.value.write() = value;
        Ok(())
    }
}

impl<T: fmt::Debug> fmt::Debug for MemoryCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCell")
            .field("value", &*self.value.read())
            .finish()
    }
}
