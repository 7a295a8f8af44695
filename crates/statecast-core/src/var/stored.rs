//! Stored variables: a cell for the current value plus a channel for changes

use super::cell::{Cell, MemoryCell};
use super::{Annotations, Readable, Writable};
use crate::errors::Result;
use crate::reactive::{changes, Broadcast, BroadcastChannel};
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use std::fmt;
use std::sync::Arc;

/// A variable whose value lives in a [`Cell`] and whose changes are
/// announced on a [`Broadcast`] channel.
///
/// `set` writes the cell before it broadcasts, so a listener woken by the
/// broadcast that calls `get` observes the new value.
pub struct StoredVar<T> {
    cell: Arc<dyn Cell<T>>,
    channel: Arc<dyn Broadcast<T>>,
    annotations: Annotations,
}

impl<T> StoredVar<T>
where
    T: Clone + Send + 'static,
{
    /// Combine a cell with the channel its changes are announced on.
    pub fn new(cell: Arc<dyn Cell<T>>, channel: Arc<dyn Broadcast<T>>) -> Self {
        Self {
            cell,
            channel,
            annotations: Annotations::new(),
        }
    }

    /// Replace the annotations.
    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }

    /// Wait for the next value set after this call.
    pub fn next(&self) -> BoxFuture<'static, Result<T>> {
        self.channel.read()
    }

    /// Values set from now on. Never yields the current value.
    pub fn changes(&self) -> BoxStream<'static, Result<T>> {
        changes(self.channel.clone())
    }

    /// The change channel.
    pub fn channel(&self) -> Arc<dyn Broadcast<T>> {
        self.channel.clone()
    }
}

impl<T> Readable<T> for StoredVar<T>
where
    T: Clone + Send + 'static,
{
    fn get(&self) -> Result<T> {
        self.cell.get()
    }

    fn annotations(&self) -> &Annotations {
        &self.annotations
    }
}

impl<T> Writable<T> for StoredVar<T>
where
    T: Clone + Send + 'static,
{
    fn set(&self, value: T) -> Result<()> {
        self.cell.set(value.clone())?;
        self.channel.write(value)
    }
}

impl<T> Clone for StoredVar<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            channel: self.channel.clone(),
            annotations: self.annotations.clone(),
        }
    }
}

impl<T> fmt::Debug for StoredVar<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredVar")
            .field("type", &std::any::type_name::<T>())
            .field("annotations", &self.annotations)
            .finish_non_exhaustive()
    }
}

/// A variable held in process memory.
pub fn memory<T>(initial: T) -> StoredVar<T>
where
    T: Clone + Send + Sync + 'static,
{
    StoredVar::new(
        Arc::new(MemoryCell::new(initial)),
        Arc::new(BroadcastChannel::new()),
    )
}

/// Memory variable for ephemeral derived state.
///
/// Behaves like [`memory`]; the channel can be supplied so several memos
/// announce on one channel.
#[derive(Clone, Debug)]
pub struct MemoVar<T> {
    inner: StoredVar<T>,
}

impl<T> MemoVar<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Memo starting at `initial` with a private channel.
    pub fn new(initial: T) -> Self {
        Self {
            inner: memory(initial),
        }
    }

    /// Memo starting at `initial` that announces on `channel`.
    pub fn with_channel(initial: T, channel: Arc<dyn Broadcast<T>>) -> Self {
        Self {
            inner: StoredVar::new(Arc::new(MemoryCell::new(initial)), channel),
        }
    }

    /// See [`StoredVar::next`].
    pub fn next(&self) -> BoxFuture<'static, Result<T>> {
        self.inner.next()
    }

    /// See [`StoredVar::changes`].
    pub fn changes(&self) -> BoxStream<'static, Result<T>> {
        self.inner.changes()
    }
}

impl<T> Readable<T> for MemoVar<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn get(&self) -> Result<T> {
        self.inner.get()
    }

    fn annotations(&self) -> &Annotations {
        self.inner.annotations()
    }
}

impl<T> Writable<T> for MemoVar<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn set(&self, value: T) -> Result<()> {
        self.inner.set(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{FutureExt, StreamExt};

    #[test]
    fn test_set_updates_cell_then_broadcasts() {
        let var = memory(0u32);
        let next = var.next();

        var.set(42).unwrap();
        assert_eq!(var.get().unwrap(), 42);
        assert_eq!(next.now_or_never(), Some(Ok(42)));
    }

    #[test]
    fn test_changes_skip_current_value() {
        let var = memory("a".to_string());
        let mut changes = var.changes();

        assert!(changes.next().now_or_never().is_none());
    }

    #[tokio::test]
    async fn test_listener_sees_new_value_in_cell() {
        let var = memory(1i32);
        let observer = var.clone();
        let next = observer.next();
        let listener = tokio::spawn(async move {
            let seen = next.await.unwrap();
            (seen, observer.get().unwrap())
        });

        var.set(2).unwrap();
        assert_eq!(listener.await.unwrap(), (2, 2));
    }

    #[test]
    fn test_memo_shares_supplied_channel() {
        let channel: Arc<dyn Broadcast<u8>> = Arc::new(BroadcastChannel::new());
        let a = MemoVar::with_channel(0, channel.clone());
        let b = MemoVar::with_channel(0, channel);

        let read = b.next();
        a.set(3).unwrap();
        assert_eq!(read.now_or_never(), Some(Ok(3)));
        assert_eq!(b.get().unwrap(), 0);
    }
}
