//! BroadcastChannel<T> - single-slot multicast rendezvous
//!
//! A channel holds exactly one unresolved slot. `next()` joins the current
//! slot; `write()` resolves it for everyone who joined and installs a fresh
//! slot in the same critical section. Nothing is buffered: a write with no
//! pending readers is lost, and a reader that joins after a write waits for
//! the following one.
//!
//! # Leak note
//!
//! Reads cannot be cancelled. A read that is never followed by a write stays
//! pending forever, and so does a read whose channel is dropped before the
//! next write.

use crate::errors::Result;
use futures::channel::oneshot;
use futures::future::{BoxFuture, FutureExt, Shared};
use futures::stream::{self, BoxStream, StreamExt};
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Anything that can be written to and read from like a broadcast channel.
///
/// `read()` must join the underlying slot(s) when it is *called*, not when
/// the returned future is first polled, so that a write issued between the
/// two still reaches the reader.
pub trait Broadcast<T>: Send + Sync {
    /// Wait for the next value written after this call.
    fn read(&self) -> BoxFuture<'static, Result<T>>;

    /// Deliver `value` to every currently pending read.
    fn write(&self, value: T) -> Result<()>;
}

impl<T, B> Broadcast<T> for Arc<B>
where
    B: Broadcast<T> + ?Sized,
{
    fn read(&self) -> BoxFuture<'static, Result<T>> {
        (**self).read()
    }

    fn write(&self, value: T) -> Result<()> {
        (**self).write(value)
    }
}

/// Unbounded stream of values written after each poll.
///
/// Every call produces an independent stream; none of them replays past
/// values, and values written while the consumer is not waiting are missed.
pub fn changes<T, B>(channel: B) -> BoxStream<'static, Result<T>>
where
    T: Send + 'static,
    B: Broadcast<T> + 'static,
{
    stream::unfold(channel, |channel| async move {
        let value = channel.read().await;
        Some((value, channel))
    })
    .boxed()
}

struct Slot<T: Clone> {
    sender: oneshot::Sender<T>,
    receiver: Shared<oneshot::Receiver<T>>,
}

impl<T: Clone> Slot<T> {
    fn new() -> Self {
        let (sender, receiver) = oneshot::channel();
        Self {
            sender,
            receiver: receiver.shared(),
        }
    }

    /// Readers currently joined to this slot, excluding the slot itself.
    fn joined(&self) -> usize {
        self.receiver
            .strong_count()
            .map_or(0, |count| count.saturating_sub(1))
    }
}

/// A single-slot, replace-on-write multicast channel.
///
/// Cloning yields another handle to the same slot.
///
/// # Example
///
/// ```rust
/// use futures::FutureExt;
/// use statecast_core::reactive::BroadcastChannel;
///
/// let channel = BroadcastChannel::new();
/// let first = channel.next();
/// let second = channel.next();
///
/// channel.write("hello");
/// assert_eq!(first.now_or_never(), Some("hello"));
/// assert_eq!(second.now_or_never(), Some("hello"));
///
/// // Nobody was waiting for this one.
/// let late = channel.next();
/// assert_eq!(late.now_or_never(), None);
/// ```
pub struct BroadcastChannel<T: Clone> {
    slot: Arc<Mutex<Slot<T>>>,
}

impl<T> BroadcastChannel<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a channel with a fresh, unresolved slot.
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot::new())),
        }
    }

    /// Join the current slot.
    ///
    /// The returned future resolves with the value of the next `write`.
    pub fn next(&self) -> Next<T> {
        Next {
            inner: self.slot.lock().receiver.clone(),
        }
    }

    /// Resolve every pending read with `value` and install a fresh slot.
    pub fn write(&self, value: T) {
        let resolved = {
            let mut slot = self.slot.lock();
            std::mem::replace(&mut *slot, Slot::new())
        };
        let waiting = resolved.joined();
        tracing::trace!(waiting, "Broadcast write");
        // Fails only when nobody joined the slot; the value is dropped.
        let _ = resolved.sender.send(value);
    }

    /// Number of reads the next `write` would resolve.
    pub fn pending_reads(&self) -> usize {
        self.slot.lock().joined()
    }

    /// Stream of future values read from this channel.
    pub fn changes(&self) -> BoxStream<'static, T> {
        stream::unfold(self.clone(), |channel| async move {
            let value = channel.next().await;
            Some((value, channel))
        })
        .boxed()
    }
}

impl<T> Default for BroadcastChannel<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for BroadcastChannel<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
        }
    }
}

impl<T> fmt::Debug for BroadcastChannel<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BroadcastChannel")
            .field("pending_reads", &self.pending_reads())
            .finish()
    }
}

impl<T> Broadcast<T> for BroadcastChannel<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn read(&self) -> BoxFuture<'static, Result<T>> {
        self.next().map(Ok).boxed()
    }

    fn write(&self, value: T) -> Result<()> {
        BroadcastChannel::write(self, value);
        Ok(())
    }
}

/// A pending read on a [`BroadcastChannel`].
#[must_use = "a read does nothing unless awaited"]
pub struct Next<T: Clone> {
    inner: Shared<oneshot::Receiver<T>>,
}

impl<T: Clone> Future for Next<T> {
    type Output = T;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        match Pin::new(&mut self.inner).poll(cx) {
            Poll::Ready(Ok(value)) => Poll::Ready(value),
            // The channel was dropped before writing; this read can never
            // resolve.
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Pending,
            Poll::Pending => Poll::Pending,
        }
    }
}
