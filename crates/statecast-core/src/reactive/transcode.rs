//! Transcoding combinator: a typed view over a channel of raw values

use super::channel::Broadcast;
use crate::codec::Transcoder;
use crate::errors::Result;
use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A `Broadcast<T>` that decodes reads and encodes writes of a
/// `Broadcast<A>`.
///
/// Holds no buffer of its own; every read and write goes straight to the
/// parent channel.
pub struct Transcoded<B, A, C> {
    parent: B,
    codec: Arc<C>,
    _raw: PhantomData<fn() -> A>,
}

impl<B, A, C> Transcoded<B, A, C> {
    /// Wrap `parent` with `codec`.
    pub fn new(parent: B, codec: C) -> Self {
        Self {
            parent,
            codec: Arc::new(codec),
            _raw: PhantomData,
        }
    }

    /// The wrapped channel.
    pub fn parent(&self) -> &B {
        &self.parent
    }
}

impl<B: Clone, A, C> Clone for Transcoded<B, A, C> {
    fn clone(&self) -> Self {
        Self {
            parent: self.parent.clone(),
            codec: self.codec.clone(),
            _raw: PhantomData,
        }
    }
}

impl<B, A, C> fmt::Debug for Transcoded<B, A, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transcoded")
            .field("raw", &std::any::type_name::<A>())
            .finish_non_exhaustive()
    }
}

impl<B, A, T, C> Broadcast<T> for Transcoded<B, A, C>
where
    B: Broadcast<A>,
    A: Send + 'static,
    T: Send + 'static,
    C: Transcoder<A, T> + 'static,
{
    fn read(&self) -> BoxFuture<'static, Result<T>> {
        // Join the parent now, decode later.
        let raw = self.parent.read();
        let codec = self.codec.clone();
        async move { codec.decode(raw.await?) }.boxed()
    }

    fn write(&self, value: T) -> Result<()> {
        let raw = self.codec.encode(value)?;
        self.parent.write(raw)
    }
}

/// Expose `parent` as a channel of values decoded by `codec`.
pub fn transcode<B, A, C>(parent: B, codec: C) -> Transcoded<B, A, C> {
    Transcoded::new(parent, codec)
}
