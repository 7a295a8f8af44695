//! Variables: values with `get`/`set`
//!
//! A variable is anything that can be read with [`Readable::get`] and
//! written with [`Writable::set`]. Variables compose: projection operators
//! ([`transform`], [`transpose`], [`chroot`], [`cast`]) derive narrower or
//! re-typed variables from a parent, and [`StoredVar`] adds change
//! notification on top of a [`Cell`].
//!
//! # Copy policy
//!
//! `get()` always hands out an owned value. Projections that write a part of
//! a structured value read an owned snapshot, change it, and write the whole
//! snapshot back, so a value obtained from `get()` never observes later
//! writes.

mod annotations;
mod cell;
mod local;
mod projection;
mod stored;

pub use annotations::Annotations;
pub use cell::{Cell, MemoryCell};
pub use local::{copy, local, preset, Copied, Local};
pub use projection::{
    cast, chroot, logged, transcode, transform, transpose, Cast, Chrooted, Field, Logged,
    TranscodedVar, Transformed, Transposed,
};
pub use stored::{memory, MemoVar, StoredVar};

use crate::errors::Result;
use std::sync::Arc;

/// Read side of a variable.
pub trait Readable<T>: Send + Sync {
    /// The current value.
    fn get(&self) -> Result<T>;

    /// Side metadata attached to this variable.
    fn annotations(&self) -> &Annotations;
}

/// Write side of a variable.
pub trait Writable<T>: Send + Sync {
    /// Replace the current value.
    fn set(&self, value: T) -> Result<()>;
}

/// A readable and writable value of one type.
pub trait Variable<T>: Readable<T> + Writable<T> {}

impl<T, V> Variable<T> for V where V: Readable<T> + Writable<T> + ?Sized {}

impl<T, V> Readable<T> for Arc<V>
where
    V: Readable<T> + ?Sized,
{
    fn get(&self) -> Result<T> {
        (**self).get()
    }

    fn annotations(&self) -> &Annotations {
        (**self).annotations()
    }
}

impl<T, V> Writable<T> for Arc<V>
where
    V: Writable<T> + ?Sized,
{
    fn set(&self, value: T) -> Result<()> {
        (**self).set(value)
    }
}
