//! Statecast Core - reactive state primitives
//!
//! Runtime-agnostic building blocks for a value that can be observed across
//! independent execution contexts and viewed through several representations.
//!
//! # Layers
//!
//! ## Notification
//! - [`BroadcastChannel`]: single-slot multicast; a write resolves every
//!   pending read and is lost if nobody is waiting
//! - [`Broadcast`]: read/write contract shared by every channel flavour
//! - [`reactive::transcode`]: typed view over a channel of raw values
//!
//! ## Mapping
//! - [`Reversible`]: forward/reverse function pair; `flip().flip()` is the
//!   original mapping
//! - [`Transcoder`]: fallible encode/decode pair
//! - [`strconv`]: text parsers/formatters and the `bmap` mappings built from
//!   them
//!
//! ## Variables
//! - [`Readable`]/[`Writable`]/[`Variable`]: the `get`/`set` contract
//! - [`StoredVar`]: a [`Cell`] for the current value plus a channel for
//!   changes; [`var::memory`] keeps it in process memory
//! - [`var::transform`], [`var::transpose`], [`var::chroot`],
//!   [`var::cast`]: derived variables
//!
//! ## Host boundary
//! - [`KeyValueStore`] and [`StorageEvent`]: what a backing store must offer
//!
//! Stateful, runtime-bound pieces (the channel registry, persisted channels,
//! in-memory host storage) live in `statecast-effects`.

#![forbid(unsafe_code)]

// === Core Modules ===

/// Unified error handling
pub mod errors;

/// Configuration loading and validation
pub mod config;

/// Broadcast channels and the transcoding combinator
pub mod reactive;

/// Fallible two-way codecs
pub mod codec;

/// Bidirectional mappings
pub mod reversible;

/// Text parse/format pairs
pub mod strconv;

/// Variables and projection operators
pub mod var;

/// Store boundary types
pub mod storage;

// === Public API Re-exports ===

pub use codec::{Flipped, JsonCodec, TextCodec, Transcoder};
pub use config::{RegistryConfig, StateConfig, StorageConfig};
pub use errors::{JsonKind, ParseError, Result, StateError, StoreError};
pub use reactive::{Broadcast, BroadcastChannel, Transcoded};
pub use reversible::Reversible;
pub use storage::{ContextId, KeyValueStore, StorageEvent, StoreId};
pub use var::{Annotations, Cell, MemoVar, MemoryCell, Readable, StoredVar, Variable, Writable};

/// Commonly used traits and constructors.
pub mod prelude {
    pub use crate::codec::Transcoder;
    pub use crate::reactive::{changes, Broadcast, BroadcastChannel};
    pub use crate::reversible::Reversible;
    pub use crate::strconv::bmap;
    pub use crate::var::{
        cast, chroot, local, memory, transform, transpose, Field, Readable, Variable, Writable,
    };
}
