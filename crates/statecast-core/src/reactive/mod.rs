//! Reactive primitives
//!
//! - [`BroadcastChannel`]: single-slot multicast, the building block of
//!   every change notification in this crate
//! - [`Broadcast`]: the read/write contract shared by plain, transcoded and
//!   persisted channels
//! - [`Transcoded`]: a typed view over a raw channel

pub mod channel;
pub mod transcode;

pub use channel::{changes, Broadcast, BroadcastChannel, Next};
pub use transcode::{transcode, Transcoded};
