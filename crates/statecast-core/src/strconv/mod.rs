//! String conversions for stored values
//!
//! - [`parse`]: text → value, reporting syntax and shape failures separately
//! - [`format`]: value → text
//! - [`bmap`]: both directions bound into a [`crate::reversible::Reversible`]
//!   with a pluggable recovery policy

pub mod bmap;
pub mod format;
pub mod parse;

pub use parse::Parsed;
