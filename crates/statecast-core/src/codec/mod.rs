//! Two-way codecs between a raw representation and a typed value
//!
//! A [`Transcoder<Raw, Value>`] encodes values into their raw form and
//! decodes raw data back. Codecs are fallible; their errors are returned to
//! the caller of whatever `get`/`set`/`read`/`write` invoked them.

mod json;

pub use json::{JsonCodec, TextCodec};

use crate::errors::Result;
use crate::reversible::Reversible;
use std::sync::Arc;

/// Encode/decode pair between `Raw` and `Value`.
pub trait Transcoder<Raw, Value>: Send + Sync {
    /// Turn a value into its raw representation.
    fn encode(&self, value: Value) -> Result<Raw>;

    /// Turn raw data into a value.
    fn decode(&self, raw: Raw) -> Result<Value>;
}

impl<Raw, Value, C> Transcoder<Raw, Value> for Arc<C>
where
    C: Transcoder<Raw, Value> + ?Sized,
{
    fn encode(&self, value: Value) -> Result<Raw> {
        (**self).encode(value)
    }

    fn decode(&self, raw: Raw) -> Result<Value> {
        (**self).decode(raw)
    }
}

/// A reversible mapping is an infallible codec: forward decodes, reverse
/// encodes.
impl<Raw, Value> Transcoder<Raw, Value> for Reversible<Raw, Value>
where
    Raw: 'static,
    Value: 'static,
{
    fn encode(&self, value: Value) -> Result<Raw> {
        Ok(self.apply(value))
    }

    fn decode(&self, raw: Raw) -> Result<Value> {
        Ok(self.call(raw))
    }
}

/// Codec with encode and decode swapped.
#[derive(Debug, Clone)]
pub struct Flipped<C>(pub C);

impl<Raw, Value, C> Transcoder<Value, Raw> for Flipped<C>
where
    C: Transcoder<Raw, Value>,
{
    fn encode(&self, raw: Raw) -> Result<Value> {
        self.0.decode(raw)
    }

    fn decode(&self, value: Value) -> Result<Raw> {
        self.0.encode(value)
    }
}

/// Swap a codec's directions.
pub fn flip<C>(codec: C) -> Flipped<C> {
    Flipped(codec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strconv::bmap;

    #[test]
    fn test_reversible_is_a_codec() {
        let codec = bmap::number();
        assert_eq!(codec.decode(Some("64".into())).unwrap(), Some(64.0));
        assert_eq!(codec.encode(Some(2.5)).unwrap().as_deref(), Some("2.5"));
    }

    #[test]
    fn test_flipped_swaps_directions() {
        let codec = flip(bmap::bool());
        assert_eq!(codec.encode(Some("true".into())).unwrap(), Some(true));
        assert_eq!(codec.decode(Some(false)).unwrap().as_deref(), Some("false"));
    }
}
