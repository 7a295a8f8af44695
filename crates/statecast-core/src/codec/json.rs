//! Text codecs over optional stored strings

use super::Transcoder;
use crate::errors::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;

/// Serde JSON codec between stored text and `T`.
///
/// Absence passes through untouched in both directions, so an absent key
/// decodes to `None` and `None` encodes to a deletion.
pub struct JsonCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    /// Create a JSON codec
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonCodec")
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> Transcoder<Option<String>, Option<T>> for JsonCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: Option<T>) -> Result<Option<String>> {
        value
            .map(|value| serde_json::to_string(&value))
            .transpose()
            .map_err(Into::into)
    }

    fn decode(&self, raw: Option<String>) -> Result<Option<T>> {
        raw.map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(Into::into)
    }
}

/// Identity codec for raw stored text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl Transcoder<Option<String>, Option<String>> for TextCodec {
    fn encode(&self, value: Option<String>) -> Result<Option<String>> {
        Ok(value)
    }

    fn decode(&self, raw: Option<String>) -> Result<Option<String>> {
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StateError;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Session {
        user: String,
        expires: u64,
    }

    #[test]
    fn test_json_codec_roundtrip() {
        let codec = JsonCodec::<Session>::new();
        let session = Session {
            user: "ada".into(),
            expires: 60,
        };

        let raw = codec.encode(Some(session.clone())).unwrap();
        assert_eq!(raw.as_deref(), Some(r#"{"user":"ada","expires":60}"#));
        assert_eq!(codec.decode(raw).unwrap(), Some(session));
    }

    #[test]
    fn test_json_codec_absence_passes_through() {
        let codec = JsonCodec::<Session>::new();
        assert_eq!(codec.encode(None).unwrap(), None);
        assert_eq!(codec.decode(None).unwrap(), None);
    }

    #[test]
    fn test_json_codec_reports_decode_failure() {
        let codec = JsonCodec::<Session>::new();
        let result = codec.decode(Some("{not json".into()));
        assert!(matches!(result, Err(StateError::Codec { .. })));
    }
}
