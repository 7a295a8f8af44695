//! Unified error system for statecast
//!
//! One error type for every layer above the codecs. Codec failures are
//! carried through unchanged; nothing in the channel or variable layers
//! retries or swallows them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Shape of a decoded JSON literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonKind {
    /// `null`
    Null,
    /// `true` / `false`
    Bool,
    /// Any JSON number
    Number,
    /// A JSON number with no fractional part that fits in `i64`
    Integer,
    /// A JSON string literal
    String,
    /// A JSON array
    List,
    /// A JSON object
    Object,
}

impl JsonKind {
    /// Classify a decoded JSON value.
    pub fn of(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(_) => Self::Bool,
            serde_json::Value::Number(_) => Self::Number,
            serde_json::Value::String(_) => Self::String,
            serde_json::Value::Array(_) => Self::List,
            serde_json::Value::Object(_) => Self::Object,
        }
    }
}

impl fmt::Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Bool => "boolean",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::String => "string",
            Self::List => "list",
            Self::Object => "object",
        };
        f.write_str(name)
    }
}

/// Failure to turn text into a typed value.
///
/// The two kinds are deliberately distinct: a malformed literal is a
/// `Syntax` failure, a well-formed literal of the wrong kind is a
/// `ShapeMismatch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ParseError {
    /// The input is not a valid JSON literal
    #[error("Syntax error: {message}")]
    Syntax {
        /// Message reported by the JSON parser
        message: String,
    },

    /// The input parsed, but to the wrong kind of value
    #[error("Shape mismatch: expected {expected}, found {found}")]
    ShapeMismatch {
        /// Kind the caller asked for
        expected: JsonKind,
        /// Kind the literal actually decoded to
        found: JsonKind,
    },
}

impl ParseError {
    /// Create a syntax error
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax {
            message: message.into(),
        }
    }

    /// Create a shape mismatch error
    pub fn shape_mismatch(expected: JsonKind, found: JsonKind) -> Self {
        Self::ShapeMismatch { expected, found }
    }

    /// True for malformed literals.
    pub fn is_syntax(&self) -> bool {
        matches!(self, Self::Syntax { .. })
    }

    /// True for well-formed literals of the wrong kind.
    pub fn is_shape_mismatch(&self) -> bool {
        matches!(self, Self::ShapeMismatch { .. })
    }
}

/// Errors raised by a key-value store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum StoreError {
    /// The key cannot be stored
    #[error("Invalid key: {reason}")]
    InvalidKey {
        /// Why the key was rejected
        reason: String,
    },

    /// Reading from the backing store failed
    #[error("Read failed: {0}")]
    ReadFailed(String),

    /// Writing to the backing store failed
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// The write would exceed the store's quota
    #[error("Quota exceeded writing {key}: limit is {limit} bytes")]
    QuotaExceeded {
        /// Key being written
        key: String,
        /// Configured limit in bytes
        limit: usize,
    },
}

/// Unified error type for statecast operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum StateError {
    /// A strconv parser rejected its input
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// A transcoder failed to encode or decode
    #[error("Codec error: {message}")]
    Codec {
        /// Error message reported by the codec
        message: String,
    },

    /// The backing store failed
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// Invalid input or configuration
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },
}

impl StateError {
    /// Create a codec error
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for StateError {
    fn from(err: serde_json::Error) -> Self {
        Self::codec(err.to_string())
    }
}

/// Standard Result type for statecast operations
pub type Result<T> = std::result::Result<T, StateError>;
