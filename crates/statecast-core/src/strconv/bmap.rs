//! Two-way mappings between optional text and typed values
//!
//! Each builder returns a [`Reversible<Option<String>, Option<T>>`]:
//! - forward parses; a failure is handed to the recovery handler (by default
//!   it becomes `None`) instead of propagating
//! - reverse formats
//! - `None` short-circuits to `None` in both directions without touching the
//!   parser or formatter
//!
//! ```rust
//! use statecast_core::strconv::bmap;
//!
//! let n = bmap::number();
//! assert_eq!(n.call(Some("64".into())), Some(64.0));
//! assert_eq!(n.call(None), None);
//! assert_eq!(n.call(Some("abc".into())), None);
//!
//! let zero = bmap::number_with(|_| Some(0.0));
//! assert_eq!(zero.call(Some("abc".into())), Some(0.0));
//! ```

use super::{format, parse};
use crate::errors::ParseError;
use crate::reversible::Reversible;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Mapping produced by the builders in this module.
pub type Bmap<T> = Reversible<Option<String>, Option<T>>;

/// Recovery policy applied when the forward direction fails to parse.
pub type OnError<T> = Arc<dyn Fn(ParseError) -> Option<T> + Send + Sync>;

/// The default recovery: treat unparseable text as absent.
pub fn absent<T>() -> OnError<T> {
    Arc::new(|_| None)
}

fn prepare<T, P, F>(parse: P, format: F, on_error: OnError<T>) -> Bmap<T>
where
    T: 'static,
    P: Fn(&str) -> parse::Parsed<T> + Send + Sync + 'static,
    F: Fn(T) -> String + Send + Sync + 'static,
{
    Reversible::make(
        move |raw: Option<String>| {
            let raw = raw?;
            match parse(raw.as_str()) {
                Ok(value) => Some(value),
                Err(err) => {
                    tracing::debug!(error = %err, "Recovering from unparseable value");
                    on_error(err)
                }
            }
        },
        move |value: Option<T>| value.map(&format),
    )
}

/// Text ↔ boolean.
pub fn bool() -> Bmap<bool> {
    bool_with(|_| None)
}

/// Text ↔ boolean with a custom recovery.
pub fn bool_with<H>(on_error: H) -> Bmap<bool>
where
    H: Fn(ParseError) -> Option<bool> + Send + Sync + 'static,
{
    prepare(parse::bool, format::bool, Arc::new(on_error))
}

/// Text ↔ number.
pub fn number() -> Bmap<f64> {
    number_with(|_| None)
}

/// Text ↔ number with a custom recovery.
pub fn number_with<H>(on_error: H) -> Bmap<f64>
where
    H: Fn(ParseError) -> Option<f64> + Send + Sync + 'static,
{
    prepare(parse::number, format::number, Arc::new(on_error))
}

/// Text ↔ integer.
pub fn integer() -> Bmap<i64> {
    integer_with(|_| None)
}

/// Text ↔ integer with a custom recovery.
pub fn integer_with<H>(on_error: H) -> Bmap<i64>
where
    H: Fn(ParseError) -> Option<i64> + Send + Sync + 'static,
{
    prepare(parse::integer, format::integer, Arc::new(on_error))
}

/// Text ↔ list.
pub fn list() -> Bmap<Vec<Value>> {
    list_with(|_| None)
}

/// Text ↔ list with a custom recovery.
pub fn list_with<H>(on_error: H) -> Bmap<Vec<Value>>
where
    H: Fn(ParseError) -> Option<Vec<Value>> + Send + Sync + 'static,
{
    prepare(parse::list, |v: Vec<Value>| format::list(&v), Arc::new(on_error))
}

/// Text ↔ object.
pub fn json_object() -> Bmap<Map<String, Value>> {
    json_object_with(|_| None)
}

/// Text ↔ object with a custom recovery.
pub fn json_object_with<H>(on_error: H) -> Bmap<Map<String, Value>>
where
    H: Fn(ParseError) -> Option<Map<String, Value>> + Send + Sync + 'static,
{
    prepare(
        parse::json_object,
        |v: Map<String, Value>| format::json_object(&v),
        Arc::new(on_error),
    )
}

/// Text ↔ any JSON value.
pub fn json_value() -> Bmap<Value> {
    json_value_with(|_| None)
}

/// Text ↔ any JSON value with a custom recovery.
pub fn json_value_with<H>(on_error: H) -> Bmap<Value>
where
    H: Fn(ParseError) -> Option<Value> + Send + Sync + 'static,
{
    prepare(
        parse::json_value,
        |v: Value| format::json_value(&v),
        Arc::new(on_error),
    )
}

/// Build a mapping for a custom parser/formatter pair.
pub fn custom<T, P, F>(parse: P, format: F, on_error: OnError<T>) -> Bmap<T>
where
    T: 'static,
    P: Fn(&str) -> parse::Parsed<T> + Send + Sync + 'static,
    F: Fn(T) -> String + Send + Sync + 'static,
{
    prepare(parse, format, on_error)
}
