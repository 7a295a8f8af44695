//! Projection operators: variables derived from a parent variable
//!
//! | operator      | reads                         | writes                              |
//! |---------------|-------------------------------|-------------------------------------|
//! | [`transform`] | mapping forward of parent     | mapping reverse, then parent        |
//! | [`transpose`] | nested variable over snapshot | nested set on snapshot, then parent |
//! | [`chroot`]    | one field of parent           | field patched into a parent copy    |
//! | [`cast`]      | one-way function of parent    | parent's own setter, unchanged      |
//!
//! Every derived variable starts with a detached copy of its parent's
//! [`Annotations`].

use super::local::Local;
use super::{Annotations, Readable, Writable};
use crate::codec::Transcoder;
use crate::errors::{JsonKind, ParseError, Result, StateError};
use crate::reversible::Reversible;
use serde_json::{Map, Value};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

// =============================================================================
// transform
// =============================================================================

/// Variable seen through a [`Reversible`] mapping.
pub struct Transformed<V, P, C> {
    parent: V,
    mapping: Reversible<P, C>,
    annotations: Annotations,
}

impl<V, P, C> Readable<C> for Transformed<V, P, C>
where
    V: Readable<P>,
    P: 'static,
    C: 'static,
{
    fn get(&self) -> Result<C> {
        Ok(self.mapping.call(self.parent.get()?))
    }

    fn annotations(&self) -> &Annotations {
        &self.annotations
    }
}

impl<V, P, C> Writable<C> for Transformed<V, P, C>
where
    V: Writable<P>,
    P: 'static,
    C: 'static,
{
    fn set(&self, value: C) -> Result<()> {
        self.parent.set(self.mapping.apply(value))
    }
}

impl<V, P, C> fmt::Debug for Transformed<V, P, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformed")
            .field("mapping", &self.mapping)
            .field("annotations", &self.annotations)
            .finish_non_exhaustive()
    }
}

/// Derive a variable whose value is `mapping` applied to `parent`.
pub fn transform<V, P, C>(parent: V, mapping: Reversible<P, C>) -> Transformed<V, P, C>
where
    V: Readable<P>,
{
    let annotations = parent.annotations().detached();
    Transformed {
        parent,
        mapping,
        annotations,
    }
}

// =============================================================================
// transpose
// =============================================================================

/// Variable reached through a nested variable built over a snapshot of the
/// parent's value.
pub struct Transposed<V, P, N, F> {
    parent: V,
    project: F,
    annotations: Annotations,
    _types: PhantomData<fn() -> (P, N)>,
}

impl<V, P, N, F> Transposed<V, P, N, F>
where
    V: Readable<P>,
    F: Fn(Local<P>) -> N,
{
    fn snapshot(&self) -> Result<Local<P>> {
        Ok(Local::new(self.parent.get()?))
    }
}

impl<V, P, N, F, X> Readable<X> for Transposed<V, P, N, F>
where
    V: Readable<P>,
    N: Readable<X>,
    F: Fn(Local<P>) -> N + Send + Sync,
{
    fn get(&self) -> Result<X> {
        (self.project)(self.snapshot()?).get()
    }

    fn annotations(&self) -> &Annotations {
        &self.annotations
    }
}

impl<V, P, N, F, X> Writable<X> for Transposed<V, P, N, F>
where
    V: Readable<P> + Writable<P>,
    P: Clone,
    N: Writable<X>,
    F: Fn(Local<P>) -> N + Send + Sync,
{
    fn set(&self, value: X) -> Result<()> {
        let snapshot = self.snapshot()?;
        let nested = (self.project)(snapshot.clone());
        nested.set(value)?;
        drop(nested);
        self.parent.set(snapshot.into_inner())
    }
}

impl<V, P, N, F> fmt::Debug for Transposed<V, P, N, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transposed")
            .field("annotations", &self.annotations)
            .finish_non_exhaustive()
    }
}

/// Derive a variable through `project`, which builds a nested variable over
/// a private copy of the parent's value.
///
/// `set` writes into a fresh snapshot through the nested variable and then
/// replaces the parent's value with the whole snapshot.
pub fn transpose<V, P, N, F>(parent: V, project: F) -> Transposed<V, P, N, F>
where
    V: Readable<P>,
    F: Fn(Local<P>) -> N,
{
    let annotations = parent.annotations().detached();
    Transposed {
        parent,
        project,
        annotations,
        _types: PhantomData,
    }
}

// =============================================================================
// chroot
// =============================================================================

type FieldGet<S, F> = Arc<dyn Fn(&S) -> Result<F> + Send + Sync>;
type FieldSet<S, F> = Arc<dyn Fn(&mut S, F) -> Result<()> + Send + Sync>;

/// Lens onto one field of a structured value.
pub struct Field<S, F> {
    name: String,
    get: FieldGet<S, F>,
    set: FieldSet<S, F>,
}

impl<S: 'static, F: 'static> Field<S, F> {
    /// Lens from infallible accessors, for typed structs.
    pub fn new<G, W>(name: impl Into<String>, get: G, set: W) -> Self
    where
        G: Fn(&S) -> F + Send + Sync + 'static,
        W: Fn(&mut S, F) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            get: Arc::new(move |s: &S| Ok(get(s))),
            set: Arc::new(move |s: &mut S, f: F| {
                set(s, f);
                Ok(())
            }),
        }
    }

    /// Lens from fallible accessors.
    pub fn try_new<G, W>(name: impl Into<String>, get: G, set: W) -> Self
    where
        G: Fn(&S) -> Result<F> + Send + Sync + 'static,
        W: Fn(&mut S, F) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            get: Arc::new(get),
            set: Arc::new(set),
        }
    }

    /// Field name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Field<Value, Value> {
    /// Lens onto a member of a JSON object.
    ///
    /// Reading a missing member, or any member of `null`, yields `null`.
    /// Writing into `null` first turns it into an empty object. Any other
    /// non-object parent is a shape mismatch.
    pub fn json(name: impl Into<String>) -> Self {
        let name = name.into();
        let key = name.clone();
        let read_key = name.clone();
        Self::try_new(
            name,
            move |value: &Value| match value {
                Value::Object(members) => {
                    Ok(members.get(&read_key).cloned().unwrap_or(Value::Null))
                }
                Value::Null => Ok(Value::Null),
                other => Err(not_an_object(other)),
            },
            move |value: &mut Value, member: Value| {
                if value.is_null() {
                    *value = Value::Object(Map::new());
                }
                match value {
                    Value::Object(members) => {
                        members.insert(key.clone(), member);
                        Ok(())
                    }
                    other => Err(not_an_object(other)),
                }
            },
        )
    }
}

fn not_an_object(value: &Value) -> StateError {
    ParseError::shape_mismatch(JsonKind::Object, JsonKind::of(value)).into()
}

impl<S, F> Clone for Field<S, F> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            get: self.get.clone(),
            set: self.set.clone(),
        }
    }
}

impl<S, F> fmt::Debug for Field<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field").field("name", &self.name).finish()
    }
}

/// Variable narrowed to one field of its parent's value.
pub struct Chrooted<V, S, F> {
    parent: V,
    field: Field<S, F>,
    annotations: Annotations,
}

impl<V, S, F> Readable<F> for Chrooted<V, S, F>
where
    V: Readable<S>,
{
    fn get(&self) -> Result<F> {
        (self.field.get)(&self.parent.get()?)
    }

    fn annotations(&self) -> &Annotations {
        &self.annotations
    }
}

impl<V, S, F> Writable<F> for Chrooted<V, S, F>
where
    V: Readable<S> + Writable<S>,
{
    fn set(&self, value: F) -> Result<()> {
        let mut whole = self.parent.get()?;
        (self.field.set)(&mut whole, value)?;
        self.parent.set(whole)
    }
}

impl<V, S, F> fmt::Debug for Chrooted<V, S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chrooted")
            .field("field", &self.field)
            .field("annotations", &self.annotations)
            .finish_non_exhaustive()
    }
}

/// Narrow `parent` to `field`.
pub fn chroot<V, S, F>(parent: V, field: Field<S, F>) -> Chrooted<V, S, F>
where
    V: Readable<S>,
{
    let annotations = parent.annotations().detached();
    Chrooted {
        parent,
        field,
        annotations,
    }
}

// =============================================================================
// cast
// =============================================================================

/// Read-side reinterpretation of a variable.
///
/// Reads are `C`; writes still take the parent's `P` and go to the parent
/// untouched. Nothing relates the two, so `set(x)` followed by `get()` may
/// not give back anything resembling `x`.
pub struct Cast<V, P, C> {
    parent: V,
    view: Arc<dyn Fn(P) -> C + Send + Sync>,
    annotations: Annotations,
}

impl<V, P, C> Readable<C> for Cast<V, P, C>
where
    V: Readable<P>,
{
    fn get(&self) -> Result<C> {
        Ok((self.view)(self.parent.get()?))
    }

    fn annotations(&self) -> &Annotations {
        &self.annotations
    }
}

impl<V, P, C> Writable<P> for Cast<V, P, C>
where
    V: Writable<P>,
{
    fn set(&self, value: P) -> Result<()> {
        self.parent.set(value)
    }
}

impl<V, P, C> fmt::Debug for Cast<V, P, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cast")
            .field("to", &std::any::type_name::<C>())
            .field("annotations", &self.annotations)
            .finish_non_exhaustive()
    }
}

/// Reinterpret reads of `parent` through `view`; writes pass through.
pub fn cast<V, P, C, G>(parent: V, view: G) -> Cast<V, P, C>
where
    V: Readable<P>,
    G: Fn(P) -> C + Send + Sync + 'static,
{
    let annotations = parent.annotations().detached();
    Cast {
        parent,
        view: Arc::new(view),
        annotations,
    }
}

// =============================================================================
// transcode
// =============================================================================

/// Variable seen through a fallible [`Transcoder`].
pub struct TranscodedVar<V, A, C> {
    parent: V,
    codec: C,
    annotations: Annotations,
    _raw: PhantomData<fn() -> A>,
}

impl<V, A, T, C> Readable<T> for TranscodedVar<V, A, C>
where
    V: Readable<A>,
    C: Transcoder<A, T>,
{
    fn get(&self) -> Result<T> {
        self.codec.decode(self.parent.get()?)
    }

    fn annotations(&self) -> &Annotations {
        &self.annotations
    }
}

impl<V, A, T, C> Writable<T> for TranscodedVar<V, A, C>
where
    V: Writable<A>,
    C: Transcoder<A, T>,
{
    fn set(&self, value: T) -> Result<()> {
        self.parent.set(self.codec.encode(value)?)
    }
}

impl<V, A, C> fmt::Debug for TranscodedVar<V, A, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranscodedVar")
            .field("raw", &std::any::type_name::<A>())
            .field("annotations", &self.annotations)
            .finish_non_exhaustive()
    }
}

/// View `parent` through `codec`; codec errors reach the caller.
pub fn transcode<V, A, C>(parent: V, codec: C) -> TranscodedVar<V, A, C>
where
    V: Readable<A>,
{
    let annotations = parent.annotations().detached();
    TranscodedVar {
        parent,
        codec,
        annotations,
        _raw: PhantomData,
    }
}

// =============================================================================
// logged
// =============================================================================

/// Variable that records every read and write at debug level.
pub struct Logged<V> {
    inner: V,
    label: String,
}

impl<V, T> Readable<T> for Logged<V>
where
    V: Readable<T>,
    T: fmt::Debug,
{
    fn get(&self) -> Result<T> {
        let value = self.inner.get()?;
        tracing::debug!(var = %self.label, ?value, "get");
        Ok(value)
    }

    fn annotations(&self) -> &Annotations {
        self.inner.annotations()
    }
}

impl<V, T> Writable<T> for Logged<V>
where
    V: Writable<T>,
    T: fmt::Debug,
{
    fn set(&self, value: T) -> Result<()> {
        tracing::debug!(var = %self.label, ?value, "set");
        self.inner.set(value)
    }
}

impl<V> fmt::Debug for Logged<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logged")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Wrap `inner` so its traffic shows up in traces under `label`.
pub fn logged<V>(inner: V, label: impl Into<String>) -> Logged<V> {
    Logged {
        inner,
        label: label.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::JsonCodec;
    use crate::strconv::bmap;
    use crate::var::{local, memory, preset};
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn test_transform_maps_both_directions() {
        let a = local(Some("10".to_string()));
        let b = transform(a.clone(), bmap::number());

        assert_eq!(b.get().unwrap(), Some(10.0));
        b.set(Some(42.0)).unwrap();
        assert_eq!(a.get().unwrap().as_deref(), Some("42"));

        b.set(None).unwrap();
        assert_eq!(a.get().unwrap(), None);
    }

    #[test]
    fn test_transform_carries_annotations_over() {
        let a = local(Some("10".to_string()));
        a.annotations().insert("desc", "123");

        let b = transform(a.clone(), bmap::number());
        assert_eq!(b.annotations().get("desc").as_deref(), Some("123"));

        b.annotations().insert("desc", "hello!");
        assert_eq!(a.annotations().get("desc").as_deref(), Some("123"));
    }

    #[test]
    fn test_chroot_json_member() {
        let v = local(json!({"myProp": 10}));
        let prop = chroot(v.clone(), Field::json("myProp"));

        assert_eq!(prop.get().unwrap(), json!(10));
        prop.set(json!(15)).unwrap();
        assert_eq!(v.get().unwrap()["myProp"], json!(15));
    }

    #[test]
    fn test_chroot_json_missing_and_null() {
        let v = local(Value::Null);
        let prop = chroot(v.clone(), Field::json("a"));

        assert_eq!(prop.get().unwrap(), Value::Null);
        prop.set(json!(true)).unwrap();
        assert_eq!(v.get().unwrap(), json!({"a": true}));
    }

    #[test]
    fn test_chroot_json_rejects_non_object() {
        let v = local(json!([1, 2]));
        let prop = chroot(v, Field::json("a"));

        assert_matches!(
            prop.get(),
            Err(StateError::Parse(ParseError::ShapeMismatch {
                expected: JsonKind::Object,
                found: JsonKind::List,
            }))
        );
        assert!(prop.set(json!(1)).is_err());
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn test_chroot_typed_field() {
        let v = memory(Point { x: 1, y: 2 });
        let x = chroot(v.clone(), Field::new("x", |p: &Point| p.x, |p: &mut Point, x| p.x = x));

        x.set(5).unwrap();
        assert_eq!(v.get().unwrap(), Point { x: 5, y: 2 });
        assert_eq!(x.get().unwrap(), 5);
    }

    #[test]
    fn test_chroot_get_is_a_copy() {
        let v = local(json!({"a": {"b": 1}}));
        let a = chroot(v.clone(), Field::json("a"));

        let mut held = a.get().unwrap();
        a.set(json!({"b": 2})).unwrap();
        assert_eq!(held, json!({"b": 1}));

        held["b"] = json!(3);
        assert_eq!(v.get().unwrap(), json!({"a": {"b": 2}}));
    }

    #[test]
    fn test_transpose_writes_whole_snapshot_back() {
        let v = memory(json!({"one": "1", "two": "2"}));
        let one = transpose(v.clone(), |snapshot: Local<Value>| {
            chroot(snapshot, Field::json("one"))
        });

        assert_eq!(one.get().unwrap(), json!("1"));
        one.set(json!("uno")).unwrap();
        assert_eq!(v.get().unwrap(), json!({"one": "uno", "two": "2"}));
    }

    #[test]
    fn test_transpose_set_notifies_parent_once() {
        use futures::FutureExt;

        let v = memory(json!({"n": 0}));
        let n = transpose(v.clone(), |snapshot: Local<Value>| {
            chroot(snapshot, Field::json("n"))
        });

        let next = v.next();
        n.set(json!(1)).unwrap();
        assert_eq!(next.now_or_never(), Some(Ok(json!({"n": 1}))));
    }

    #[test]
    fn test_cast_reads_through_view_and_writes_parent_type() {
        let v = local(None::<u32>);
        let c = cast(v.clone(), preset(7u32));

        assert_eq!(c.get().unwrap(), 7);
        c.set(Some(3)).unwrap();
        assert_eq!(c.get().unwrap(), 3);
        assert_eq!(v.get().unwrap(), Some(3));
    }

    #[test]
    fn test_transcoded_var_propagates_codec_errors() {
        let raw = local(Some("[1,2]".to_string()));
        let list = transcode(raw.clone(), JsonCodec::<Vec<u8>>::new());

        assert_eq!(list.get().unwrap(), Some(vec![1, 2]));
        list.set(Some(vec![3])).unwrap();
        assert_eq!(raw.get().unwrap().as_deref(), Some("[3]"));

        raw.set(Some("{".into())).unwrap();
        assert_matches!(list.get(), Err(StateError::Codec { .. }));
    }

    #[test]
    fn test_logged_passes_through() {
        let v = logged(local(1u8), "counter");
        v.set(2).unwrap();
        assert_eq!(v.get().unwrap(), 2);
    }
}
