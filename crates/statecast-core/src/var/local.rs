//! Plain in-process variables without change notification

use super::{Annotations, Readable, Writable};
use crate::errors::Result;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// A value held in place.
///
/// Clones share the value. Used as the private snapshot behind
/// [`transpose`](super::transpose).
pub struct Local<T> {
    value: Arc<RwLock<T>>,
    annotations: Annotations,
}

impl<T> Local<T> {
    /// Variable starting at `initial`.
    pub fn new(initial: T) -> Self {
        Self {
            value: Arc::new(RwLock::new(initial)),
            annotations: Annotations::new(),
        }
    }

    /// Take the value back out, cloning only if other handles remain.
    pub fn into_inner(self) -> T
    where
        T: Clone,
    {
        match Arc::try_unwrap(self.value) {
            Ok(lock) => lock.into_inner(),
            Err(shared) => shared.read().clone(),
        }
    }
}

impl<T> Clone for Local<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            annotations: self.annotations.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Local<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Local")
            .field("value", &*self.value.read())
            .finish()
    }
}

impl<T> Readable<T> for Local<T>
where
    T: Clone + Send + Sync,
{
    fn get(&self) -> Result<T> {
        Ok(self.value.read().clone())
    }

    fn annotations(&self) -> &Annotations {
        &self.annotations
    }
}

impl<T> Writable<T> for Local<T>
where
    T: Send + Sync,
{
    fn set(&self, value: T) -> Result<()> {
        *self.value.write() = value;
        Ok(())
    }
}

/// A variable over `initial`.
pub fn local<T>(initial: T) -> Local<T> {
    Local::new(initial)
}

/// A value whose reads go through an explicit copier.
///
/// For types whose `Clone` does not produce an independent value (shared
/// handles, interior mutability), `copier` must.
pub struct Copied<T> {
    value: RwLock<T>,
    copier: Arc<dyn Fn(&T) -> T + Send + Sync>,
    annotations: Annotations,
}

impl<T> Readable<T> for Copied<T>
where
    T: Send + Sync,
{
    fn get(&self) -> Result<T> {
        Ok((self.copier)(&self.value.read()))
    }

    fn annotations(&self) -> &Annotations {
        &self.annotations
    }
}

impl<T> Writable<T> for Copied<T>
where
    T: Send + Sync,
{
    fn set(&self, value: T) -> Result<()> {
        *self.value.write() = value;
        Ok(())
    }
}

impl<T> fmt::Debug for Copied<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Copied")
            .field("type", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

/// A variable over `initial` that hands out `copier(&value)` on every read.
pub fn copy<T, F>(initial: T, copier: F) -> Copied<T>
where
    F: Fn(&T) -> T + Send + Sync + 'static,
{
    Copied {
        value: RwLock::new(initial),
        copier: Arc::new(copier),
        annotations: Annotations::new(),
    }
}

/// One-way substitution of `default` for absent values, for use with
/// [`cast`](super::cast).
pub fn preset<T>(default: T) -> impl Fn(Option<T>) -> T + Clone + Send + Sync + 'static
where
    T: Clone + Send + Sync + 'static,
{
    move |value| value.unwrap_or_else(|| default.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local() {
        let x = local(0);
        let mut y = x.get().unwrap();
        assert_eq!(y, 0);

        y = 42;
        assert_eq!(x.get().unwrap(), 0);

        x.set(y).unwrap();
        assert_eq!(x.get().unwrap(), 42);
        assert_eq!(x.into_inner(), 42);
    }

    #[test]
    fn test_copy_hands_out_independent_values() {
        // Shared handle: Clone would alias the same map.
        type Params = Arc<RwLock<Vec<(String, String)>>>;
        let x = copy(Params::default(), |p: &Params| {
            Arc::new(RwLock::new(p.read().clone()))
        });
        let lookup = |name: &str| {
            let params = x.get().unwrap();
            let found = params
                .read()
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone());
            found
        };

        let y = x.get().unwrap();
        y.write().push(("name".into(), "value".into()));
        assert_eq!(lookup("name"), None);

        x.set(y).unwrap();
        assert_eq!(lookup("name").as_deref(), Some("value"));
    }

    #[test]
    fn test_preset() {
        let or_ten = preset(10);
        assert_eq!(or_ten(None), 10);
        assert_eq!(or_ten(Some(3)), 3);
    }
}
