//! Bidirectional mappings
//!
//! A [`Reversible<X, Y>`] binds a forward function `X -> Y` to a reverse
//! function `Y -> X` as one value. Nothing checks that the two are inverses;
//! that is up to whoever builds the mapping.
//!
//! Laws that do hold by construction:
//! - `m.flip().flip()` has the same forward and reverse functions as `m`
//! - `m.flip().call(y) == m.apply(y)` and `m.flip().apply(x) == m.call(x)`
//!
//! # Example
//!
//! ```rust
//! use statecast_core::reversible::Reversible;
//!
//! let parse = Reversible::make(
//!     |s: String| s.parse::<i64>().unwrap_or_default(),
//!     |n: i64| n.to_string(),
//! );
//!
//! assert_eq!(parse.call("10".to_string()), 10);
//! assert_eq!(parse.apply(10), "10");
//! assert_eq!(parse.flip().call(42), "42");
//! ```

use std::fmt;
use std::sync::Arc;

/// A one-way mapping.
pub type OneWay<X, Y> = Arc<dyn Fn(X) -> Y + Send + Sync>;

/// A forward function paired with its reverse.
pub struct Reversible<X, Y> {
    forward: OneWay<X, Y>,
    reverse: OneWay<Y, X>,
}

impl<X, Y> Reversible<X, Y>
where
    X: 'static,
    Y: 'static,
{
    /// Bind `forward` and `reverse` into one mapping.
    pub fn make<F, R>(forward: F, reverse: R) -> Self
    where
        F: Fn(X) -> Y + Send + Sync + 'static,
        R: Fn(Y) -> X + Send + Sync + 'static,
    {
        Self {
            forward: Arc::new(forward),
            reverse: Arc::new(reverse),
        }
    }

    /// Build from already shared halves.
    pub fn from_parts(forward: OneWay<X, Y>, reverse: OneWay<Y, X>) -> Self {
        Self { forward, reverse }
    }

    /// Run the forward direction.
    pub fn call(&self, x: X) -> Y {
        (self.forward)(x)
    }

    /// Run the reverse direction.
    pub fn apply(&self, y: Y) -> X {
        (self.reverse)(y)
    }

    /// The forward function alone.
    pub fn forward(&self) -> OneWay<X, Y> {
        self.forward.clone()
    }

    /// The reverse function alone.
    pub fn extract(&self) -> OneWay<Y, X> {
        self.reverse.clone()
    }

    /// The same two functions with their roles swapped.
    pub fn flip(&self) -> Reversible<Y, X> {
        Reversible {
            forward: self.reverse.clone(),
            reverse: self.forward.clone(),
        }
    }

    /// Compose with `next`: forward runs `self` then `next`, reverse runs
    /// `next` backwards then `self` backwards.
    pub fn then<Z>(&self, next: &Reversible<Y, Z>) -> Reversible<X, Z>
    where
        Z: 'static,
    {
        let (f1, f2) = (self.forward.clone(), next.forward.clone());
        let (r1, r2) = (self.reverse.clone(), next.reverse.clone());
        Reversible::make(move |x| f2(f1(x)), move |z| r1(r2(z)))
    }

    /// True when both mappings share the same two function values.
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.forward, &other.forward) && Arc::ptr_eq(&self.reverse, &other.reverse)
    }
}

impl<X: 'static> Reversible<X, X> {
    /// The mapping that changes nothing.
    pub fn identity() -> Self {
        Self::make(|x| x, |x| x)
    }
}

impl<X, Y> Clone for Reversible<X, Y> {
    fn clone(&self) -> Self {
        Self {
            forward: self.forward.clone(),
            reverse: self.reverse.clone(),
        }
    }
}

impl<X, Y> fmt::Debug for Reversible<X, Y> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reversible")
            .field("from", &std::any::type_name::<X>())
            .field("to", &std::any::type_name::<Y>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn radix() -> Reversible<String, i64> {
        Reversible::make(
            |s: String| i64::from_str_radix(&s, 16).unwrap_or_default(),
            |n: i64| format!("{n:x}"),
        )
    }

    #[test]
    fn test_call_and_apply() {
        let m = radix();
        assert_eq!(m.call("ff".into()), 255);
        assert_eq!(m.apply(255), "ff");
        assert_eq!((m.extract())(16), "10");
        assert_eq!((m.forward())("10".into()), 16);
    }

    #[test]
    fn test_double_flip_restores_roles() {
        let m = radix();
        let back = m.flip().flip();
        assert!(back.same_as(&m));
        assert_eq!(back.call("a".into()), 10);
        assert_eq!(back.apply(10), "a");
    }

    #[test]
    fn test_then_composes_both_directions() {
        let doubled = Reversible::make(|n: i64| n * 2, |n: i64| n / 2);
        let m = radix().then(&doubled);
        assert_eq!(m.call("10".into()), 32);
        assert_eq!(m.apply(32), "10");
    }

    #[test]
    fn test_identity() {
        let id = Reversible::<u8, u8>::identity();
        assert_eq!(id.call(3), 3);
        assert_eq!(id.apply(4), 4);
    }
}
