//! Type-keyed storage for per-hook handler state.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
};

/// A map holding at most one value per type.
///
/// Handlers use it to hand state from their pre-chain half to their
/// post-chain half (an open span, a start instant) without going through
/// the argument bag, which is meant for rendering.
#[derive(Default)]
pub struct Extensions {
    map: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Extensions {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the previous value of the same type.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.map
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|prev| prev.downcast::<T>().ok().map(|boxed| *boxed))
    }

    /// Borrow the value of type `T`.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.map
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref())
    }

    /// Mutably borrow the value of type `T`.
    pub fn get_mut<T: Send + Sync + 'static>(&mut self) -> Option<&mut T> {
        self.map
            .get_mut(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_mut())
    }

    /// Take the value of type `T` out of the map.
    pub fn remove<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.map
            .remove(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast::<T>().ok().map(|boxed| *boxed))
    }

    /// True if a value of type `T` is present.
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.map.contains_key(&TypeId::of::<T>())
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Drop every stored value.
    pub fn clear(&mut self) {
        self.map.clear();
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extensions")
            .field("len", &self.map.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Marker(u32);

    #[test]
    fn one_value_per_type() {
        let mut ext = Extensions::new();
        assert_eq!(ext.insert(Marker(1)), None);
        assert_eq!(ext.insert(Marker(2)), Some(Marker(1)));
        ext.insert("text");

        assert_eq!(ext.len(), 2);
        assert_eq!(ext.get::<Marker>(), Some(&Marker(2)));
        ext.get_mut::<Marker>().unwrap().0 = 3;
        assert_eq!(ext.remove::<Marker>(), Some(Marker(3)));
        assert!(!ext.contains::<Marker>());
        assert_eq!(ext.get::<&str>(), Some(&"text"));
    }
}
