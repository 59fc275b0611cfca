//! Per-worker persistent state.
//!
//! A [`Context`] is owned by exactly one worker and handed to its task on every
//! call through [`Job::context_mut`](crate::Job::context_mut). Entries are keyed
//! by type, so callers wrap their values in a newtype to avoid collisions.

use std::any::{Any, TypeId};
use std::fmt;

use hashbrown::HashMap;

/// Type-keyed record of values that survive between demand calls.
#[derive(Default)]
pub struct Context {
    /// One boxed value per type.
    entries: HashMap<TypeId, Box<dyn Any + Send>>,
}

impl Context {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value`, returning the previous value of the same type.
    pub fn insert<V: Any + Send>(&mut self, value: V) -> Option<V> {
        self.entries.insert(TypeId::of::<V>(), Box::new(value)).and_then(|old| old.downcast::<V>().ok()).map(|old| *old)
    }

    /// Returns the value of type `V`, if one is stored.
    pub fn get<V: Any + Send>(&self) -> Option<&V> {
        self.entries.get(&TypeId::of::<V>()).and_then(|value| value.downcast_ref::<V>())
    }

    /// Returns the value of type `V` for in-place updates, if one is stored.
    pub fn get_mut<V: Any + Send>(&mut self) -> Option<&mut V> {
        self.entries.get_mut(&TypeId::of::<V>()).and_then(|value| value.downcast_mut::<V>())
    }

    /// Returns the value of type `V`, inserting `init()` first if absent.
    pub fn get_or_insert_with<V: Any + Send>(&mut self, init: impl FnOnce() -> V) -> &mut V {
        let slot = self.entries.entry(TypeId::of::<V>()).or_insert_with(|| Box::new(init()));
        // The entry is keyed by `TypeId::of::<V>()`, so the downcast cannot miss.
        match slot.downcast_mut::<V>() {
            Some(value) => value,
            None => unreachable!("context entry does not match its type key"),
        }
    }

    /// Takes the value of type `V` out of the context.
    pub fn remove<V: Any + Send>(&mut self) -> Option<V> {
        self.entries.remove(&TypeId::of::<V>()).and_then(|value| value.downcast::<V>().ok()).map(|value| *value)
    }

    /// Returns true if a value of type `V` is stored.
    #[inline]
    pub fn contains<V: Any + Send>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<V>())
    }

    /// Number of stored values.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every stored value.
    #[inline]
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Context([... {} entries ...])", self.entries.len())
    }
}
