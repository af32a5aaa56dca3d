use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Container for typed singleton resources.
///
/// Resources are values stored once per [`World`](crate::World), keyed by
/// their Rust type. Processors reach them through
/// [`ProcessorContext::resources`](crate::ProcessorContext).
#[derive(Default)]
pub struct Resources {
    entries: HashMap<TypeId, Box<dyn Any>>,
}

impl Resources {
    /// Creates a new empty resource container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a resource of type T, returning the previous value.
    pub fn insert<T: 'static>(&mut self, value: T) -> Option<T> {
        self.entries
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    /// Removes a resource of type T, returning it if present.
    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        let entry = self.entries.remove(&TypeId::of::<T>())?;
        entry.downcast::<T>().ok().map(|v| *v)
    }

    /// Returns whether a resource of type T exists.
    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.entries.get(&TypeId::of::<T>())?.downcast_ref::<T>()
    }

    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.entries.get_mut(&TypeId::of::<T>())?.downcast_mut::<T>()
    }

    /// Returns the resource, inserting `T::default()` first if absent.
    pub fn get_or_default<T: Default + 'static>(&mut self) -> &mut T {
        self.entries
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(T::default()))
            .downcast_mut::<T>()
            .unwrap_or_else(|| unreachable!("resource stored under a foreign TypeId"))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
