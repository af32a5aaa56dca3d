//! Typed generational handles.
//!
//! A [`Handle<C>`] identifies a resource of category `C` without exposing
//! where it is stored. Handles of different categories are distinct types,
//! so an entity handle can never be passed where a texture handle is expected.
//!
//! # Layout
//!
//! Each handle carries a slot `index` and a `generation`. The pair packs into
//! a single `u64` ([`Handle::raw`]); equality and hashing use that integer
//! only. Raw value `0` is [`Handle::NULL`] and is never issued.
//!
//! # Stale handles
//!
//! [`HandleAllocator`] recycles released slots but bumps their generation, so
//! a handle kept past its release is rejected by [`HandleAllocator::is_live`]
//! instead of aliasing whatever occupies the slot next.
//!
//! ```
//! use cobalt_core::handle::{Handle, HandleAllocator};
//!
//! enum Texture {}
//!
//! let mut textures = HandleAllocator::<Texture>::new();
//! let a = textures.allocate();
//! assert!(textures.release(a));
//!
//! let b = textures.allocate();
//! assert_eq!(a.index(), b.index());
//! assert_ne!(a, b);
//! assert!(!textures.is_live(a));
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// A typed, generational identifier for a resource of category `C`.
pub struct Handle<C> {
    index: u32,
    generation: u32,
    _category: PhantomData<fn() -> C>,
}

impl<C> Handle<C> {
    /// The null handle. Never issued by an allocator.
    pub const NULL: Self = Self {
        index: 0,
        generation: 0,
        _category: PhantomData,
    };

    /// Builds a handle from its parts.
    ///
    /// Mostly useful for tests and for decoding handles from serialized data;
    /// allocators are the normal source of handles.
    pub const fn from_parts(index: u32, generation: u32) -> Self {
        Self {
            index,
            generation,
            _category: PhantomData,
        }
    }

    /// Rebuilds a handle from the value returned by [`raw`](Self::raw).
    pub const fn from_raw(raw: u64) -> Self {
        Self::from_parts(raw as u32, (raw >> 32) as u32)
    }

    /// Returns the packed integer identity of this handle.
    pub const fn raw(self) -> u64 {
        (self.generation as u64) << 32 | self.index as u64
    }

    /// Returns the slot index.
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Returns the slot generation.
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// Returns `true` for [`Handle::NULL`].
    pub const fn is_null(self) -> bool {
        self.raw() == 0
    }
}

impl<C> Clone for Handle<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Handle<C> {}

impl<C> PartialEq for Handle<C> {
    fn eq(&self, other: &Self) -> bool {
        self.raw() == other.raw()
    }
}

impl<C> Eq for Handle<C> {}

impl<C> PartialOrd for Handle<C> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<C> Ord for Handle<C> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.raw().cmp(&other.raw())
    }
}

impl<C> Hash for Handle<C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw().hash(state);
    }
}

impl<C> Default for Handle<C> {
    fn default() -> Self {
        Self::NULL
    }
}

impl<C> fmt::Debug for Handle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = std::any::type_name::<C>();
        let short = name.rsplit("::").next().unwrap_or(name);
        write!(f, "{short}({}v{})", self.index, self.generation)
    }
}

impl<C> fmt::Display for Handle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Allocates and recycles handles of one category.
///
/// Slot 0 is reserved so that no issued handle has raw value 0. Released
/// slots go onto a LIFO free list; reuse bumps the slot generation.
pub struct HandleAllocator<C> {
    /// Current generation per slot. Index = slot index.
    generations: Vec<u32>,
    /// Alive flag per slot.
    alive: Vec<bool>,
    /// Recyclable slot indices (LIFO).
    free_list: Vec<u32>,
    count: u32,
    _category: PhantomData<fn() -> C>,
}

impl<C> HandleAllocator<C> {
    /// Creates an empty allocator.
    pub fn new() -> Self {
        Self {
            // Slot 0 is the null slot and is never marked alive.
            generations: vec![0],
            alive: vec![false],
            free_list: Vec::new(),
            count: 0,
            _category: PhantomData,
        }
    }

    /// Issues a fresh handle, reusing a released slot when one is available.
    pub fn allocate(&mut self) -> Handle<C> {
        self.count += 1;

        if let Some(index) = self.free_list.pop() {
            let idx = index as usize;
            self.alive[idx] = true;
            Handle::from_parts(index, self.generations[idx])
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(1);
            self.alive.push(true);
            Handle::from_parts(index, 1)
        }
    }

    /// Releases a handle. Returns `false` if it was null, stale or already released.
    pub fn release(&mut self, handle: Handle<C>) -> bool {
        if !self.is_live(handle) {
            return false;
        }

        let idx = handle.index() as usize;
        self.alive[idx] = false;
        // Skip 0 on wrap so slot 0-style raw values never reappear.
        self.generations[idx] = self.generations[idx].wrapping_add(1).max(1);
        self.free_list.push(handle.index());
        self.count -= 1;
        true
    }

    /// Returns whether `handle` refers to a currently allocated slot.
    pub fn is_live(&self, handle: Handle<C>) -> bool {
        let idx = handle.index() as usize;
        !handle.is_null()
            && idx < self.alive.len()
            && self.alive[idx]
            && self.generations[idx] == handle.generation()
    }

    /// Returns the number of live handles.
    pub fn len(&self) -> usize {
        self.count as usize
    }

    /// Returns `true` when no handle is live.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns the live handle occupying `index`, if any.
    pub fn handle_at(&self, index: u32) -> Option<Handle<C>> {
        let idx = index as usize;
        (idx < self.alive.len() && self.alive[idx])
            .then(|| Handle::from_parts(index, self.generations[idx]))
    }

    /// Iterates over all live handles in slot order.
    pub fn iter_live(&self) -> impl Iterator<Item = Handle<C>> + '_ {
        self.alive
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(|(idx, _)| Handle::from_parts(idx as u32, self.generations[idx]))
    }
}

impl<C> Default for HandleAllocator<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for HandleAllocator<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleAllocator")
            .field("live", &self.count)
            .field("slots", &(self.generations.len() - 1))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    enum Texture {}
    enum Buffer {}

    #[test]
    fn null_is_never_issued() {
        let mut alloc = HandleAllocator::<Texture>::new();
        for _ in 0..16 {
            assert!(!alloc.allocate().is_null());
        }
        assert!(Handle::<Texture>::NULL.is_null());
        assert!(!alloc.is_live(Handle::NULL));
    }

    #[test]
    fn allocate_sequential() {
        let mut alloc = HandleAllocator::<Texture>::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        assert_eq!(a.index(), 1);
        assert_eq!(b.index(), 2);
        assert_eq!(alloc.len(), 2);
    }

    #[test]
    fn release_twice_fails() {
        let mut alloc = HandleAllocator::<Texture>::new();
        let a = alloc.allocate();
        assert!(alloc.release(a));
        assert!(!alloc.release(a));
        assert!(alloc.is_empty());
    }

    #[test]
    fn recycled_slot_rejects_stale_handle() {
        let mut alloc = HandleAllocator::<Texture>::new();
        let old = alloc.allocate();
        alloc.release(old);
        let new = alloc.allocate();

        assert_eq!(old.index(), new.index());
        assert_ne!(old.generation(), new.generation());
        assert!(!alloc.is_live(old));
        assert!(alloc.is_live(new));
        assert!(!alloc.release(old));
    }

    #[test]
    fn raw_roundtrip() {
        let h = Handle::<Buffer>::from_parts(7, 3);
        assert_eq!(Handle::<Buffer>::from_raw(h.raw()), h);
        assert_eq!(h.raw(), (3u64 << 32) | 7);
    }

    #[test]
    fn hash_uses_packed_integer() {
        let mut set = HashSet::new();
        set.insert(Handle::<Texture>::from_parts(1, 1));
        set.insert(Handle::<Texture>::from_parts(1, 1));
        set.insert(Handle::<Texture>::from_parts(1, 2));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn iter_live_skips_released() {
        let mut alloc = HandleAllocator::<Texture>::new();
        let handles: Vec<_> = (0..5).map(|_| alloc.allocate()).collect();
        alloc.release(handles[1]);
        alloc.release(handles[3]);

        let live: Vec<_> = alloc.iter_live().collect();
        assert_eq!(live, vec![handles[0], handles[2], handles[4]]);
        assert_eq!(alloc.handle_at(handles[2].index()), Some(handles[2]));
        assert_eq!(alloc.handle_at(handles[1].index()), None);
    }

    #[test]
    fn debug_format_names_category() {
        let h = Handle::<Texture>::from_parts(4, 2);
        assert_eq!(format!("{h:?}"), "Texture(4v2)");
    }
}
