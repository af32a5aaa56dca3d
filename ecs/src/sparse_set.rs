use std::any::Any;

use cobalt_core::data::{DataError, Value};

use crate::component::Component;
use crate::entity::Entity;
use crate::inspect::FieldValue;

/// Typed sparse set keyed by [`Entity`].
///
/// Uses a sparse array (entity index → dense index) and a dense array
/// (contiguous values + owning entity) for O(1) insert/remove/get and
/// cache-friendly iteration. Lookups compare the full handle stored in the
/// dense array, so a stale handle whose slot was reused finds nothing.
///
/// Iteration order is the order entities joined the set, except that
/// removal moves the last element into the freed slot.
pub struct SparseSet<T> {
    /// `entity_index -> dense_index`. `None` means absent.
    sparse: Vec<Option<u32>>,
    dense: Vec<T>,
    /// Owning entity of each dense element.
    entities: Vec<Entity>,
}

impl<T> SparseSet<T> {
    /// Creates a new empty sparse set.
    pub fn new() -> Self {
        Self {
            sparse: Vec::new(),
            dense: Vec::new(),
            entities: Vec::new(),
        }
    }

    fn dense_index(&self, entity: Entity) -> Option<usize> {
        let di = (*self.sparse.get(entity.index() as usize)?)? as usize;
        (self.entities[di] == entity).then_some(di)
    }

    /// Inserts a value. Returns the value back if `entity` is already present.
    pub fn insert(&mut self, entity: Entity, value: T) -> Result<&mut T, T> {
        if self.contains(entity) {
            return Err(value);
        }
        let idx = entity.index() as usize;
        if idx >= self.sparse.len() {
            self.sparse.resize(idx + 1, None);
        }
        let di = self.dense.len();
        self.sparse[idx] = Some(di as u32);
        self.dense.push(value);
        self.entities.push(entity);
        Ok(&mut self.dense[di])
    }

    /// Removes and returns the value for `entity`, if present.
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let di = self.dense_index(entity)?;
        self.sparse[entity.index() as usize] = None;

        let last = self.dense.len() - 1;
        if di != last {
            // Swap-remove: move last element into the removed slot
            let moved = self.entities[last];
            self.sparse[moved.index() as usize] = Some(di as u32);
        }
        self.entities.swap_remove(di);
        Some(self.dense.swap_remove(di))
    }

    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.dense_index(entity).map(|di| &self.dense[di])
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.dense_index(entity).map(|di| &mut self.dense[di])
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.dense_index(entity).is_some()
    }

    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Drops every element.
    pub fn clear(&mut self) {
        self.sparse.clear();
        self.dense.clear();
        self.entities.clear();
    }

    /// Reserves capacity for at least `additional` more elements.
    pub fn reserve(&mut self, additional: usize) {
        self.dense.reserve(additional);
        self.entities.reserve(additional);
    }

    /// Iterates over `(entity, &value)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.entities.iter().copied().zip(self.dense.iter())
    }

    /// Iterates over `(entity, &mut value)` pairs in dense order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.entities.iter().copied().zip(self.dense.iter_mut())
    }

    /// Member entities in dense order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }
}

impl<T> Default for SparseSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

// Type-erased operation function signatures
type InsertDefaultFn = fn(&mut dyn Any, Entity) -> bool;
type RemoveFn = fn(&mut dyn Any, Entity) -> bool;
type ContainsFn = fn(&dyn Any, Entity) -> bool;
type LenFn = fn(&dyn Any) -> usize;
type LoadFn = fn(&mut dyn Any, Entity, &Value) -> Option<Result<(), DataError>>;
type SaveFn = fn(&dyn Any, Entity) -> Option<Value>;
type FieldsFn = fn(&dyn Any, Entity) -> Option<Option<Vec<(&'static str, FieldValue)>>>;
type SetFieldFn = fn(&mut dyn Any, Entity, &str, FieldValue) -> Option<Option<bool>>;

/// A type-erased sparse set holding every instance of one component type.
///
/// The function pointers let the world create, load, save and edit
/// components knowing only their [`ComponentType`](crate::ComponentType).
pub(crate) struct ComponentStorage {
    inner: Box<dyn Any>,
    name: &'static str,
    insert_default_fn: InsertDefaultFn,
    remove_fn: RemoveFn,
    contains_fn: ContainsFn,
    len_fn: LenFn,
    load_fn: LoadFn,
    save_fn: SaveFn,
    fields_fn: FieldsFn,
    set_field_fn: SetFieldFn,
}

impl ComponentStorage {
    /// Creates a new component storage for type `T`.
    pub fn new<T: Component>() -> Self {
        Self {
            inner: Box::new(SparseSet::<T>::new()),
            name: T::NAME,
            insert_default_fn: |any, entity| {
                downcast_mut::<T>(any).is_some_and(|set| set.insert(entity, T::default()).is_ok())
            },
            remove_fn: |any, entity| {
                downcast_mut::<T>(any).is_some_and(|set| set.remove(entity).is_some())
            },
            contains_fn: |any, entity| downcast::<T>(any).is_some_and(|set| set.contains(entity)),
            len_fn: |any| downcast::<T>(any).map_or(0, SparseSet::len),
            load_fn: |any, entity, data| {
                let slot = downcast_mut::<T>(any)?.get_mut(entity)?;
                // Parse fully before touching the stored instance.
                Some(T::load(data).map(|value| *slot = value))
            },
            save_fn: |any, entity| downcast::<T>(any)?.get(entity).map(T::save),
            fields_fn: |any, entity| {
                let value = downcast::<T>(any)?.get(entity)?;
                Some(value.as_editable().map(|e| e.fields()))
            },
            set_field_fn: |any, entity, field, new_value| {
                let value = downcast_mut::<T>(any)?.get_mut(entity)?;
                Some(value.as_editable_mut().map(|e| e.set_field(field, new_value)))
            },
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Downcasts to the typed sparse set.
    pub fn typed<T: 'static>(&self) -> Option<&SparseSet<T>> {
        downcast::<T>(self.inner.as_ref())
    }

    /// Downcasts to the typed sparse set (mutable).
    pub fn typed_mut<T: 'static>(&mut self) -> Option<&mut SparseSet<T>> {
        downcast_mut::<T>(self.inner.as_mut())
    }

    /// Inserts a default instance. `false` if already present.
    pub fn insert_default(&mut self, entity: Entity) -> bool {
        (self.insert_default_fn)(self.inner.as_mut(), entity)
    }

    /// Removes the instance. `false` if absent.
    pub fn remove(&mut self, entity: Entity) -> bool {
        (self.remove_fn)(self.inner.as_mut(), entity)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        (self.contains_fn)(self.inner.as_ref(), entity)
    }

    pub fn len(&self) -> usize {
        (self.len_fn)(self.inner.as_ref())
    }

    /// `None` if absent; otherwise the load result.
    pub fn load(&mut self, entity: Entity, data: &Value) -> Option<Result<(), DataError>> {
        (self.load_fn)(self.inner.as_mut(), entity, data)
    }

    /// `None` if absent.
    pub fn save(&self, entity: Entity) -> Option<Value> {
        (self.save_fn)(self.inner.as_ref(), entity)
    }

    /// Outer `None` if absent, inner `None` if the type is not editable.
    pub fn fields(&self, entity: Entity) -> Option<Option<Vec<(&'static str, FieldValue)>>> {
        (self.fields_fn)(self.inner.as_ref(), entity)
    }

    /// Outer `None` if absent, inner `None` if the type is not editable,
    /// otherwise whether the field accepted the value.
    pub fn set_field(
        &mut self,
        entity: Entity,
        field: &str,
        value: FieldValue,
    ) -> Option<Option<bool>> {
        (self.set_field_fn)(self.inner.as_mut(), entity, field, value)
    }
}

fn downcast<T: 'static>(any: &dyn Any) -> Option<&SparseSet<T>> {
    any.downcast_ref::<SparseSet<T>>()
}

fn downcast_mut<T: 'static>(any: &mut dyn Any) -> Option<&mut SparseSet<T>> {
    any.downcast_mut::<SparseSet<T>>()
}
