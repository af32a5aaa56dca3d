//! Per-type component storage.

use cobalt_core::data::Value;

use crate::component::{Component, ComponentRegistry, ComponentType};
use crate::entity::Entity;
use crate::error::EcsError;
use crate::inspect::FieldValue;
use crate::sparse_set::{ComponentStorage, SparseSet};

/// All component storages of a world, one per registered type.
///
/// This is the view processors receive. Values can be read and modified
/// through it, but adding or removing components goes through the
/// [`World`](crate::World) (or a [`CommandBuffer`](crate::CommandBuffer)
/// during updates), so membership never changes under a running iteration.
///
/// Lookups do not know whether an entity is alive; they compare the full
/// handle stored next to each value, so dead handles simply find nothing.
#[derive(Default)]
pub struct Components {
    registry: ComponentRegistry,
    storages: Vec<ComponentStorage>,
}

impl Components {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Shorthand for `registry().type_of::<T>()`.
    pub fn component_type<T: Component>(&self) -> Result<ComponentType, EcsError> {
        self.registry.type_of::<T>()
    }

    pub(crate) fn register<T: Component>(&mut self) -> Result<ComponentType, EcsError> {
        let ty = self.registry.register::<T>()?;
        self.storages.push(ComponentStorage::new::<T>());
        Ok(ty)
    }

    pub(crate) fn storage(&self, ty: ComponentType) -> Result<&ComponentStorage, EcsError> {
        self.storages
            .get(ty.index())
            .ok_or(EcsError::ComponentNotRegistered("<unknown>"))
    }

    fn storage_mut(&mut self, ty: ComponentType) -> Result<&mut ComponentStorage, EcsError> {
        self.storages
            .get_mut(ty.index())
            .ok_or(EcsError::ComponentNotRegistered("<unknown>"))
    }

    fn set<T: Component>(&self) -> Result<&SparseSet<T>, EcsError> {
        let ty = self.registry.type_of::<T>()?;
        self.storage(ty)?
            .typed::<T>()
            .ok_or(EcsError::ComponentNotRegistered(T::NAME))
    }

    fn set_mut<T: Component>(&mut self) -> Result<&mut SparseSet<T>, EcsError> {
        let ty = self.registry.type_of::<T>()?;
        self.storage_mut(ty)?
            .typed_mut::<T>()
            .ok_or(EcsError::ComponentNotRegistered(T::NAME))
    }

    pub(crate) fn insert<T: Component>(
        &mut self,
        entity: Entity,
        value: T,
    ) -> Result<&mut T, EcsError> {
        self.set_mut::<T>()?
            .insert(entity, value)
            .map_err(|_| EcsError::DuplicateComponent {
                entity,
                component: T::NAME,
            })
    }

    pub(crate) fn insert_default(
        &mut self,
        entity: Entity,
        ty: ComponentType,
    ) -> Result<(), EcsError> {
        let storage = self.storage_mut(ty)?;
        if storage.insert_default(entity) {
            Ok(())
        } else {
            Err(EcsError::DuplicateComponent {
                entity,
                component: storage.name(),
            })
        }
    }

    pub(crate) fn remove(&mut self, entity: Entity, ty: ComponentType) -> bool {
        self.storage_mut(ty).is_ok_and(|s| s.remove(entity))
    }

    /// Returns the component of type `T` held by `entity`.
    pub fn get<T: Component>(&self, entity: Entity) -> Result<&T, EcsError> {
        self.set::<T>()?
            .get(entity)
            .ok_or(EcsError::ComponentNotFound {
                entity,
                component: T::NAME,
            })
    }

    /// Mutable counterpart of [`get`](Self::get).
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T, EcsError> {
        self.set_mut::<T>()?
            .get_mut(entity)
            .ok_or(EcsError::ComponentNotFound {
                entity,
                component: T::NAME,
            })
    }

    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.set::<T>().is_ok_and(|s| s.contains(entity))
    }

    pub fn has_type(&self, entity: Entity, ty: ComponentType) -> bool {
        self.storage(ty).is_ok_and(|s| s.contains(entity))
    }

    /// Number of instances of `ty`.
    pub fn count(&self, ty: ComponentType) -> usize {
        self.storage(ty).map_or(0, ComponentStorage::len)
    }

    /// Iterates `(entity, &T)` in current membership order.
    ///
    /// Yields nothing if `T` is not registered.
    pub fn iter<T: Component>(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.set::<T>().ok().into_iter().flat_map(|s| s.iter())
    }

    /// Iterates `(entity, &mut T)` in current membership order.
    pub fn iter_mut<T: Component>(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.set_mut::<T>()
            .ok()
            .into_iter()
            .flat_map(|s| s.iter_mut())
    }

    /// Calls `f` for every instance of `T`.
    pub fn for_each<T: Component>(&self, mut f: impl FnMut(Entity, &T)) {
        for (entity, value) in self.iter::<T>() {
            f(entity, value);
        }
    }

    /// Replaces the instance with one loaded from `data`.
    ///
    /// On failure the stored instance is left unchanged.
    pub fn load(&mut self, entity: Entity, ty: ComponentType, data: &Value) -> Result<(), EcsError> {
        let storage = self.storage_mut(ty)?;
        let name = storage.name();
        match storage.load(entity, data) {
            Some(result) => result.map_err(|source| EcsError::Data {
                component: name.to_owned(),
                source,
            }),
            None => Err(EcsError::ComponentNotFound {
                entity,
                component: name,
            }),
        }
    }

    /// Writes the instance as a document node.
    pub fn save(&self, entity: Entity, ty: ComponentType) -> Result<Value, EcsError> {
        let storage = self.storage(ty)?;
        storage.save(entity).ok_or(EcsError::ComponentNotFound {
            entity,
            component: storage.name(),
        })
    }

    /// Lists the editable fields of an instance.
    pub fn fields(
        &self,
        entity: Entity,
        ty: ComponentType,
    ) -> Result<Vec<(&'static str, FieldValue)>, EcsError> {
        let storage = self.storage(ty)?;
        let name = storage.name();
        match storage.fields(entity) {
            Some(Some(fields)) => Ok(fields),
            Some(None) => Err(EcsError::NotEditable(name)),
            None => Err(EcsError::ComponentNotFound {
                entity,
                component: name,
            }),
        }
    }

    /// Writes one editable field of an instance.
    pub fn set_field(
        &mut self,
        entity: Entity,
        ty: ComponentType,
        field: &str,
        value: FieldValue,
    ) -> Result<(), EcsError> {
        let storage = self.storage_mut(ty)?;
        let name = storage.name();
        let value_kind = value.kind_name();
        match storage.set_field(entity, field, value) {
            Some(Some(true)) => Ok(()),
            Some(Some(false)) => Err(EcsError::InvalidField {
                component: name,
                field: field.to_owned(),
                value_kind,
            }),
            Some(None) => Err(EcsError::NotEditable(name)),
            None => Err(EcsError::ComponentNotFound {
                entity,
                component: name,
            }),
        }
    }
}
