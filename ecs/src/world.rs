use cobalt_core::data::Value;

use crate::commands::CommandBuffer;
use crate::component::{Component, ComponentRegistry, ComponentType};
use crate::entity::{Entity, EntityTable};
use crate::error::EcsError;
use crate::inspect::FieldValue;
use crate::processor::{Processor, ProcessorId, ProcessorRuntime};
use crate::resource::Resources;
use crate::store::Components;

/// An independent ECS world containing entities, components, processors and
/// resources.
///
/// Each World is fully self-contained. Multiple worlds can coexist in the
/// same process, sharing no data between them.
///
/// # Entity lifecycle
///
/// 1. [`create_entity`](Self::create_entity) allocates a handle with no
///    components. Processors do not see it yet.
/// 2. Components are attached.
/// 3. [`finalize_entity`](Self::finalize_entity) makes the entity visible to
///    processors. From then on every attach and detach updates tracked sets
///    immediately.
/// 4. [`destroy_entity`](Self::destroy_entity) untracks the entity (its
///    components are still readable in the callbacks), drops its components
///    and invalidates the handle.
///
/// # Example
///
/// ```
/// use cobalt_ecs::components::{Spin, Transform};
/// use cobalt_ecs::{register_stock_components, World};
///
/// let mut world = World::new();
/// register_stock_components(&mut world).unwrap();
///
/// let e = world.create_entity();
/// world.insert(e, Transform::IDENTITY).unwrap();
/// world.attach::<Spin>(e).unwrap();
/// world.finalize_entity(e).unwrap();
///
/// assert!(world.has::<Spin>(e));
/// world.destroy_entity(e).unwrap();
/// assert!(!world.is_alive(e));
/// ```
#[derive(Default)]
pub struct World {
    entities: EntityTable,
    components: Components,
    processors: ProcessorRuntime,
    commands: CommandBuffer,
    resources: Resources,
}

impl World {
    /// Creates a new empty world.
    pub fn new() -> Self {
        Self::default()
    }

    // ---- Component types ----

    /// Registers a component type. Fails on a repeated name.
    pub fn register_component<T: Component>(&mut self) -> Result<ComponentType, EcsError> {
        self.components.register::<T>()
    }

    pub fn component_type<T: Component>(&self) -> Result<ComponentType, EcsError> {
        self.components.component_type::<T>()
    }

    /// Looks a component type up by its document name.
    pub fn lookup_component(&self, name: &str) -> Result<ComponentType, EcsError> {
        self.components
            .registry()
            .lookup(name)
            .ok_or_else(|| EcsError::UnknownComponentName(name.to_owned()))
    }

    pub fn registry(&self) -> &ComponentRegistry {
        self.components.registry()
    }

    // ---- Entities ----

    /// Allocates an entity with no components. It stays invisible to
    /// processors until [`finalize_entity`](Self::finalize_entity).
    pub fn create_entity(&mut self) -> Entity {
        self.entities.create()
    }

    /// Makes the entity visible to processors. Calling it again is a no-op.
    pub fn finalize_entity(&mut self, entity: Entity) -> Result<(), EcsError> {
        self.check_alive(entity)?;
        if self.entities.is_finalized(entity) {
            return Ok(());
        }
        self.entities.set_finalized(entity);
        self.processors.entity_finalized(
            entity,
            self.entities.signature(entity),
            &self.components,
        );
        Ok(())
    }

    pub fn is_finalized(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity) && self.entities.is_finalized(entity)
    }

    /// Destroys an entity.
    ///
    /// Tracking processors get `on_entity_untracked` first, while the
    /// components are still in place. Then the components are dropped and
    /// the handle becomes invalid.
    pub fn destroy_entity(&mut self, entity: Entity) -> Result<(), EcsError> {
        self.check_alive(entity)?;
        if self.entities.is_finalized(entity) {
            self.processors
                .entity_destroying(entity, &self.components);
        }
        let types: Vec<usize> = self.entities.signature(entity).ones().collect();
        for ty in types {
            self.components
                .remove(entity, ComponentType::from_index(ty));
        }
        self.entities.release(entity);
        Ok(())
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Number of live entities, finalized or not.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Iterates all live entities in slot order.
    pub fn iter_entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter_alive()
    }

    /// Component types held by the entity, in registration order.
    pub fn component_types_of(&self, entity: Entity) -> Result<Vec<ComponentType>, EcsError> {
        self.check_alive(entity)?;
        Ok(self
            .entities
            .signature(entity)
            .ones()
            .map(ComponentType::from_index)
            .collect())
    }

    fn check_alive(&self, entity: Entity) -> Result<(), EcsError> {
        if self.entities.is_alive(entity) {
            Ok(())
        } else {
            Err(EcsError::InvalidEntity(entity))
        }
    }

    // ---- Untyped component operations ----

    /// Attaches a default instance of `ty`.
    pub fn attach_component(&mut self, entity: Entity, ty: ComponentType) -> Result<(), EcsError> {
        self.check_alive(entity)?;
        self.components.insert_default(entity, ty)?;
        self.after_attach(entity, ty);
        Ok(())
    }

    /// Detaches `ty`. Detaching an absent component is a no-op.
    pub fn detach_component(&mut self, entity: Entity, ty: ComponentType) -> Result<(), EcsError> {
        self.check_alive(entity)?;
        self.components.storage(ty)?;
        if !self.entities.has(entity, ty) {
            return Ok(());
        }
        self.entities.set_bit(entity, ty, false);
        if self.entities.is_finalized(entity) {
            // Untrack callbacks still see the component.
            self.processors.component_changed(
                entity,
                ty,
                self.entities.signature(entity),
                &self.components,
            );
        }
        self.components.remove(entity, ty);
        Ok(())
    }

    pub fn has_component(&self, entity: Entity, ty: ComponentType) -> bool {
        self.entities.is_alive(entity) && self.entities.has(entity, ty)
    }

    /// Replaces the entity's `ty` instance with one loaded from `data`.
    pub fn load_component(
        &mut self,
        entity: Entity,
        ty: ComponentType,
        data: &Value,
    ) -> Result<(), EcsError> {
        self.check_alive(entity)?;
        self.components.load(entity, ty, data)
    }

    pub fn save_component(&self, entity: Entity, ty: ComponentType) -> Result<Value, EcsError> {
        self.check_alive(entity)?;
        self.components.save(entity, ty)
    }

    /// Lists the editable fields of the entity's `ty` instance.
    pub fn component_fields(
        &self,
        entity: Entity,
        ty: ComponentType,
    ) -> Result<Vec<(&'static str, FieldValue)>, EcsError> {
        self.check_alive(entity)?;
        self.components.fields(entity, ty)
    }

    /// Writes one editable field of the entity's `ty` instance.
    pub fn set_component_field(
        &mut self,
        entity: Entity,
        ty: ComponentType,
        field: &str,
        value: FieldValue,
    ) -> Result<(), EcsError> {
        self.check_alive(entity)?;
        self.components.set_field(entity, ty, field, value)
    }

    fn after_attach(&mut self, entity: Entity, ty: ComponentType) {
        self.entities.set_bit(entity, ty, true);
        if self.entities.is_finalized(entity) {
            self.processors.component_changed(
                entity,
                ty,
                self.entities.signature(entity),
                &self.components,
            );
        }
    }

    // ---- Typed component operations ----

    /// Attaches `T::default()` and returns it.
    pub fn attach<T: Component>(&mut self, entity: Entity) -> Result<&mut T, EcsError> {
        self.insert(entity, T::default())
    }

    /// Attaches `value`. Fails with [`EcsError::DuplicateComponent`] if the
    /// entity already holds a `T`, leaving the existing instance untouched.
    pub fn insert<T: Component>(&mut self, entity: Entity, value: T) -> Result<&mut T, EcsError> {
        self.check_alive(entity)?;
        let ty = self.components.component_type::<T>()?;
        self.components.insert(entity, value)?;
        self.after_attach(entity, ty);
        self.components.get_mut::<T>(entity)
    }

    /// Detaches `T`. Detaching an absent component is a no-op.
    pub fn detach<T: Component>(&mut self, entity: Entity) -> Result<(), EcsError> {
        let ty = self.components.component_type::<T>()?;
        self.detach_component(entity, ty)
    }

    pub fn get<T: Component>(&self, entity: Entity) -> Result<&T, EcsError> {
        self.check_alive(entity)?;
        self.components.get::<T>(entity)
    }

    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T, EcsError> {
        self.check_alive(entity)?;
        self.components.get_mut::<T>(entity)
    }

    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity) && self.components.has::<T>(entity)
    }

    /// Iterates `(entity, &T)` in current membership order.
    pub fn iter<T: Component>(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.components.iter::<T>()
    }

    /// Calls `f` for every instance of `T`.
    pub fn for_each<T: Component>(&self, f: impl FnMut(Entity, &T)) {
        self.components.for_each::<T>(f);
    }

    pub fn components(&self) -> &Components {
        &self.components
    }

    /// Mutable access to component values. Structural changes still go
    /// through the world.
    pub fn components_mut(&mut self) -> &mut Components {
        &mut self.components
    }

    // ---- Processors ----

    /// Registers a processor tracking entities that hold every type in
    /// `required`. Lower `priority` runs first; ties run in registration
    /// order.
    ///
    /// Already finalized entities that satisfy `required` are tracked
    /// immediately, with `on_entity_tracked` fired for each.
    pub fn register_processor(
        &mut self,
        processor: impl Processor,
        required: &[ComponentType],
        priority: i32,
    ) -> Result<ProcessorId, EcsError> {
        for ty in required {
            self.components.storage(*ty)?;
        }
        let id = self
            .processors
            .register(Box::new(processor), required, priority);
        for entity in self.entities.iter_alive() {
            if self.entities.is_finalized(entity) {
                self.processors.seed(
                    id,
                    entity,
                    self.entities.signature(entity),
                    &self.components,
                );
            }
        }
        Ok(id)
    }

    /// Entities currently tracked by a processor, in membership order.
    pub fn tracked(&self, id: ProcessorId) -> Result<&[Entity], EcsError> {
        self.processors
            .tracked(id)
            .ok_or(EcsError::UnknownProcessor(id.index()))
    }

    pub fn is_tracking(&self, id: ProcessorId, entity: Entity) -> bool {
        self.processors.is_tracking(id, entity)
    }

    /// Required component types of a processor, in registration order.
    pub fn required_types(&self, id: ProcessorId) -> Result<Vec<ComponentType>, EcsError> {
        self.processors
            .required(id)
            .map(|bits| bits.ones().map(ComponentType::from_index).collect())
            .ok_or(EcsError::UnknownProcessor(id.index()))
    }

    pub fn processor_count(&self) -> usize {
        self.processors.len()
    }

    /// Runs every processor once, then applies deferred commands.
    pub fn update(&mut self, dt: f32) {
        self.processors.run(
            dt,
            &mut self.components,
            &mut self.commands,
            &mut self.resources,
        );
        self.apply_commands();
    }

    /// Drops every processor after its bulk teardown hook.
    ///
    /// No per-entity untrack callbacks fire.
    pub fn teardown_processors(&mut self) {
        self.processors.teardown();
    }

    // ---- Commands ----

    /// The deferred command buffer.
    pub fn commands(&mut self) -> &mut CommandBuffer {
        &mut self.commands
    }

    /// Applies queued commands, including any they queue in turn.
    ///
    /// A failing command is logged and skipped. Returns how many succeeded.
    pub fn apply_commands(&mut self) -> usize {
        let mut applied = 0;
        loop {
            let batch = self.commands.drain();
            if batch.is_empty() {
                return applied;
            }
            for cmd in batch {
                match cmd(self) {
                    Ok(()) => applied += 1,
                    Err(err) => log::warn!("Deferred command failed: {err}"),
                }
            }
        }
    }

    // ---- Resources ----

    /// Inserts or replaces a resource, returning the previous value.
    pub fn insert_resource<T: 'static>(&mut self, value: T) -> Option<T> {
        self.resources.insert(value)
    }

    pub fn remove_resource<T: 'static>(&mut self) -> Option<T> {
        self.resources.remove()
    }

    pub fn resource<T: 'static>(&self) -> Option<&T> {
        self.resources.get()
    }

    pub fn resource_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.resources.get_mut()
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut Resources {
        &mut self.resources
    }
}
