use crate::component::Component;
use crate::entity::Entity;
use crate::error::EcsError;
use crate::world::World;

/// A boxed command closure that mutates the world.
type Command = Box<dyn FnOnce(&mut World) -> Result<(), EcsError>>;

/// A boxed insert closure that inserts a component into a specific entity.
type InsertFn = Box<dyn FnOnce(&mut World, Entity) -> Result<(), EcsError>>;

/// A buffer of deferred structural changes.
///
/// Processors may not create or destroy entities, or attach and detach
/// components, while the runtime iterates their tracked sets. They queue
/// those changes here instead; [`World::update`] applies them after every
/// processor has run.
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
/// world
///     .commands()
///     .create_entity()
///     .with(Transform::IDENTITY)
///     .with(Spin::default())
///     .build();
/// assert_eq!(world.apply_commands(), 1);
/// assert_eq!(world.entity_count(), 1);
/// ```
#[derive(Default)]
pub struct CommandBuffer {
    commands: Vec<Command>,
}

impl CommandBuffer {
    /// Creates a new empty command buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a raw command closure.
    pub fn push(&mut self, cmd: impl FnOnce(&mut World) -> Result<(), EcsError> + 'static) {
        self.commands.push(Box::new(cmd));
    }

    /// Queues an entity destruction.
    pub fn destroy(&mut self, entity: Entity) {
        self.push(move |world| world.destroy_entity(entity));
    }

    /// Queues a component insertion on an entity.
    pub fn insert<T: Component>(&mut self, entity: Entity, component: T) {
        self.push(move |world| world.insert(entity, component).map(|_| ()));
    }

    /// Queues a component removal from an entity.
    pub fn detach<T: Component>(&mut self, entity: Entity) {
        self.push(move |world| world.detach::<T>(entity));
    }

    /// Begins building a command that creates and finalizes an entity.
    pub fn create_entity(&mut self) -> SpawnBuilder<'_> {
        SpawnBuilder {
            buffer: self,
            inserts: Vec::new(),
        }
    }

    /// Drains all queued commands, returning them.
    pub(crate) fn drain(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    /// Returns the number of queued commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Builder for creating an entity with multiple components.
///
/// Created by [`CommandBuffer::create_entity`]. The entity is created, all
/// components are inserted and the entity is finalized in a single command
/// when [`build`](SpawnBuilder::build) is called. If any insertion fails the
/// entity is destroyed again.
pub struct SpawnBuilder<'a> {
    buffer: &'a mut CommandBuffer,
    inserts: Vec<InsertFn>,
}

impl SpawnBuilder<'_> {
    /// Adds a component to the entity being built.
    pub fn with<T: Component>(mut self, component: T) -> Self {
        self.inserts.push(Box::new(move |world, entity| {
            world.insert(entity, component).map(|_| ())
        }));
        self
    }

    /// Finalizes the builder, queuing the create command.
    pub fn build(self) {
        let inserts = self.inserts;
        self.buffer.push(move |world| {
            let entity = world.create_entity();
            for insert_fn in inserts {
                if let Err(err) = insert_fn(world, entity) {
                    world.destroy_entity(entity)?;
                    return Err(err);
                }
            }
            world.finalize_entity(entity)
        });
    }
}
