//! Processors and the runtime that keeps their tracked sets current.
//!
//! A processor declares a required set of component types when it is
//! registered. The runtime keeps, per processor, the set of finalized
//! entities holding every required type. The set is maintained
//! incrementally: an attach or detach of type `T` only re-tests the
//! processors whose required set contains `T`, and only for the affected
//! entity.
//!
//! `on_entity_tracked` / `on_entity_untracked` fire exactly once per
//! membership transition. Events that leave membership unchanged fire
//! nothing.

use fixedbitset::FixedBitSet;

use crate::commands::CommandBuffer;
use crate::component::ComponentType;
use crate::entity::Entity;
use crate::resource::Resources;
use crate::sparse_set::SparseSet;
use crate::store::Components;

/// Identifies a registered processor within its world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessorId(u32);

impl ProcessorId {
    pub const fn index(self) -> u32 {
        self.0
    }
}

/// Everything a processor may touch during [`Processor::update`].
pub struct ProcessorContext<'a> {
    /// Seconds since the previous update.
    pub dt: f32,
    /// Entities currently tracked by this processor, in membership order.
    pub tracked: &'a [Entity],
    /// Component values. Structural changes go through `commands`.
    pub components: &'a mut Components,
    /// Deferred structural changes, applied after all processors ran.
    pub commands: &'a mut CommandBuffer,
    pub resources: &'a mut Resources,
}

/// A per-frame system operating on the entities that hold a fixed set of
/// component types.
///
/// Callbacks receive the component store read-only, and may not keep any
/// reference past the call.
pub trait Processor: 'static {
    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// `entity` just started satisfying the required set.
    fn on_entity_tracked(&mut self, _entity: Entity, _components: &Components) {}

    /// `entity` stopped satisfying the required set, or is being destroyed.
    /// Its components are still readable.
    fn on_entity_untracked(&mut self, _entity: Entity, _components: &Components) {}

    /// Runs once per world update.
    fn update(&mut self, ctx: &mut ProcessorContext<'_>);

    /// The processor is being torn down with `tracked` entities still in its
    /// set. No per-entity callbacks follow.
    fn on_teardown(&mut self, _tracked: usize) {}
}

struct ProcessorEntry {
    processor: Box<dyn Processor>,
    required: FixedBitSet,
    tracked: SparseSet<()>,
    priority: i32,
}

impl ProcessorEntry {
    fn matches(&self, signature: &FixedBitSet) -> bool {
        self.required.is_subset(signature)
    }

    /// Applies one membership decision. Fires a callback only on transition.
    fn set_membership(&mut self, entity: Entity, member: bool, components: &Components) {
        let tracked = self.tracked.contains(entity);
        if member && !tracked {
            let _ = self.tracked.insert(entity, ());
            self.processor.on_entity_tracked(entity, components);
        } else if !member && tracked {
            self.tracked.remove(entity);
            self.processor.on_entity_untracked(entity, components);
        }
    }
}

/// Registered processors, their tracked sets and their update order.
#[derive(Default)]
pub(crate) struct ProcessorRuntime {
    /// Indexed by [`ProcessorId`]; `None` after teardown.
    entries: Vec<Option<ProcessorEntry>>,
    /// Entry indices sorted by `(priority, registration order)`.
    order: Vec<usize>,
    /// Per component type, the processors whose required set contains it.
    interest: Vec<Vec<usize>>,
}

impl ProcessorRuntime {
    pub fn register(
        &mut self,
        processor: Box<dyn Processor>,
        required: &[ComponentType],
        priority: i32,
    ) -> ProcessorId {
        let index = self.entries.len();
        let mut bits = FixedBitSet::new();
        for ty in required {
            bits.grow(ty.index() + 1);
            bits.insert(ty.index());
            if self.interest.len() <= ty.index() {
                self.interest.resize_with(ty.index() + 1, Vec::new);
            }
            let interested = &mut self.interest[ty.index()];
            if !interested.contains(&index) {
                interested.push(index);
            }
        }

        log::debug!(
            "Registered processor '{}' (priority {priority}, {} required types)",
            processor.name(),
            bits.count_ones(..)
        );
        self.entries.push(Some(ProcessorEntry {
            processor,
            required: bits,
            tracked: SparseSet::new(),
            priority,
        }));

        // Stable: equal priorities keep registration order.
        let entries = &self.entries;
        let key = |i: usize| entries[i].as_ref().map_or(i32::MAX, |e| e.priority);
        let pos = self.order.partition_point(|&i| key(i) <= priority);
        self.order.insert(pos, index);

        ProcessorId(index as u32)
    }

    /// Tests a newly registered processor against one existing entity.
    pub fn seed(
        &mut self,
        id: ProcessorId,
        entity: Entity,
        signature: &FixedBitSet,
        components: &Components,
    ) {
        if let Some(Some(entry)) = self.entries.get_mut(id.0 as usize) {
            let member = entry.matches(signature);
            entry.set_membership(entity, member, components);
        }
    }

    /// Entity became visible: test it against every processor.
    pub fn entity_finalized(
        &mut self,
        entity: Entity,
        signature: &FixedBitSet,
        components: &Components,
    ) {
        for &i in &self.order {
            if let Some(entry) = self.entries[i].as_mut() {
                let member = entry.matches(signature);
                entry.set_membership(entity, member, components);
            }
        }
    }

    /// Type `ty` was attached to or detached from `entity`; `signature` is
    /// the entity's new signature. Only processors interested in `ty` are
    /// re-tested.
    pub fn component_changed(
        &mut self,
        entity: Entity,
        ty: ComponentType,
        signature: &FixedBitSet,
        components: &Components,
    ) {
        let Some(interested) = self.interest.get(ty.index()) else {
            return;
        };
        for &i in interested {
            if let Some(entry) = self.entries[i].as_mut() {
                let member = entry.matches(signature);
                entry.set_membership(entity, member, components);
            }
        }
    }

    /// Entity is about to be destroyed: untrack it everywhere.
    pub fn entity_destroying(&mut self, entity: Entity, components: &Components) {
        for &i in &self.order {
            if let Some(entry) = self.entries[i].as_mut() {
                entry.set_membership(entity, false, components);
            }
        }
    }

    /// Runs every processor's update in order.
    pub fn run(
        &mut self,
        dt: f32,
        components: &mut Components,
        commands: &mut CommandBuffer,
        resources: &mut Resources,
    ) {
        for &i in &self.order {
            let Some(entry) = self.entries[i].as_mut() else {
                continue;
            };
            log::trace!("Updating processor '{}'", entry.processor.name());
            let mut ctx = ProcessorContext {
                dt,
                tracked: entry.tracked.entities(),
                components: &mut *components,
                commands: &mut *commands,
                resources: &mut *resources,
            };
            entry.processor.update(&mut ctx);
        }
    }

    pub fn tracked(&self, id: ProcessorId) -> Option<&[Entity]> {
        self.entries
            .get(id.0 as usize)?
            .as_ref()
            .map(|e| e.tracked.entities())
    }

    pub fn is_tracking(&self, id: ProcessorId, entity: Entity) -> bool {
        self.entries
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .is_some_and(|e| e.tracked.contains(entity))
    }

    pub fn required(&self, id: ProcessorId) -> Option<&FixedBitSet> {
        self.entries
            .get(id.0 as usize)?
            .as_ref()
            .map(|e| &e.required)
    }

    /// Number of live processors.
    pub fn len(&self) -> usize {
        self.entries.iter().flatten().count()
    }

    /// Drops every processor after its bulk teardown hook. Tracked sets are
    /// discarded without per-entity callbacks.
    pub fn teardown(&mut self) {
        for &i in self.order.iter().rev() {
            if let Some(mut entry) = self.entries[i].take() {
                log::debug!("Tearing down processor '{}'", entry.processor.name());
                entry.processor.on_teardown(entry.tracked.len());
                entry.tracked.clear();
            }
        }
        self.order.clear();
        for interested in &mut self.interest {
            interested.clear();
        }
    }
}
