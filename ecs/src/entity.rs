//! Entity identity and per-entity bookkeeping.

use cobalt_core::handle::{Handle, HandleAllocator};
use fixedbitset::FixedBitSet;

use crate::component::ComponentType;

/// Handle category for entities.
pub enum EntityCategory {}

/// An opaque entity identifier.
///
/// Entities carry no state of their own; everything lives in components.
/// The handle is generational, so a destroyed entity's handle is rejected
/// even after its slot is reused.
pub type Entity = Handle<EntityCategory>;

#[derive(Default)]
struct EntityRecord {
    /// Bit `t` is set when the entity holds component type `t`.
    signature: FixedBitSet,
    /// Visible to processors.
    finalized: bool,
}

/// Allocates entities and tracks which component types each one holds.
#[derive(Default)]
pub(crate) struct EntityTable {
    allocator: HandleAllocator<EntityCategory>,
    /// Indexed by entity slot index.
    records: Vec<EntityRecord>,
}

impl EntityTable {
    pub fn create(&mut self) -> Entity {
        let entity = self.allocator.allocate();
        let idx = entity.index() as usize;
        if idx >= self.records.len() {
            self.records.resize_with(idx + 1, EntityRecord::default);
        }
        self.records[idx] = EntityRecord::default();
        entity
    }

    /// Releases the handle. The caller removes components first.
    pub fn release(&mut self, entity: Entity) -> bool {
        if !self.allocator.release(entity) {
            return false;
        }
        self.records[entity.index() as usize] = EntityRecord::default();
        true
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.allocator.is_live(entity)
    }

    pub fn len(&self) -> usize {
        self.allocator.len()
    }

    pub fn iter_alive(&self) -> impl Iterator<Item = Entity> + '_ {
        self.allocator.iter_live()
    }

    pub fn signature(&self, entity: Entity) -> &FixedBitSet {
        &self.records[entity.index() as usize].signature
    }

    pub fn has(&self, entity: Entity, ty: ComponentType) -> bool {
        self.signature(entity).contains(ty.index())
    }

    pub fn set_bit(&mut self, entity: Entity, ty: ComponentType, present: bool) {
        let sig = &mut self.records[entity.index() as usize].signature;
        if present {
            sig.grow(ty.index() + 1);
            sig.insert(ty.index());
        } else if ty.index() < sig.len() {
            sig.set(ty.index(), false);
        }
    }

    pub fn is_finalized(&self, entity: Entity) -> bool {
        self.records[entity.index() as usize].finalized
    }

    pub fn set_finalized(&mut self, entity: Entity) {
        self.records[entity.index() as usize].finalized = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_tracks_bits() {
        let mut table = EntityTable::default();
        let e = table.create();
        let ty = ComponentType::from_index(5);
        assert!(!table.has(e, ty));
        table.set_bit(e, ty, true);
        assert!(table.has(e, ty));
        table.set_bit(e, ty, false);
        assert!(!table.has(e, ty));
        // Clearing a bit beyond the current length is a no-op.
        table.set_bit(e, ComponentType::from_index(40), false);
    }

    #[test]
    fn recycled_slot_starts_clean() {
        let mut table = EntityTable::default();
        let a = table.create();
        table.set_bit(a, ComponentType::from_index(0), true);
        table.set_finalized(a);
        assert!(table.release(a));

        let b = table.create();
        assert_eq!(a.index(), b.index());
        assert!(!table.is_alive(a));
        assert!(!table.is_finalized(b));
        assert!(table.signature(b).is_clear());
    }
}
