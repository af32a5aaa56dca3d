//! Entity and scene documents.
//!
//! An entity document lists its components by registered name:
//!
//! ```json
//! { "components": { "Transform": { "position": [0, 1, 0] }, "Spin": {} } }
//! ```
//!
//! A scene document is `{ "entities": [ <entity>, ... ] }`.
//!
//! Loading is all-or-nothing. Entities are built invisible to processors
//! and only finalized once the whole document loaded; on any failure every
//! entity created by the call is destroyed again and the error returned.

use cobalt_core::data::{DataError, Value};

use crate::entity::Entity;
use crate::error::EcsError;
use crate::world::World;

/// What to do with component names no type is registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownComponents {
    /// Fail the load with [`EcsError::UnknownComponentName`].
    #[default]
    Error,
    /// Log a warning and ignore the component.
    Skip,
}

impl World {
    /// Creates, loads and finalizes one entity from a document.
    pub fn load_entity(&mut self, doc: &Value) -> Result<Entity, EcsError> {
        self.load_entity_with(doc, UnknownComponents::Error)
    }

    /// [`load_entity`](Self::load_entity) with an explicit unknown-name policy.
    pub fn load_entity_with(
        &mut self,
        doc: &Value,
        unknown: UnknownComponents,
    ) -> Result<Entity, EcsError> {
        let entity = self.build_entity(doc, unknown)?;
        self.finalize_entity(entity)?;
        Ok(entity)
    }

    /// Writes `{"components": {...}}` with one entry per held component, in
    /// registration order.
    pub fn save_entity(&self, entity: Entity) -> Result<Value, EcsError> {
        let mut components = Value::empty_map();
        for ty in self.component_types_of(entity)? {
            let name = self
                .registry()
                .name(ty)
                .ok_or(EcsError::ComponentNotRegistered("<unknown>"))?;
            components.insert(name, self.save_component(entity, ty)?);
        }
        Ok(Value::object([("components", components)]))
    }

    /// Loads every entity of a scene document.
    pub fn load_scene(&mut self, doc: &Value) -> Result<Vec<Entity>, EcsError> {
        self.load_scene_with(doc, UnknownComponents::Error)
    }

    /// [`load_scene`](Self::load_scene) with an explicit unknown-name policy.
    pub fn load_scene_with(
        &mut self,
        doc: &Value,
        unknown: UnknownComponents,
    ) -> Result<Vec<Entity>, EcsError> {
        let list = doc.field("entities", Value::read_list)?;
        let mut built = Vec::with_capacity(list.len());
        for item in list {
            match self.build_entity(item, unknown) {
                Ok(entity) => built.push(entity),
                Err(err) => {
                    self.rollback(&built);
                    return Err(err);
                }
            }
        }
        for &entity in &built {
            self.finalize_entity(entity)?;
        }
        log::debug!("Loaded scene with {} entities", built.len());
        Ok(built)
    }

    /// Writes a scene document for every finalized entity, in slot order.
    pub fn save_scene(&self) -> Result<Value, EcsError> {
        let entities = self
            .iter_entities()
            .filter(|&e| self.is_finalized(e))
            .map(|e| self.save_entity(e))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::object([("entities", Value::List(entities))]))
    }

    /// Creates and loads an entity without finalizing it. Destroys it again
    /// on failure.
    fn build_entity(&mut self, doc: &Value, unknown: UnknownComponents) -> Result<Entity, EcsError> {
        let entity = self.create_entity();
        if let Err(err) = self.fill_entity(entity, doc, unknown) {
            self.rollback(&[entity]);
            return Err(err);
        }
        Ok(entity)
    }

    fn fill_entity(
        &mut self,
        entity: Entity,
        doc: &Value,
        unknown: UnknownComponents,
    ) -> Result<(), EcsError> {
        let components = match doc.get("components") {
            Some(node) => node.expect_map("components")?,
            None => return Err(DataError::MissingField {
                field: "components".to_owned(),
            }
            .into()),
        };
        for (name, data) in components {
            let ty = match self.lookup_component(name) {
                Ok(ty) => ty,
                Err(err) if unknown == UnknownComponents::Skip => {
                    log::warn!("Skipping component: {err}");
                    continue;
                }
                Err(err) => return Err(err),
            };
            self.attach_component(entity, ty)?;
            self.load_component(entity, ty, data)?;
        }
        Ok(())
    }

    fn rollback(&mut self, entities: &[Entity]) {
        for &entity in entities {
            if let Err(err) = self.destroy_entity(entity) {
                log::error!("Rollback failed for {entity}: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Color, Name, Transform};
    use crate::register_stock_components;
    use cobalt_core::data::{decode, Format};
    use glam::Vec3;

    fn world() -> World {
        let mut world = World::new();
        register_stock_components(&mut world).unwrap();
        world
    }

    #[test]
    fn load_entity_applies_defaults() {
        let mut world = world();
        let doc: Value = decode(
            r#"{"components": {"Transform": {"position": [1, 2, 3]}, "Name": {"value": "crate"}}}"#,
            Format::Json,
        )
        .unwrap();
        let e = world.load_entity(&doc).unwrap();

        let t = world.get::<Transform>(e).unwrap();
        assert_eq!(t.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(world.get::<Name>(e).unwrap().as_str(), "crate");
        assert!(world.is_finalized(e));
    }

    #[test]
    fn malformed_component_leaves_no_entity() {
        let mut world = world();
        let doc: Value = decode(
            r#"{"components": {"Name": {"value": "x"}, "Color": {"value": [1, 0]}}}"#,
            Format::Json,
        )
        .unwrap();
        let err = world.load_entity(&doc).unwrap_err();
        assert!(matches!(err, EcsError::Data { .. }));
        assert_eq!(world.entity_count(), 0);
        assert_eq!(world.iter::<Name>().count(), 0);
    }

    #[test]
    fn unknown_component_policy() {
        let mut world = world();
        let doc: Value =
            decode(r#"{"components": {"Ghost": {}, "Color": {}}}"#, Format::Json).unwrap();
        assert!(matches!(
            world.load_entity(&doc),
            Err(EcsError::UnknownComponentName(name)) if name == "Ghost"
        ));
        assert_eq!(world.entity_count(), 0);

        let e = world
            .load_entity_with(&doc, UnknownComponents::Skip)
            .unwrap();
        assert!(world.has::<Color>(e));
    }

    #[test]
    fn scene_failure_rolls_back_earlier_entities() {
        let mut world = world();
        let existing = world.create_entity();
        world.finalize_entity(existing).unwrap();

        let doc: Value = decode(
            r#"{"entities": [
                {"components": {"Name": {"value": "a"}}},
                {"components": {"Transform": {"rotation": [0, 0, 0, 0]}}}
            ]}"#,
            Format::Json,
        )
        .unwrap();
        assert!(world.load_scene(&doc).is_err());
        assert_eq!(world.entity_count(), 1);
        assert!(world.is_alive(existing));
    }

    #[test]
    fn scene_round_trip() {
        let mut world = world();
        let e = world.create_entity();
        world
            .insert(e, Transform::from_translation(Vec3::new(4.0, 0.0, 0.0)))
            .unwrap();
        world.insert(e, Name::new("box")).unwrap();
        world.finalize_entity(e).unwrap();

        let saved = world.save_scene().unwrap();
        let mut other = self::world();
        let loaded = other.load_scene(&saved).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(
            other.get::<Transform>(loaded[0]).unwrap().position,
            Vec3::new(4.0, 0.0, 0.0)
        );
        assert_eq!(other.save_scene().unwrap(), saved);
    }

    #[test]
    fn missing_components_key_is_an_error() {
        let mut world = world();
        let err = world.load_entity(&Value::empty_map()).unwrap_err();
        assert!(matches!(
            err,
            EcsError::Document(DataError::MissingField { .. })
        ));
    }
}
