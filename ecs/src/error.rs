//! Error type for entity and component operations.

use cobalt_core::data::DataError;
use thiserror::Error;

use crate::entity::Entity;

/// Errors returned by [`World`](crate::World) and its stores.
///
/// All variants except [`EcsError::Data`] are programmer errors: the caller
/// used a dead handle, an unregistered type, or broke a uniqueness rule.
#[derive(Debug, Error)]
pub enum EcsError {
    /// The entity was never created or has already been destroyed.
    #[error("invalid entity {0}")]
    InvalidEntity(Entity),

    /// The entity already holds a component of this type.
    #[error("entity {entity} already has component '{component}'")]
    DuplicateComponent {
        entity: Entity,
        component: &'static str,
    },

    /// A required component lookup found nothing.
    #[error("entity {entity} has no component '{component}'")]
    ComponentNotFound {
        entity: Entity,
        component: &'static str,
    },

    /// The component type was used before being registered.
    #[error("component type '{0}' is not registered")]
    ComponentNotRegistered(&'static str),

    /// A component name was registered twice.
    #[error("component '{0}' is already registered")]
    DuplicateRegistration(&'static str),

    /// A document named a component type nobody registered.
    #[error("unknown component name '{0}'")]
    UnknownComponentName(String),

    /// The component type does not expose editable fields.
    #[error("component '{0}' is not editable")]
    NotEditable(&'static str),

    /// An editable field does not exist or rejected the value.
    #[error("component '{component}' has no field '{field}' accepting {value_kind}")]
    InvalidField {
        component: &'static str,
        field: String,
        value_kind: &'static str,
    },

    /// A processor id that was never issued, or was dropped by teardown.
    #[error("unknown processor {0}")]
    UnknownProcessor(u32),

    /// Component data failed to load.
    #[error("failed to load '{component}': {source}")]
    Data {
        component: String,
        #[source]
        source: DataError,
    },

    /// A document was malformed above the component level.
    #[error(transparent)]
    Document(#[from] DataError),
}
