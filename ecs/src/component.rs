//! Component trait and the component type registry.
//!
//! Every component type is registered once per [`World`](crate::World)
//! under its [`Component::NAME`]. Registration assigns a dense
//! [`ComponentType`] used for fast dispatch; the name is used only by
//! documents and diagnostics.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;

use cobalt_core::data::{DataError, Value};

use crate::error::EcsError;
use crate::inspect::Editable;

/// Trait for components that can be stored in a [`World`](crate::World).
///
/// `Default` is the factory: attaching a component by type creates its
/// default instance. [`load`](Self::load) and [`save`](Self::save) form the
/// persistence contract; every field `save` writes must be read back by
/// `load`, and fields absent from the document take the same values as
/// `Default`.
///
/// # Manual implementation
///
/// ```
/// use cobalt_core::data::{DataError, Value};
/// use cobalt_ecs::Component;
///
/// #[derive(Default)]
/// struct Health(f32);
///
/// impl Component for Health {
///     const NAME: &'static str = "Health";
///
///     fn load(data: &Value) -> Result<Self, DataError> {
///         Ok(Self(data.field_or("value", 100.0, Value::read_f32)?))
///     }
///
///     fn save(&self) -> Value {
///         Value::object([("value", Value::from(self.0))])
///     }
/// }
/// ```
pub trait Component: Default + 'static {
    /// The stable type name used in documents (e.g. `"Transform"`).
    const NAME: &'static str;

    /// Builds an instance from a document node.
    fn load(data: &Value) -> Result<Self, DataError>;

    /// Writes this instance as a document node.
    fn save(&self) -> Value;

    /// Returns the editable view of this component, if it has one.
    fn as_editable(&self) -> Option<&dyn Editable> {
        None
    }

    /// Mutable counterpart of [`as_editable`](Self::as_editable).
    fn as_editable_mut(&mut self) -> Option<&mut dyn Editable> {
        None
    }
}

/// Dense runtime identifier of a registered component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentType(u32);

impl ComponentType {
    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Position of this type in registration order.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentType({})", self.0)
    }
}

/// Registration record of one component type.
#[derive(Debug, Clone)]
pub struct ComponentInfo {
    pub name: &'static str,
    pub type_id: TypeId,
    /// Whether instances expose editable fields.
    pub editable: bool,
}

/// Maps component names and Rust types to [`ComponentType`]s.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    infos: Vec<ComponentInfo>,
    by_name: HashMap<&'static str, ComponentType>,
    by_type: HashMap<TypeId, ComponentType>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T`. Fails if the name or the Rust type is already taken.
    pub fn register<T: Component>(&mut self) -> Result<ComponentType, EcsError> {
        let type_id = TypeId::of::<T>();
        if self.by_name.contains_key(T::NAME) || self.by_type.contains_key(&type_id) {
            return Err(EcsError::DuplicateRegistration(T::NAME));
        }
        let ty = ComponentType::from_index(self.infos.len());
        self.infos.push(ComponentInfo {
            name: T::NAME,
            type_id,
            editable: T::default().as_editable().is_some(),
        });
        self.by_name.insert(T::NAME, ty);
        self.by_type.insert(type_id, ty);
        log::debug!("Registered component '{}' as {}", T::NAME, ty);
        Ok(ty)
    }

    /// Looks a type up by document name.
    pub fn lookup(&self, name: &str) -> Option<ComponentType> {
        self.by_name.get(name).copied()
    }

    /// Looks a type up by Rust type.
    pub fn type_of<T: Component>(&self) -> Result<ComponentType, EcsError> {
        self.by_type
            .get(&TypeId::of::<T>())
            .copied()
            .ok_or(EcsError::ComponentNotRegistered(T::NAME))
    }

    pub fn info(&self, ty: ComponentType) -> Option<&ComponentInfo> {
        self.infos.get(ty.index())
    }

    pub fn name(&self, ty: ComponentType) -> Option<&'static str> {
        self.info(ty).map(|i| i.name)
    }

    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// All registered types in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (ComponentType, &ComponentInfo)> {
        self.infos
            .iter()
            .enumerate()
            .map(|(i, info)| (ComponentType::from_index(i), info))
    }
}
