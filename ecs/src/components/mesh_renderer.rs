use cobalt_core::data::{DataError, Value};
use cobalt_core::scene::MeshHandle;

use crate::component::Component;
use crate::inspect::{Editable, FieldValue};

/// Draws a mesh with a named material.
///
/// Document keys: `mesh` (mesh slot index, default 0 meaning no mesh),
/// `mesh_generation` (default 1), `material` (default empty, meaning the
/// renderer's default material).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshRenderer {
    pub mesh: MeshHandle,
    pub material: String,
}

impl MeshRenderer {
    pub fn new(mesh: MeshHandle, material: impl Into<String>) -> Self {
        Self {
            mesh,
            material: material.into(),
        }
    }
}

impl Component for MeshRenderer {
    const NAME: &'static str = "MeshRenderer";

    fn load(data: &Value) -> Result<Self, DataError> {
        let index = data.field_or("mesh", 0, Value::read_u32)?;
        let mesh = if index == 0 {
            MeshHandle::NULL
        } else {
            MeshHandle::from_parts(index, data.field_or("mesh_generation", 1, Value::read_u32)?)
        };
        let material = data.field_or("material", String::new(), |v, key| {
            v.read_str(key).map(str::to_owned)
        })?;
        Ok(Self { mesh, material })
    }

    fn save(&self) -> Value {
        let mut out = Value::object([("mesh", Value::from(self.mesh.index()))]);
        if !self.mesh.is_null() {
            out.insert("mesh_generation", Value::from(self.mesh.generation()));
        }
        out.insert("material", Value::from(self.material.as_str()));
        out
    }

    fn as_editable(&self) -> Option<&dyn Editable> {
        Some(self)
    }

    fn as_editable_mut(&mut self) -> Option<&mut dyn Editable> {
        Some(self)
    }
}

impl Editable for MeshRenderer {
    fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![("material", FieldValue::Text(self.material.clone()))]
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> bool {
        match (name, value) {
            ("material", FieldValue::Text(s)) => {
                self.material = s;
                true
            }
            _ => false,
        }
    }
}
