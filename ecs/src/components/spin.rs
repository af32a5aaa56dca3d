use cobalt_core::data::{DataError, Value};
use glam::Vec3;

use crate::component::Component;
use crate::inspect::{Editable, FieldValue};

/// Constant angular velocity, in radians per second around each axis.
///
/// Document key: `torque` (default zero).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Spin {
    pub torque: Vec3,
}

impl Spin {
    pub const fn new(torque: Vec3) -> Self {
        Self { torque }
    }
}

impl Component for Spin {
    const NAME: &'static str = "Spin";

    fn load(data: &Value) -> Result<Self, DataError> {
        Ok(Self::new(data.field_or("torque", Vec3::ZERO, Value::read_vec3)?))
    }

    fn save(&self) -> Value {
        Value::object([("torque", Value::from_vec3(self.torque))])
    }

    fn as_editable(&self) -> Option<&dyn Editable> {
        Some(self)
    }

    fn as_editable_mut(&mut self) -> Option<&mut dyn Editable> {
        Some(self)
    }
}

impl Editable for Spin {
    fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![("torque", FieldValue::Vec3(self.torque))]
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> bool {
        match (name, value) {
            ("torque", FieldValue::Vec3(v)) => {
                self.torque = v;
                true
            }
            _ => false,
        }
    }
}
