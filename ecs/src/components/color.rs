use cobalt_core::data::{DataError, Value};
use glam::Vec4;

use crate::component::Component;
use crate::inspect::{Editable, FieldValue};

/// RGBA color. Channels are clamped to `[0, 1]` on load and on edit.
///
/// Document key: `value` (`[r, g, b, a]`, default opaque white).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub value: Vec4,
}

impl Color {
    pub const WHITE: Self = Self { value: Vec4::ONE };

    /// Builds a color, clamping every channel.
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self {
            value: Vec4::new(r, g, b, a).clamp(Vec4::ZERO, Vec4::ONE),
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Component for Color {
    const NAME: &'static str = "Color";

    fn load(data: &Value) -> Result<Self, DataError> {
        let v = data.field_or("value", Vec4::ONE, Value::read_vec4)?;
        Ok(Self::new(v.x, v.y, v.z, v.w))
    }

    fn save(&self) -> Value {
        Value::object([("value", Value::from_vec4(self.value))])
    }

    fn as_editable(&self) -> Option<&dyn Editable> {
        Some(self)
    }

    fn as_editable_mut(&mut self) -> Option<&mut dyn Editable> {
        Some(self)
    }
}

impl Editable for Color {
    fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![("value", FieldValue::Vec4(self.value))]
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> bool {
        match (name, value) {
            ("value", FieldValue::Vec4(v)) => {
                *self = Self::new(v.x, v.y, v.z, v.w);
                true
            }
            _ => false,
        }
    }
}
