use cobalt_core::data::{DataError, Value};
use cobalt_core::scene::LightKind;
use glam::Vec3;

use crate::component::Component;
use crate::inspect::{Editable, FieldValue};

/// A light source.
///
/// Document keys: `kind` (`"directional"`, `"point"` or `"spot"`, default
/// point), `color` (linear RGB, default white), `intensity` (default 1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub color: Vec3,
    pub intensity: f32,
}

impl Light {
    pub fn new(kind: LightKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }
}

impl Default for Light {
    fn default() -> Self {
        Self {
            kind: LightKind::Point,
            color: Vec3::ONE,
            intensity: 1.0,
        }
    }
}

impl Component for Light {
    const NAME: &'static str = "Light";

    fn load(data: &Value) -> Result<Self, DataError> {
        Ok(Self {
            kind: data.field_or("kind", LightKind::Point, |v, key| {
                LightKind::parse(key, v.read_str(key)?)
            })?,
            color: data.field_or("color", Vec3::ONE, Value::read_vec3)?,
            intensity: data.field_or("intensity", 1.0, Value::read_f32)?,
        })
    }

    fn save(&self) -> Value {
        Value::object([
            ("kind", Value::from(self.kind.as_str())),
            ("color", Value::from_vec3(self.color)),
            ("intensity", Value::from(self.intensity)),
        ])
    }

    fn as_editable(&self) -> Option<&dyn Editable> {
        Some(self)
    }

    fn as_editable_mut(&mut self) -> Option<&mut dyn Editable> {
        Some(self)
    }
}

impl Editable for Light {
    fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("kind", FieldValue::Text(self.kind.as_str().to_owned())),
            ("color", FieldValue::Vec3(self.color)),
            ("intensity", FieldValue::Float(self.intensity)),
        ]
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> bool {
        match (name, value) {
            ("kind", FieldValue::Text(s)) => match LightKind::parse("kind", &s) {
                Ok(kind) => self.kind = kind,
                Err(_) => return false,
            },
            ("color", FieldValue::Vec3(v)) => self.color = v,
            ("intensity", FieldValue::Float(f)) => self.intensity = f,
            _ => return false,
        }
        true
    }
}
