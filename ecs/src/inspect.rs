//! Editable-field capability for components.
//!
//! Tools read and write component fields through the closed [`FieldValue`]
//! variant instead of downcasting component data. A component opts in by
//! implementing [`Editable`] and returning itself from
//! [`Component::as_editable`](crate::Component::as_editable).

use glam::{Quat, Vec3, Vec4};

/// A single field value exposed to tools.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f32),
    Vec3(Vec3),
    Vec4(Vec4),
    Quat(Quat),
    Text(String),
}

impl FieldValue {
    /// Short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Float(_) => "float",
            FieldValue::Vec3(_) => "vec3",
            FieldValue::Vec4(_) => "vec4",
            FieldValue::Quat(_) => "quat",
            FieldValue::Text(_) => "text",
        }
    }
}

/// Components whose fields can be listed and edited by name.
pub trait Editable {
    /// Current field values in display order.
    fn fields(&self) -> Vec<(&'static str, FieldValue)>;

    /// Writes one field. Returns `false` if the name is unknown or the value
    /// has the wrong variant; the component is left unchanged in that case.
    fn set_field(&mut self, name: &str, value: FieldValue) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Knob(f32);

    impl Editable for Knob {
        fn fields(&self) -> Vec<(&'static str, FieldValue)> {
            vec![("value", FieldValue::Float(self.0))]
        }

        fn set_field(&mut self, name: &str, value: FieldValue) -> bool {
            match (name, value) {
                ("value", FieldValue::Float(v)) => {
                    self.0 = v;
                    true
                }
                _ => false,
            }
        }
    }

    #[test]
    fn set_field_rejects_wrong_variant() {
        let mut knob = Knob(1.0);
        assert!(!knob.set_field("value", FieldValue::Text("x".into())));
        assert!(!knob.set_field("other", FieldValue::Float(2.0)));
        assert!(knob.set_field("value", FieldValue::Float(3.0)));
        assert_eq!(knob.fields(), vec![("value", FieldValue::Float(3.0))]);
    }
}
