//! Local transform component.

use cobalt_core::data::{DataError, Value};
use glam::{Mat4, Quat, Vec3};

use crate::component::Component;
use crate::inspect::{Editable, FieldValue};

/// Position, rotation and scale of an entity.
///
/// Document keys: `position` (default zero), `rotation` (`[x, y, z, w]`,
/// default identity, normalized on load), `scale` (default one).
///
/// # Example
///
/// ```
/// use cobalt_ecs::components::Transform;
/// use glam::{Quat, Vec3};
///
/// let transform = Transform::from_xyz(1.0, 2.0, 3.0)
///     .with_rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2))
///     .with_scale(Vec3::splat(2.0));
/// assert_eq!(transform.position, Vec3::new(1.0, 2.0, 3.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// Identity transform with no translation, no rotation, and uniform scale of 1.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    #[inline]
    pub const fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        Self::from_translation(Vec3::new(x, y, z))
    }

    #[inline]
    pub const fn from_translation(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    #[inline]
    #[must_use]
    pub const fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    #[inline]
    #[must_use]
    pub const fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Model matrix (scale, then rotate, then translate).
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Largest scale component, for bounding-sphere radii.
    pub fn max_scale(&self) -> f32 {
        self.scale.abs().max_element()
    }
}

impl Component for Transform {
    const NAME: &'static str = "Transform";

    fn load(data: &Value) -> Result<Self, DataError> {
        Ok(Self {
            position: data.field_or("position", Vec3::ZERO, Value::read_vec3)?,
            rotation: data.field_or("rotation", Quat::IDENTITY, Value::read_quat)?,
            scale: data.field_or("scale", Vec3::ONE, Value::read_vec3)?,
        })
    }

    fn save(&self) -> Value {
        Value::object([
            ("position", Value::from_vec3(self.position)),
            ("rotation", Value::from_quat(self.rotation)),
            ("scale", Value::from_vec3(self.scale)),
        ])
    }

    fn as_editable(&self) -> Option<&dyn Editable> {
        Some(self)
    }

    fn as_editable_mut(&mut self) -> Option<&mut dyn Editable> {
        Some(self)
    }
}

impl Editable for Transform {
    fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("position", FieldValue::Vec3(self.position)),
            ("rotation", FieldValue::Quat(self.rotation)),
            ("scale", FieldValue::Vec3(self.scale)),
        ]
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> bool {
        match (name, value) {
            ("position", FieldValue::Vec3(v)) => self.position = v,
            ("rotation", FieldValue::Quat(q)) if q.length_squared() > f32::EPSILON => {
                self.rotation = q.normalize()
            }
            ("scale", FieldValue::Vec3(v)) => self.scale = v,
            _ => return false,
        }
        true
    }
}
