//! Math type re-exports and tolerance helpers.
//!
//! Vector, quaternion and matrix types come from `glam`. Values that pass
//! through persistence are compared within [`EPSILON`] rather than bit-exact,
//! because loading normalizes some of them (quaternions, clamped colors).

pub use glam::{Mat4, Quat, Vec3, Vec4};

/// Tolerance used when comparing persisted floating point values.
pub const EPSILON: f32 = 1e-5;

/// Returns `true` if `a` and `b` differ by at most [`EPSILON`].
pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() <= EPSILON
}

/// Quaternion comparison that treats `q` and `-q` as the same rotation.
pub fn quat_approx_eq(a: Quat, b: Quat) -> bool {
    a.abs_diff_eq(b, EPSILON) || a.abs_diff_eq(-b, EPSILON)
}

/// A view frustum described by six inward-facing planes.
///
/// Planes are stored as `(normal.xyz, distance)`; a point `p` is inside a
/// plane when `normal.dot(p) + distance >= 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    planes: [Vec4; 6],
}

impl Frustum {
    /// A frustum that contains everything.
    pub const INFINITE: Self = Self {
        planes: [Vec4::new(0.0, 0.0, 0.0, 1.0); 6],
    };

    /// Extracts the frustum planes from a view-projection matrix
    /// (depth range `[0, 1]`).
    pub fn from_view_projection(m: Mat4) -> Self {
        let r0 = m.row(0);
        let r1 = m.row(1);
        let r2 = m.row(2);
        let r3 = m.row(3);
        let planes = [r3 + r0, r3 - r0, r3 + r1, r3 - r1, r2, r3 - r2].map(|p| {
            let len = p.truncate().length();
            if len > 0.0 {
                p / len
            } else {
                p
            }
        });
        Self { planes }
    }

    /// Returns `true` if the sphere is at least partially inside.
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|p| p.truncate().dot(center) + p.w >= -radius)
    }
}

impl Default for Frustum {
    fn default() -> Self {
        Self::INFINITE
    }
}
