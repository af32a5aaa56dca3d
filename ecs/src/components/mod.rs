//! Stock component types.

mod color;
mod light;
mod mesh_renderer;
mod name;
mod spin;
mod transform;

pub use color::Color;
pub use light::Light;
pub use mesh_renderer::MeshRenderer;
pub use name::Name;
pub use spin::Spin;
pub use transform::Transform;

use crate::error::EcsError;
use crate::world::World;

/// Registers every stock component type with `world`.
pub fn register_stock_components(world: &mut World) -> Result<(), EcsError> {
    world.register_component::<Transform>()?;
    world.register_component::<Color>()?;
    world.register_component::<Spin>()?;
    world.register_component::<Name>()?;
    world.register_component::<Light>()?;
    world.register_component::<MeshRenderer>()?;
    Ok(())
}
