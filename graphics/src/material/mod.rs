//! Material resolution.
//!
//! Materials are resolved once, when registered. The result maps each pass
//! identifier to the resources bound above that pass's first free stage.

mod definition;
mod resolver;

pub use definition::{MaterialDefinition, MaterialPassDefinition, MaterialResource};
pub use resolver::{BoundResource, MaterialResolver, PassBinding, PassMaterial};
