//! # Cobalt ECS
//!
//! Entity-Component storage with incrementally maintained processor queries.
//!
//! ## Core Types
//!
//! - [`Entity`] — Generational entity identifier
//! - [`World`] — Owns entities, components, processors, commands and resources
//! - [`Component`] — Data attached to entities, with load/save contract
//! - [`Components`] — Per-type dense storage, the view processors receive
//! - [`SparseSet`] — The dense storage behind every component type
//!
//! ## Processors
//!
//! - [`Processor`] — Per-frame system over a fixed component-type set
//! - [`ProcessorContext`] — What a processor may touch during `update`
//! - [`CommandBuffer`] — Structural changes deferred past the update loop
//!
//! ## Persistence & Tools
//!
//! - [`World::load_entity`] / [`World::save_entity`] — entity documents
//! - [`World::load_scene`] / [`World::save_scene`] — scene documents
//! - [`Editable`] / [`FieldValue`] — field-level editing capability

mod commands;
pub mod component;
pub mod components;
mod entity;
mod error;
mod inspect;
mod processor;
mod resource;
mod scene;
mod sparse_set;
mod store;
mod world;

pub use commands::{CommandBuffer, SpawnBuilder};
pub use component::{Component, ComponentInfo, ComponentRegistry, ComponentType};
pub use components::register_stock_components;
pub use entity::{Entity, EntityCategory};
pub use error::EcsError;
pub use inspect::{Editable, FieldValue};
pub use processor::{Processor, ProcessorContext, ProcessorId};
pub use resource::Resources;
pub use scene::UnknownComponents;
pub use sparse_set::SparseSet;
pub use store::Components;
pub use world::World;

/// ECS library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Logs the crate version.
pub fn init() {
    log::info!("Cobalt ECS v{} initialized", VERSION);
}
