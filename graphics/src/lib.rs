//! # Cobalt Graphics
//!
//! Shader pass graphs and material resolution for the Cobalt engine.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`ShaderPassGraph`] - A shader as ordered blocks of forward, deferred and compute passes
//! - [`MaterialResolver`] - Per-pass material resources, resolved once at registration
//! - [`Renderer`] - Walks a graph per frame and feeds a [`GraphicsContext`]
//! - [`RecordingContext`] - A context that records instead of drawing, for tests
//!
//! ## Example
//!
//! ```ignore
//! use cobalt_graphics::{FrameContext, Renderer, RecordingContext};
//!
//! let renderer = Renderer::new().with_default_material("default");
//! let mut ctx = RecordingContext::new();
//! let stats = renderer.render(&graph, &resolver, &frame, &queue, &mut ctx);
//! ```

pub mod device;
pub mod error;
pub mod frame;
pub mod material;
pub mod render_state;
pub mod renderer;
pub mod resource;
pub mod shader;

pub use device::{GraphicsContext, RecordedCommand, RecordingContext, Submission};
pub use error::{MaterialError, ShaderError};
pub use frame::FrameContext;
pub use material::{MaterialDefinition, MaterialResolver, PassBinding, PassMaterial};
pub use render_state::{RenderState, RenderStateCache, RenderStateDesc, RenderStateHandle};
pub use renderer::{DrawCall, DrawQueue, FrameStats, Renderer};
pub use resource::{ResourceCatalog, ResourceHandle, ResourceKind};
pub use shader::{Mode, PassId, ShaderDefinition, ShaderPassGraph};

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the graphics subsystem.
pub fn init() {
    log::info!("Cobalt Graphics v{} initialized", VERSION);
}
