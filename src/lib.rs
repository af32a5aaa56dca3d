//! Cobalt Engine - ECS processors driving shader pass graphs
//!
//! The engine aggregate owns every subsystem explicitly:
//! - [`World`](cobalt_ecs::World) with its processors, resources and deferred commands
//! - Shader pass graphs, the material resolver and the renderer
//! - A worker pool used only for background asset loading
//!
//! # Frame
//! 1. The world updates every processor in priority order
//! 2. The frame signal fires with the frame number and delta time
//! 3. Every registered shader renders the extracted draw queue

pub mod asset_loader;
pub mod engine;
pub mod processors;

use std::path::Path;

use cobalt_core::data::{load_file, DataError, Format};
use cobalt_core::worker::WorkerError;
use cobalt_ecs::{EcsError, UnknownComponents};
use cobalt_graphics::{MaterialError, ShaderError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use asset_loader::{AssetKind, AssetLoader, AssetRequestId, LoadedAsset};
pub use engine::{Engine, FrameEvent};
pub use processors::{DrawExtractProcessor, LightCountProcessor, SpinProcessor};

/// Engine error type
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Ecs(#[from] EcsError),
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error(transparent)]
    Material(#[from] MaterialError),
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Worker(#[from] WorkerError),
    #[error("Shader '{0}' is not registered")]
    UnknownShader(String),
    #[error("Shader '{0}' is already registered")]
    DuplicateShader(String),
    #[error("Stock components must be registered before {0}")]
    NotInitialized(&'static str),
}

/// Configuration for initializing the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Background worker threads for asset loading
    pub worker_threads: usize,
    /// Maximum queued background jobs
    pub worker_queue_capacity: usize,
    /// Material used when a draw names an unknown material
    pub default_material: Option<String>,
    /// Format of asset files; `None` picks it from the extension
    pub asset_format: Option<Format>,
    /// Fail scene loads on unknown component names instead of skipping them
    pub strict_components: bool,
    /// Reject draws outside the view frustum
    pub frustum_culling: bool,
    /// Bounding radius of a mesh at unit scale, used for culling
    pub mesh_radius: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_threads: 2,
            worker_queue_capacity: 64,
            default_material: Some("default".to_string()),
            asset_format: None,
            strict_components: true,
            frustum_culling: true,
            mesh_radius: 1.0,
        }
    }
}

impl EngineConfig {
    /// Reads a configuration file (JSON or RON by extension). Missing keys
    /// keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DataError> {
        load_file(path, None)
    }

    /// Policy for component names a scene document does not know.
    pub fn unknown_components(&self) -> UnknownComponents {
        if self.strict_components {
            UnknownComponents::Error
        } else {
            UnknownComponents::Skip
        }
    }
}

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initializes every subsystem crate's logging banner.
pub fn init() {
    cobalt_core::init();
    cobalt_ecs::init();
    cobalt_graphics::init();
    log::info!("Cobalt Engine v{} initialized", VERSION);
}
