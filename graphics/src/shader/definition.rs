//! Shader documents.
//!
//! A shader is authored as data and compiled into a
//! [`ShaderPassGraph`](super::ShaderPassGraph). Kinds and modes are kept as
//! strings here so that a typo surfaces as
//! [`ShaderError::InvalidElementType`](crate::ShaderError::InvalidElementType)
//! naming the offending element, instead of a generic parse error.
//!
//! ```json
//! {
//!   "name": "standard",
//!   "resources": [
//!     { "name": "depth", "kind": "depth" },
//!     { "name": "backbuffer", "kind": "target" }
//!   ],
//!   "blocks": [
//!     {
//!       "name": "opaque",
//!       "passes": [
//!         { "name": "forward", "mode": "forward", "outputs": ["backbuffer", "depth"] }
//!       ]
//!     }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::render_state::RenderStateDesc;

/// Top-level shader document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaderDefinition {
    pub name: String,
    #[serde(default)]
    pub resources: Vec<ResourceDefinition>,
    #[serde(default)]
    pub blocks: Vec<BlockDefinition>,
}

/// A resource the shader's passes may read or write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDefinition {
    pub name: String,
    /// One of `texture`, `depth`, `buffer`, `target`.
    pub kind: String,
}

/// An ordered group of passes, optionally gated on a light kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDefinition {
    pub name: String,
    /// `directional`, `point` or `spot`. The block is skipped on frames
    /// with no active light of that kind.
    #[serde(default)]
    pub light: Option<String>,
    #[serde(default)]
    pub passes: Vec<PassDefinition>,
}

/// One pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassDefinition {
    pub name: String,
    /// One of `forward`, `deferred`, `compute`.
    pub mode: String,
    /// Resources bound at stages `0..inputs.len()`.
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Render targets written by the pass.
    #[serde(default)]
    pub outputs: Vec<String>,
    /// Stages after the inputs kept free for per-frame transient bindings.
    #[serde(default)]
    pub transient_stages: u32,
    #[serde(default)]
    pub render_state: RenderStateDesc,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl ShaderDefinition {
    /// Number of passes across all blocks.
    pub fn pass_count(&self) -> usize {
        self.blocks.iter().map(|b| b.passes.len()).sum()
    }
}
