//! Material documents.

use cobalt_core::data::Value;
use serde::{Deserialize, Serialize};

use crate::render_state::RenderStateDesc;

/// A material: per-pass resources for one shader.
///
/// ```json
/// {
///   "name": "bricks",
///   "shader": "standard",
///   "passes": [
///     {
///       "pass": "forward",
///       "resources": [
///         { "name": "albedo", "pattern": "bricks_albedo*" },
///         { "name": "normal", "pattern": "bricks_normal*", "params": { "strength": 0.5 } }
///       ]
///     }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDefinition {
    pub name: String,
    /// Name of the shader whose passes this material configures.
    pub shader: String,
    #[serde(default)]
    pub passes: Vec<MaterialPassDefinition>,
}

/// Resources and render state for one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialPassDefinition {
    pub pass: String,
    #[serde(default)]
    pub resources: Vec<MaterialResource>,
    /// Overrides the pass's own render state.
    #[serde(default)]
    pub render_state: Option<RenderStateDesc>,
}

/// One resource a material binds. Resolved against the catalog by
/// `pattern`; `params` are passed through to the graphics collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialResource {
    pub name: String,
    pub pattern: String,
    #[serde(default)]
    pub params: Value,
}
