//! Graphics error types.
//!
//! Every variant here is raised while loading a shader or material
//! definition. Nothing in the per-frame path returns these.

use cobalt_core::data::DataError;
use thiserror::Error;

/// Errors raised while building or reloading a shader pass graph.
#[derive(Debug, Error)]
pub enum ShaderError {
    /// A pass reads or writes a resource the shader never declared.
    #[error("pass '{pass}' references undeclared resource '{resource}'")]
    UnlistedRenderTarget { pass: String, resource: String },

    /// A mode, resource kind, light kind or write mask string is not recognized.
    #[error("invalid {element} '{value}' in '{context}'")]
    InvalidElementType {
        element: &'static str,
        value: String,
        context: String,
    },

    /// A definition lacks something it cannot work without.
    #[error("'{context}' is missing {what}")]
    MissingParameters { context: String, what: &'static str },

    /// Two passes share a name.
    #[error("duplicate pass '{name}' in shader '{shader}'")]
    DuplicatePass { name: String, shader: String },

    /// Two resources share a name.
    #[error("duplicate resource '{name}' in shader '{shader}'")]
    DuplicateResource { name: String, shader: String },

    /// A pass identifier that this graph never issued.
    #[error("unknown pass {0}")]
    UnknownPass(String),

    /// A transient binding outside the pass's reserved stages.
    #[error("stage {stage} of pass '{pass}' is outside the reserved range {first}..{end}")]
    StageOutOfRange {
        pass: String,
        stage: u32,
        first: u32,
        end: u32,
    },

    #[error(transparent)]
    Data(#[from] DataError),
}

/// Errors raised by the material resolver.
#[derive(Debug, Error)]
pub enum MaterialError {
    /// No material is registered under this name. Callers usually fall back
    /// to a default material.
    #[error("material '{0}' not found")]
    NotFound(String),

    /// The material configures a pass its shader does not define.
    #[error("material '{material}' requests pass '{pass}' which shader '{shader}' does not define")]
    UnknownMaterialType {
        material: String,
        shader: String,
        pass: String,
    },

    /// A declared resource matched nothing, or a required field is empty.
    #[error("material '{material}': {what}")]
    MissingParameters { material: String, what: String },

    /// A material name was registered twice.
    #[error("material '{0}' is already registered")]
    DuplicateMaterial(String),

    /// The render state of a material pass is malformed.
    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error(transparent)]
    Data(#[from] DataError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MaterialError::NotFound("brick".to_string());
        assert_eq!(err.to_string(), "material 'brick' not found");

        let err = ShaderError::UnlistedRenderTarget {
            pass: "gbuffer".to_string(),
            resource: "albedo".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "pass 'gbuffer' references undeclared resource 'albedo'"
        );

        let err = ShaderError::DuplicateResource {
            name: "depth".to_string(),
            shader: "standard".to_string(),
        };
        assert_eq!(err.to_string(), "duplicate resource 'depth' in shader 'standard'");
    }
}
