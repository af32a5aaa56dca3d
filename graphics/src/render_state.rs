//! Fixed-function render state and its interning cache.
//!
//! Shaders and materials describe render state as data ([`RenderStateDesc`]).
//! Descriptions are validated into a [`RenderState`] and interned through a
//! [`RenderStateCache`], so identical states share one [`RenderStateHandle`]
//! and the graphics collaborator can compare states by handle.

use std::collections::HashMap;

use cobalt_core::{Handle, HandleAllocator};
use serde::{Deserialize, Serialize};

use crate::error::ShaderError;

/// Handle category for interned render states.
pub enum RenderStateCategory {}

/// Handle to an interned [`RenderState`].
pub type RenderStateHandle = Handle<RenderStateCategory>;

/// Blend factor for blending operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendFactor {
    /// 0.0
    #[default]
    Zero,
    /// 1.0
    One,
    /// Source color
    Src,
    /// 1 - source color
    OneMinusSrc,
    /// Source alpha
    SrcAlpha,
    /// 1 - source alpha
    OneMinusSrcAlpha,
    /// Destination color
    Dst,
    /// 1 - destination color
    OneMinusDst,
    /// Destination alpha
    DstAlpha,
    /// 1 - destination alpha
    OneMinusDstAlpha,
}

/// Blend operation for combining colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendOperation {
    /// source + destination
    #[default]
    Add,
    /// source - destination
    Subtract,
    /// destination - source
    ReverseSubtract,
    /// min(source, destination)
    Min,
    /// max(source, destination)
    Max,
}

/// Blend component configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendComponent {
    pub src_factor: BlendFactor,
    pub dst_factor: BlendFactor,
    pub operation: BlendOperation,
}

impl Default for BlendComponent {
    fn default() -> Self {
        Self {
            src_factor: BlendFactor::One,
            dst_factor: BlendFactor::Zero,
            operation: BlendOperation::Add,
        }
    }
}

impl BlendComponent {
    /// Standard "over" alpha blending.
    pub fn over() -> Self {
        Self {
            src_factor: BlendFactor::SrcAlpha,
            dst_factor: BlendFactor::OneMinusSrcAlpha,
            operation: BlendOperation::Add,
        }
    }

    /// Source and destination summed at full weight.
    pub fn additive() -> Self {
        Self {
            src_factor: BlendFactor::One,
            dst_factor: BlendFactor::One,
            operation: BlendOperation::Add,
        }
    }
}

/// Blend state for color blending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendState {
    pub color: BlendComponent,
    pub alpha: BlendComponent,
}

impl BlendState {
    /// Standard alpha blending (src over dst).
    pub fn alpha_blending() -> Self {
        Self {
            color: BlendComponent::over(),
            alpha: BlendComponent::over(),
        }
    }

    /// Additive blending, used by light accumulation passes.
    pub fn additive() -> Self {
        Self {
            color: BlendComponent::additive(),
            alpha: BlendComponent::additive(),
        }
    }
}

/// Depth comparison function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareFunction {
    Never,
    #[default]
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

/// Face culling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CullMode {
    None,
    Front,
    #[default]
    Back,
}

bitflags::bitflags! {
    /// Color channels a pass writes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ColorWrites: u8 {
        const RED = 1 << 0;
        const GREEN = 1 << 1;
        const BLUE = 1 << 2;
        const ALPHA = 1 << 3;
    }
}

impl ColorWrites {
    /// Parses a channel mask such as `"rgba"` or `"rgb"`. An empty string
    /// disables color writes.
    pub fn parse(mask: &str, context: &str) -> Result<Self, ShaderError> {
        let mut writes = ColorWrites::empty();
        for c in mask.chars() {
            writes |= match c.to_ascii_lowercase() {
                'r' => ColorWrites::RED,
                'g' => ColorWrites::GREEN,
                'b' => ColorWrites::BLUE,
                'a' => ColorWrites::ALPHA,
                _ => {
                    return Err(ShaderError::InvalidElementType {
                        element: "color write mask",
                        value: mask.to_owned(),
                        context: context.to_owned(),
                    })
                }
            };
        }
        Ok(writes)
    }
}

/// Serialized render state, as written in shader and material documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderStateDesc {
    /// `None` disables blending.
    pub blend: Option<BlendState>,
    /// `None` disables the depth test.
    pub depth_compare: Option<CompareFunction>,
    pub depth_write: bool,
    pub cull: CullMode,
    pub color_writes: String,
}

impl Default for RenderStateDesc {
    fn default() -> Self {
        Self {
            blend: None,
            depth_compare: Some(CompareFunction::Less),
            depth_write: true,
            cull: CullMode::Back,
            color_writes: "rgba".to_owned(),
        }
    }
}

/// Validated render state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderState {
    pub blend: Option<BlendState>,
    pub depth_compare: Option<CompareFunction>,
    pub depth_write: bool,
    pub cull: CullMode,
    pub color_writes: ColorWrites,
}

impl RenderState {
    /// Validates a description. `context` names the owner for error messages.
    pub fn from_desc(desc: &RenderStateDesc, context: &str) -> Result<Self, ShaderError> {
        Ok(Self {
            blend: desc.blend,
            depth_compare: desc.depth_compare,
            depth_write: desc.depth_write,
            cull: desc.cull,
            color_writes: ColorWrites::parse(&desc.color_writes, context)?,
        })
    }
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            blend: None,
            depth_compare: Some(CompareFunction::Less),
            depth_write: true,
            cull: CullMode::Back,
            color_writes: ColorWrites::all(),
        }
    }
}

/// Interns render states so equal states share a handle.
///
/// States are never released; a shader reload that produces the same state
/// gets the same handle back.
#[derive(Debug, Default)]
pub struct RenderStateCache {
    handles: HandleAllocator<RenderStateCategory>,
    states: HashMap<RenderStateHandle, RenderState>,
    lookup: HashMap<RenderState, RenderStateHandle>,
}

impl RenderStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle for `state`, interning it on first use.
    pub fn intern(&mut self, state: RenderState) -> RenderStateHandle {
        if let Some(&handle) = self.lookup.get(&state) {
            return handle;
        }
        let handle = self.handles.allocate();
        self.states.insert(handle, state);
        self.lookup.insert(state, handle);
        log::trace!("Interned render state {handle}");
        handle
    }

    /// Returns the state behind a handle.
    pub fn get(&self, handle: RenderStateHandle) -> Option<&RenderState> {
        self.states.get(&handle)
    }

    /// Number of distinct states.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_intern_deduplicates() {
        let mut cache = RenderStateCache::new();
        let a = cache.intern(RenderState::default());
        let b = cache.intern(RenderState::default());
        assert_eq!(a, b);
        assert_eq!(cache.len(), 1);

        let blended = RenderState {
            blend: Some(BlendState::alpha_blending()),
            ..RenderState::default()
        };
        let c = cache.intern(blended);
        assert_ne!(a, c);
        assert_eq!(cache.get(c), Some(&blended));
    }

    #[test]
    fn test_default_desc_matches_default_state() {
        let state = RenderState::from_desc(&RenderStateDesc::default(), "test").unwrap();
        assert_eq!(state, RenderState::default());
    }

    #[rstest]
    #[case("rgba", ColorWrites::all())]
    #[case("rgb", ColorWrites::RED | ColorWrites::GREEN | ColorWrites::BLUE)]
    #[case("A", ColorWrites::ALPHA)]
    #[case("", ColorWrites::empty())]
    fn test_color_writes_parse(#[case] mask: &str, #[case] expected: ColorWrites) {
        assert_eq!(ColorWrites::parse(mask, "test").unwrap(), expected);
    }

    #[test]
    fn test_color_writes_rejects_unknown_channel() {
        let err = ColorWrites::parse("rgx", "lighting").unwrap_err();
        assert!(matches!(err, ShaderError::InvalidElementType { .. }));
    }
}
