use std::fmt;

use cobalt_core::Symbol;

use crate::error::ShaderError;
use crate::frame::FrameContext;
use crate::render_state::RenderStateHandle;
use crate::resource::ResourceHandle;

/// Stable identifier of a pass.
///
/// Identifiers are interned by pass name in the owning graph and survive
/// [`reload`](super::ShaderPassGraph::reload), so material bindings keyed by
/// `PassId` stay valid when a shader is rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PassId(Symbol);

impl PassId {
    pub(crate) fn new(symbol: Symbol) -> Self {
        Self(symbol)
    }

    pub(crate) fn symbol(self) -> Symbol {
        self.0
    }
}

impl fmt::Display for PassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pass({})", self.0.index())
    }
}

/// Declared mode of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassMode {
    Forward,
    Deferred,
    Compute,
}

impl PassMode {
    pub const ALL: [PassMode; 3] = [PassMode::Forward, PassMode::Deferred, PassMode::Compute];

    pub fn as_str(self) -> &'static str {
        match self {
            PassMode::Forward => "forward",
            PassMode::Deferred => "deferred",
            PassMode::Compute => "compute",
        }
    }

    pub fn parse(value: &str, context: &str) -> Result<Self, ShaderError> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == value)
            .ok_or_else(|| ShaderError::InvalidElementType {
                element: "pass mode",
                value: value.to_owned(),
                context: context.to_owned(),
            })
    }

    /// Forward and deferred passes draw geometry; compute passes dispatch.
    pub fn is_geometry(self) -> bool {
        !matches!(self, PassMode::Compute)
    }
}

/// What a pass does on the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Nothing to do; the pass must be skipped without binding anything.
    None,
    Forward,
    Deferred,
    Compute,
}

impl From<PassMode> for Mode {
    fn from(mode: PassMode) -> Self {
        match mode {
            PassMode::Forward => Mode::Forward,
            PassMode::Deferred => Mode::Deferred,
            PassMode::Compute => Mode::Compute,
        }
    }
}

/// A resource bound at a numbered stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Binding {
    pub stage: u32,
    pub resource: ResourceHandle,
}

/// A render target written by a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutput {
    Resource(ResourceHandle),
    /// The frame's target, known only when the frame begins.
    FrameTarget,
}

/// One compiled pass.
#[derive(Debug, Clone)]
pub struct ShaderPass {
    pub(crate) id: PassId,
    pub(crate) name: String,
    pub(crate) mode: PassMode,
    pub(crate) inputs: Vec<ResourceHandle>,
    pub(crate) outputs: Vec<PassOutput>,
    pub(crate) render_state: RenderStateHandle,
    /// One slot per reserved stage; `NULL` when unbound.
    pub(crate) transient: Vec<ResourceHandle>,
    pub(crate) enabled: bool,
}

impl ShaderPass {
    pub fn id(&self) -> PassId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> PassMode {
        self.mode
    }

    pub fn inputs(&self) -> &[ResourceHandle] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[PassOutput] {
        &self.outputs
    }

    pub fn render_state(&self) -> RenderStateHandle {
        self.render_state
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Lowest stage not used by the pass itself. Material resources bind
    /// from here upwards.
    pub fn first_resource_stage(&self) -> u32 {
        (self.inputs.len() + self.transient.len()) as u32
    }

    /// Binds a per-frame resource at a reserved stage.
    pub fn bind_transient(&mut self, stage: u32, resource: ResourceHandle) -> Result<(), ShaderError> {
        let first = self.inputs.len() as u32;
        let end = self.first_resource_stage();
        if stage < first || stage >= end {
            return Err(ShaderError::StageOutOfRange {
                pass: self.name.clone(),
                stage,
                first,
                end,
            });
        }
        self.transient[(stage - first) as usize] = resource;
        Ok(())
    }

    /// Releases every transient binding.
    pub fn clear(&mut self) {
        self.transient.fill(ResourceHandle::NULL);
    }

    /// Decides what the pass does this frame.
    pub fn prepare(&self, frame: &FrameContext) -> Mode {
        if !self.enabled || (self.mode.is_geometry() && frame.draw_count == 0) {
            return Mode::None;
        }
        self.mode.into()
    }

    /// Pass-intrinsic bindings: inputs from stage 0, then bound transients.
    pub fn bindings(&self) -> impl Iterator<Item = Binding> + '_ {
        let first = self.inputs.len() as u32;
        let inputs = self.inputs.iter().enumerate().map(|(i, &resource)| Binding {
            stage: i as u32,
            resource,
        });
        let transient = self
            .transient
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.is_null())
            .map(move |(i, &resource)| Binding {
                stage: first + i as u32,
                resource,
            });
        inputs.chain(transient)
    }

    /// Render targets with the frame target substituted.
    pub fn targets(&self, frame: &FrameContext) -> Vec<ResourceHandle> {
        self.outputs
            .iter()
            .map(|output| match *output {
                PassOutput::Resource(handle) => handle,
                PassOutput::FrameTarget => frame.target,
            })
            .collect()
    }
}
