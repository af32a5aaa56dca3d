//! The graphics collaborator seen from the pass graph.
//!
//! The renderer never touches device state. It hands each prepared pass to
//! a [`GraphicsContext`] through the callback matching the pass's mode.

use cobalt_core::scene::MeshHandle;

use crate::render_state::RenderStateHandle;
use crate::renderer::DrawCall;
use crate::resource::ResourceHandle;
use crate::shader::{Binding, Mode, PassId};

/// Everything needed to execute one draw or dispatch.
#[derive(Debug, Clone, Copy)]
pub struct Submission<'a> {
    pub shader: &'a str,
    pub pass: PassId,
    pub pass_name: &'a str,
    pub render_state: RenderStateHandle,
    pub targets: &'a [ResourceHandle],
    /// Pass bindings followed by material bindings, in stage order.
    pub bindings: &'a [Binding],
    /// The draw call, for forward and deferred passes.
    pub draw: Option<&'a DrawCall>,
}

/// Executes prepared passes.
pub trait GraphicsContext {
    fn draw_forward(&mut self, submission: &Submission<'_>);

    fn draw_deferred(&mut self, submission: &Submission<'_>);

    fn dispatch_compute(&mut self, submission: &Submission<'_>);
}

/// One command captured by [`RecordingContext`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCommand {
    pub mode: Mode,
    pub shader: String,
    pub pass: String,
    pub render_state: RenderStateHandle,
    pub targets: Vec<ResourceHandle>,
    pub bindings: Vec<Binding>,
    pub mesh: Option<MeshHandle>,
    pub material: Option<String>,
}

/// A context that records submissions instead of executing them.
#[derive(Debug, Default)]
pub struct RecordingContext {
    commands: Vec<RecordedCommand>,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    /// Number of recorded commands with the given mode.
    pub fn count(&self, mode: Mode) -> usize {
        self.commands.iter().filter(|c| c.mode == mode).count()
    }

    /// Whether any command was recorded for the named pass.
    pub fn ran_pass(&self, pass: &str) -> bool {
        self.commands.iter().any(|c| c.pass == pass)
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    fn record(&mut self, mode: Mode, submission: &Submission<'_>) {
        self.commands.push(RecordedCommand {
            mode,
            shader: submission.shader.to_owned(),
            pass: submission.pass_name.to_owned(),
            render_state: submission.render_state,
            targets: submission.targets.to_vec(),
            bindings: submission.bindings.to_vec(),
            mesh: submission.draw.map(|d| d.mesh),
            material: submission.draw.map(|d| d.material.clone()),
        });
    }
}

impl GraphicsContext for RecordingContext {
    fn draw_forward(&mut self, submission: &Submission<'_>) {
        self.record(Mode::Forward, submission);
    }

    fn draw_deferred(&mut self, submission: &Submission<'_>) {
        self.record(Mode::Deferred, submission);
    }

    fn dispatch_compute(&mut self, submission: &Submission<'_>) {
        self.record(Mode::Compute, submission);
    }
}
