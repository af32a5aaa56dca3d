//! Per-frame inputs to pass graph iteration.

use cobalt_core::math::{Frustum, Mat4};
use cobalt_core::scene::LightCounts;

use crate::resource::ResourceHandle;

/// Everything a shader needs to decide what runs this frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext {
    pub view: Mat4,
    pub frustum: Frustum,
    /// Resource substituted for every `target` output.
    pub target: ResourceHandle,
    /// Active lights per kind, consulted by gated blocks.
    pub lights: LightCounts,
    /// Visible draw calls. Geometry passes are skipped when this is zero.
    pub draw_count: usize,
}

impl FrameContext {
    pub fn new(view: Mat4, frustum: Frustum, target: ResourceHandle) -> Self {
        Self {
            view,
            frustum,
            target,
            lights: LightCounts::default(),
            draw_count: 0,
        }
    }

    pub fn with_lights(mut self, lights: LightCounts) -> Self {
        self.lights = lights;
        self
    }

    pub fn with_draw_count(mut self, draw_count: usize) -> Self {
        self.draw_count = draw_count;
        self
    }
}
