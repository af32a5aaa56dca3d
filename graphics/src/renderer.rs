//! Walks a shader pass graph for one frame.
//!
//! For every block that prepares and every pass whose mode is not
//! [`Mode::None`], the renderer assembles bindings (pass bindings first, then
//! material resources from the pass's first free stage) and hands them to
//! the [`GraphicsContext`].
//!
//! # Material fallback
//!
//! A draw belongs to the shader of its material. A draw whose material is not
//! registered belongs to the shader of the renderer's default material, and
//! is dropped when there is none. Other shaders never see the draw.
//!
//! For each owned draw and pass, bindings come from the first of:
//!
//! 1. the draw's material, if it configures the pass;
//! 2. the default material, if it belongs to this shader and configures the pass;
//! 3. nothing: the pass runs with its own bindings and render state only.

use cobalt_core::math::{Mat4, Vec3};
use cobalt_core::scene::MeshHandle;

use crate::device::{GraphicsContext, Submission};
use crate::frame::FrameContext;
use crate::material::{MaterialResolver, PassBinding, PassMaterial};
use crate::resource::ResourceHandle;
use crate::shader::{Binding, Mode, PassId, PassRef, ShaderPassGraph};

/// One mesh to draw with a material.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub mesh: MeshHandle,
    pub material: String,
    pub transform: Mat4,
    /// World-space bounding sphere used for culling.
    pub center: Vec3,
    pub radius: f32,
}

impl DrawCall {
    /// A draw whose bounding sphere is centered on the transform's origin.
    pub fn new(mesh: MeshHandle, material: impl Into<String>, transform: Mat4, radius: f32) -> Self {
        Self {
            mesh,
            material: material.into(),
            center: transform.w_axis.truncate(),
            transform,
            radius,
        }
    }
}

/// Draw calls collected for the current frame.
#[derive(Debug, Clone, Default)]
pub struct DrawQueue {
    calls: Vec<DrawCall>,
}

impl DrawQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, call: DrawCall) {
        self.calls.push(call);
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

/// Counters for one rendered frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub blocks_skipped: u32,
    pub passes_run: u32,
    pub passes_skipped: u32,
    pub draws: u32,
    pub dispatches: u32,
    /// Draws rejected by frustum culling.
    pub culled: u32,
    /// Draws that used the default material or no material.
    pub fallbacks: u32,
}

impl FrameStats {
    /// Adds another frame's counters.
    pub fn accumulate(&mut self, other: &FrameStats) {
        self.blocks_skipped += other.blocks_skipped;
        self.passes_run += other.passes_run;
        self.passes_skipped += other.passes_skipped;
        self.draws += other.draws;
        self.dispatches += other.dispatches;
        self.culled += other.culled;
        self.fallbacks += other.fallbacks;
    }
}

/// Renders draw queues through shader pass graphs.
#[derive(Debug, Clone)]
pub struct Renderer {
    default_material: Option<String>,
    frustum_culling: bool,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            default_material: None,
            frustum_culling: true,
        }
    }
}

/// Material candidates for one draw, best first.
struct DrawMaterials<'a> {
    own: Option<&'a PassMaterial>,
    default: Option<&'a PassMaterial>,
}

impl<'a> DrawMaterials<'a> {
    fn binding(&self, pass: PassId) -> Option<&'a PassBinding> {
        self.own
            .and_then(|m| m.binding(pass))
            .or_else(|| self.default.and_then(|m| m.binding(pass)))
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the material used when a draw's own material is unknown.
    pub fn with_default_material(mut self, name: impl Into<String>) -> Self {
        self.default_material = Some(name.into());
        self
    }

    pub fn set_default_material(&mut self, name: Option<String>) {
        self.default_material = name;
    }

    pub fn default_material(&self) -> Option<&str> {
        self.default_material.as_deref()
    }

    pub fn set_frustum_culling(&mut self, enabled: bool) {
        self.frustum_culling = enabled;
    }

    /// Renders one frame of `graph`.
    ///
    /// Only draws owned by `graph` are submitted. `frame.draw_count` is
    /// replaced by the number of those surviving culling.
    pub fn render<C: GraphicsContext + ?Sized>(
        &self,
        graph: &ShaderPassGraph,
        resolver: &MaterialResolver,
        frame: &FrameContext,
        queue: &DrawQueue,
        ctx: &mut C,
    ) -> FrameStats {
        let mut stats = FrameStats::default();

        let default = self
            .default_material
            .as_deref()
            .and_then(|name| resolver.get_pass_material(name).ok())
            .filter(|m| m.shader() == graph.name());

        let mut visible: Vec<&DrawCall> = Vec::new();
        let mut materials: Vec<DrawMaterials<'_>> = Vec::new();
        for call in queue.calls() {
            let own = match resolver.get_pass_material(&call.material) {
                Ok(material) if material.shader() == graph.name() => Some(material),
                Ok(_) => continue,
                Err(_) if default.is_some() => None,
                // Left to the default material's shader, if there is one.
                Err(_) => continue,
            };
            if self.frustum_culling && !frame.frustum.intersects_sphere(call.center, call.radius) {
                stats.culled += 1;
                continue;
            }
            if own.is_none() {
                stats.fallbacks += 1;
                log::trace!(
                    "Material '{}' unknown, drawing with default in shader '{}'",
                    call.material,
                    graph.name()
                );
            }
            visible.push(call);
            materials.push(DrawMaterials { own, default });
        }
        let frame = frame.with_draw_count(visible.len());

        let mut bindings = Vec::new();
        for block in graph.begin(&frame) {
            if !block.prepare() {
                stats.blocks_skipped += 1;
                continue;
            }
            for pass in block.begin() {
                let mode = pass.prepare();
                if mode == Mode::None {
                    stats.passes_skipped += 1;
                    continue;
                }
                stats.passes_run += 1;
                let targets = pass.targets();

                if mode == Mode::Compute {
                    bindings.clear();
                    bindings.extend(pass.pass().bindings());
                    let submission = make_submission(graph, &pass, &targets, &bindings, None, None);
                    ctx.dispatch_compute(&submission);
                    stats.dispatches += 1;
                    continue;
                }

                for (call, material) in visible.iter().zip(&materials) {
                    let binding = material.binding(pass.pass().id());
                    bindings.clear();
                    bindings.extend(pass.pass().bindings());
                    if let Some(binding) = binding {
                        bindings.extend(binding.bindings(pass.first_resource_stage()));
                    }
                    let submission =
                        make_submission(graph, &pass, &targets, &bindings, binding, Some(*call));
                    match mode {
                        Mode::Forward => ctx.draw_forward(&submission),
                        Mode::Deferred => ctx.draw_deferred(&submission),
                        Mode::Compute | Mode::None => {}
                    }
                    stats.draws += 1;
                }
            }
        }

        log::trace!("Rendered shader '{}': {stats:?}", graph.name());
        stats
    }
}

fn make_submission<'a>(
    graph: &'a ShaderPassGraph,
    pass: &PassRef<'a>,
    targets: &'a [ResourceHandle],
    bindings: &'a [Binding],
    material: Option<&PassBinding>,
    draw: Option<&'a DrawCall>,
) -> Submission<'a> {
    let shader_pass = pass.pass();
    Submission {
        shader: graph.name(),
        pass: shader_pass.id(),
        pass_name: shader_pass.name(),
        render_state: material
            .and_then(PassBinding::render_state)
            .unwrap_or(shader_pass.render_state()),
        targets,
        bindings,
        draw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cobalt_core::math::Frustum;

    #[test]
    fn test_draw_call_center_from_transform() {
        let call = DrawCall::new(
            MeshHandle::NULL,
            "m",
            Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)),
            0.5,
        );
        assert_eq!(call.center, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_stats_accumulate() {
        let mut total = FrameStats::default();
        let frame = FrameStats {
            draws: 3,
            culled: 1,
            ..FrameStats::default()
        };
        total.accumulate(&frame);
        total.accumulate(&frame);
        assert_eq!(total.draws, 6);
        assert_eq!(total.culled, 2);
    }

    #[test]
    fn test_culling_uses_frustum() {
        let projection = Mat4::perspective_rh(1.0, 1.0, 0.1, 100.0);
        let frustum = Frustum::from_view_projection(projection);
        let ahead = DrawCall::new(
            MeshHandle::NULL,
            "m",
            Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0)),
            1.0,
        );
        let behind = DrawCall::new(
            MeshHandle::NULL,
            "m",
            Mat4::from_translation(Vec3::new(0.0, 0.0, 10.0)),
            1.0,
        );
        assert!(frustum.intersects_sphere(ahead.center, ahead.radius));
        assert!(!frustum.intersects_sphere(behind.center, behind.radius));
    }
}
