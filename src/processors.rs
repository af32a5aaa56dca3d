//! Engine-level processors.
//!
//! These bridge the ECS and the renderer: [`LightCountProcessor`] feeds block
//! gating, and [`DrawExtractProcessor`] turns renderable entities into the
//! frame's [`DrawQueue`]. Both publish their results as world resources.

use cobalt_core::math::Quat;
use cobalt_core::scene::LightCounts;
use cobalt_ecs::components::{Light, MeshRenderer, Spin, Transform};
use cobalt_ecs::{Components, Entity, Processor, ProcessorContext};
use cobalt_graphics::{DrawCall, DrawQueue};

/// Rotates every `Transform` by its `Spin` torque each update.
#[derive(Debug, Default)]
pub struct SpinProcessor;

impl Processor for SpinProcessor {
    fn name(&self) -> &str {
        "SpinProcessor"
    }

    fn update(&mut self, ctx: &mut ProcessorContext<'_>) {
        for &entity in ctx.tracked {
            let Ok(torque) = ctx.components.get::<Spin>(entity).map(|s| s.torque) else {
                continue;
            };
            if let Ok(transform) = ctx.components.get_mut::<Transform>(entity) {
                let delta = Quat::from_scaled_axis(torque * ctx.dt);
                transform.rotation = (delta * transform.rotation).normalize();
            }
        }
    }
}

/// Publishes the number of active lights per kind as a [`LightCounts`]
/// resource.
///
/// Lights with zero intensity do not count.
#[derive(Debug, Default)]
pub struct LightCountProcessor;

impl LightCountProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Processor for LightCountProcessor {
    fn name(&self) -> &str {
        "LightCountProcessor"
    }

    fn on_entity_tracked(&mut self, entity: Entity, components: &Components) {
        if let Ok(light) = components.get::<Light>(entity) {
            log::trace!("Light {entity} ({}) tracked", light.kind.as_str());
        }
    }

    fn on_entity_untracked(&mut self, entity: Entity, _components: &Components) {
        log::trace!("Light {entity} untracked");
    }

    fn update(&mut self, ctx: &mut ProcessorContext<'_>) {
        let mut counts = LightCounts::default();
        for &entity in ctx.tracked {
            match ctx.components.get::<Light>(entity) {
                Ok(light) if light.intensity > 0.0 => counts.increment(light.kind),
                _ => {}
            }
        }
        *ctx.resources.get_or_default::<LightCounts>() = counts;
    }

    fn on_teardown(&mut self, tracked: usize) {
        log::debug!("LightCountProcessor torn down with {tracked} lights");
    }
}

/// Rebuilds the [`DrawQueue`] resource from every entity holding a
/// `Transform` and a `MeshRenderer`.
#[derive(Debug)]
pub struct DrawExtractProcessor {
    /// Bounding radius of a mesh at unit scale.
    mesh_radius: f32,
}

impl DrawExtractProcessor {
    pub fn new(mesh_radius: f32) -> Self {
        Self { mesh_radius }
    }
}

impl Default for DrawExtractProcessor {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Processor for DrawExtractProcessor {
    fn name(&self) -> &str {
        "DrawExtractProcessor"
    }

    fn update(&mut self, ctx: &mut ProcessorContext<'_>) {
        let queue = ctx.resources.get_or_default::<DrawQueue>();
        queue.clear();
        for &entity in ctx.tracked {
            let (Ok(transform), Ok(renderer)) = (
                ctx.components.get::<Transform>(entity),
                ctx.components.get::<MeshRenderer>(entity),
            ) else {
                continue;
            };
            if renderer.mesh.is_null() {
                continue;
            }
            queue.push(DrawCall::new(
                renderer.mesh,
                renderer.material.clone(),
                transform.matrix(),
                self.mesh_radius * transform.max_scale(),
            ));
        }
        log::trace!("Extracted {} draw calls", queue.len());
    }
}
