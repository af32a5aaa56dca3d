//! Shared fixtures for the pass graph integration tests.

use cobalt_core::data::{decode, Format};
use cobalt_core::math::{Frustum, Mat4, Vec3};
use cobalt_core::scene::{LightCounts, LightKind, MeshHandle};
use cobalt_graphics::{
    DrawCall, DrawQueue, FrameContext, MaterialDefinition, MaterialResolver, RenderStateCache,
    ResourceCatalog, ResourceHandle, ResourceKind, ShaderDefinition, ShaderPassGraph,
};

pub const STANDARD_SHADER: &str = r#"{
    "name": "standard",
    "resources": [
        { "name": "albedo", "kind": "texture" },
        { "name": "normals", "kind": "texture" },
        { "name": "depth", "kind": "depth" },
        { "name": "light_grid", "kind": "buffer" },
        { "name": "backbuffer", "kind": "target" }
    ],
    "blocks": [
        { "name": "geometry", "passes": [
            { "name": "gbuffer", "mode": "deferred", "outputs": ["albedo", "normals", "depth"] }
        ]},
        { "name": "culling", "passes": [
            { "name": "light_cull", "mode": "compute", "inputs": ["depth"], "outputs": ["light_grid"] }
        ]},
        { "name": "sun", "light": "directional", "passes": [
            { "name": "sun_light", "mode": "forward",
              "inputs": ["albedo", "normals", "depth"], "transient_stages": 1,
              "outputs": ["backbuffer"],
              "render_state": { "blend": { "color": { "src_factor": "one", "dst_factor": "one" },
                                           "alpha": { "src_factor": "one", "dst_factor": "one" } },
                                "depth_write": false } }
        ]},
        { "name": "points", "light": "point", "passes": [
            { "name": "point_light", "mode": "forward",
              "inputs": ["albedo", "normals", "depth", "light_grid"], "outputs": ["backbuffer"] }
        ]},
        { "name": "transparent", "passes": [
            { "name": "transparent", "mode": "forward", "outputs": ["backbuffer", "depth"] }
        ]}
    ]
}"#;

pub const BRICKS_MATERIAL: &str = r#"{
    "name": "bricks",
    "shader": "standard",
    "passes": [
        { "pass": "gbuffer", "resources": [
            { "name": "albedo", "pattern": "bricks_albedo*" },
            { "name": "normal", "pattern": "bricks_n*", "params": { "strength": 0.5 } }
        ]},
        { "pass": "transparent",
          "resources": [{ "name": "albedo", "pattern": "bricks_albedo" }],
          "render_state": { "blend": { "color": { "src_factor": "src_alpha", "dst_factor": "one_minus_src_alpha" } },
                            "depth_write": false } }
    ]
}"#;

pub const DEFAULT_MATERIAL: &str = r#"{
    "name": "default",
    "shader": "standard",
    "passes": [
        { "pass": "gbuffer", "resources": [{ "name": "albedo", "pattern": "default_*" }] }
    ]
}"#;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn shader_definition() -> ShaderDefinition {
    decode(STANDARD_SHADER, Format::Json).unwrap()
}

pub fn material_definition(text: &str) -> MaterialDefinition {
    decode(text, Format::Json).unwrap()
}

/// A loaded shader with both materials registered.
pub struct Scene {
    pub catalog: ResourceCatalog,
    pub states: RenderStateCache,
    pub shader: ShaderPassGraph,
    pub resolver: MaterialResolver,
    pub target: ResourceHandle,
}

impl Scene {
    pub fn new() -> Self {
        init_logging();
        let mut catalog = ResourceCatalog::new();
        let mut states = RenderStateCache::new();
        let shader = ShaderPassGraph::load(&shader_definition(), &mut catalog, &mut states).unwrap();
        for name in ["default_albedo", "bricks_albedo", "bricks_normal"] {
            catalog.declare(name, ResourceKind::Texture).unwrap();
        }
        let target = catalog.declare("swapchain", ResourceKind::Texture).unwrap();

        let mut resolver = MaterialResolver::new();
        for text in [BRICKS_MATERIAL, DEFAULT_MATERIAL] {
            resolver
                .register(&material_definition(text), &shader, &catalog, &mut states)
                .unwrap();
        }
        Self {
            catalog,
            states,
            shader,
            resolver,
            target,
        }
    }

    pub fn frame(&self, directional: u32, point: u32) -> FrameContext {
        let mut lights = LightCounts::default();
        lights.set(LightKind::Directional, directional);
        lights.set(LightKind::Point, point);
        FrameContext::new(Mat4::IDENTITY, Frustum::INFINITE, self.target).with_lights(lights)
    }

    pub fn texture(&self, name: &str) -> ResourceHandle {
        self.catalog.get(name).unwrap()
    }
}

pub fn draw(material: &str, position: Vec3) -> DrawCall {
    DrawCall::new(
        MeshHandle::from_parts(1, 1),
        material,
        Mat4::from_translation(position),
        1.0,
    )
}

pub fn queue(materials: &[&str]) -> DrawQueue {
    let mut queue = DrawQueue::new();
    for (i, material) in materials.iter().enumerate() {
        queue.push(draw(material, Vec3::new(i as f32, 0.0, 0.0)));
    }
    queue
}
