//! End-to-end tests: scene documents through processors into the renderer.

use std::cell::RefCell;
use std::rc::Rc;

use cobalt_core::data::{decode, load_file, save_file, Format, Value};
use cobalt_core::math::{Frustum, Mat4};
use cobalt_core::scene::LightKind;
use cobalt_ecs::components::{Light, Transform};
use cobalt_ecs::EcsError;
use cobalt_engine::{AssetKind, Engine, EngineConfig, EngineError, FrameEvent};
use cobalt_graphics::material::MaterialDefinition;
use cobalt_graphics::{Mode, RecordingContext, ResourceHandle, ShaderDefinition};
use rstest::rstest;

const SHADER: &str = r#"{
    "name": "standard",
    "resources": [
        { "name": "depth", "kind": "depth" },
        { "name": "backbuffer", "kind": "target" }
    ],
    "blocks": [
        { "name": "opaque", "passes": [
            { "name": "forward", "mode": "forward", "outputs": ["backbuffer", "depth"] }
        ]},
        { "name": "sun", "light": "directional", "passes": [
            { "name": "sun_light", "mode": "forward", "inputs": ["depth"], "outputs": ["backbuffer"] }
        ]}
    ]
}"#;

const MATERIALS: [&str; 2] = [
    r#"{ "name": "default", "shader": "standard", "passes": [
        { "pass": "forward", "resources": [{ "name": "albedo", "pattern": "default_*" }] }
    ]}"#,
    r#"{ "name": "bricks", "shader": "standard", "passes": [
        { "pass": "forward", "resources": [{ "name": "albedo", "pattern": "bricks_*" }] }
    ]}"#,
];

const SCENE: &str = r#"{
    "entities": [
        { "components": {
            "Name": { "value": "crate" },
            "Transform": { "position": [0, 0, -5] },
            "Spin": { "torque": [0, 1, 0] },
            "MeshRenderer": { "mesh": 1, "material": "bricks" }
        }},
        { "components": {
            "Transform": { "position": [2, 0, -5] },
            "MeshRenderer": { "mesh": 2, "material": "marble" }
        }},
        { "components": {
            "Light": { "kind": "directional", "intensity": 2.0 }
        }}
    ]
}"#;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn engine(config: EngineConfig) -> Engine {
    init_logging();
    let mut engine = Engine::new(config);
    engine.register_stock_components().unwrap();
    engine.declare_texture("default_albedo").unwrap();
    engine.declare_texture("bricks_albedo").unwrap();
    let shader: ShaderDefinition = decode(SHADER, Format::Json).unwrap();
    engine.register_shader(&shader).unwrap();
    for text in MATERIALS {
        let def: MaterialDefinition = decode(text, Format::Json).unwrap();
        engine.register_material(&def).unwrap();
    }
    engine
}

fn scene() -> Value {
    decode(SCENE, Format::Json).unwrap()
}

fn render(engine: &mut Engine) -> RecordingContext {
    let mut ctx = RecordingContext::new();
    engine.frame(
        0.016,
        Mat4::IDENTITY,
        Frustum::INFINITE,
        ResourceHandle::NULL,
        &mut ctx,
    );
    ctx
}

#[test]
fn test_scene_renders_through_processors() {
    let mut engine = engine(EngineConfig::default());
    let entities = engine.load_scene(&scene()).unwrap();
    assert_eq!(entities.len(), 3);
    assert_eq!(engine.renderable_entities().len(), 2);
    assert_eq!(engine.spinning_entities(), &entities[..1]);
    assert_eq!(engine.light_entities(), &entities[2..]);

    let ctx = render(&mut engine);
    // Two draws in each of the two forward passes; the sun block is active.
    assert_eq!(ctx.count(Mode::Forward), 4);
    assert!(ctx.ran_pass("sun_light"));

    let bricks = engine.catalog().get("bricks_albedo").unwrap();
    let fallback = engine.catalog().get("default_albedo").unwrap();
    let forward: Vec<_> = ctx
        .commands()
        .iter()
        .filter(|c| c.pass == "forward")
        .collect();
    assert_eq!(forward[0].bindings[0].resource, bricks);
    // "marble" is unknown and falls back to the default material.
    assert_eq!(forward[1].bindings[0].resource, fallback);
}

#[test]
fn test_spin_advances_each_frame() {
    let mut engine = engine(EngineConfig::default());
    let entities = engine.load_scene(&scene()).unwrap();
    let before = engine.world().get::<Transform>(entities[0]).unwrap().rotation;
    render(&mut engine);
    let after = engine.world().get::<Transform>(entities[0]).unwrap().rotation;
    assert_ne!(before, after);
}

#[rstest]
#[case(LightKind::Directional, true)]
#[case(LightKind::Point, false)]
#[case(LightKind::Spot, false)]
fn test_sun_block_follows_light_kind(#[case] kind: LightKind, #[case] sun: bool) {
    let mut engine = engine(EngineConfig::default());
    let entities = engine.load_scene(&scene()).unwrap();
    engine.world_mut().get_mut::<Light>(entities[2]).unwrap().kind = kind;

    let ctx = render(&mut engine);
    assert_eq!(ctx.ran_pass("sun_light"), sun);
    assert_eq!(ctx.count(Mode::Forward), if sun { 4 } else { 2 });
}

#[test]
fn test_frame_signal_fires_after_update() {
    let mut engine = engine(EngineConfig::default());
    let seen = Rc::new(RefCell::new(Vec::new()));

    let log = seen.clone();
    let late = engine.on_frame(10, move |e: &FrameEvent| log.borrow_mut().push(("late", e.frame)));
    let log = seen.clone();
    engine.on_frame(-10, move |e: &FrameEvent| log.borrow_mut().push(("early", e.frame)));

    render(&mut engine);
    assert!(engine.disconnect_frame(late));
    render(&mut engine);

    assert_eq!(
        *seen.borrow(),
        vec![("early", 1), ("late", 1), ("early", 2)]
    );
    assert_eq!(engine.frame_count(), 2);
}

#[test]
fn test_unknown_component_policy() {
    let doc = decode::<Value>(
        r#"{ "entities": [
            { "components": { "Transform": {} } },
            { "components": { "Transform": {}, "Hitbox": { "size": 1 } } }
        ]}"#,
        Format::Json,
    )
    .unwrap();

    let mut strict = engine(EngineConfig::default());
    let err = strict.load_scene(&doc).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Ecs(EcsError::UnknownComponentName(name)) if name == "Hitbox"
    ));
    assert_eq!(strict.world().entity_count(), 0);

    let mut lenient = engine(EngineConfig {
        strict_components: false,
        ..EngineConfig::default()
    });
    assert_eq!(lenient.load_scene(&doc).unwrap().len(), 2);
}

#[test]
fn test_shader_reload_keeps_materials_and_rejects_bad_definitions() {
    let mut engine = engine(EngineConfig::default());
    engine.load_scene(&scene()).unwrap();

    let mut def: ShaderDefinition = decode(SHADER, Format::Json).unwrap();
    def.blocks.reverse();
    engine.reload_shader(&def).unwrap();

    let ctx = render(&mut engine);
    assert_eq!(ctx.commands()[0].pass, "sun_light");
    let bricks = engine.catalog().get("bricks_albedo").unwrap();
    assert!(ctx
        .commands()
        .iter()
        .any(|c| c.pass == "forward" && c.bindings[0].resource == bricks));

    def.blocks[0].passes[0].outputs.push("nowhere".to_owned());
    assert!(matches!(
        engine.reload_shader(&def),
        Err(EngineError::Shader(_))
    ));
    assert_eq!(engine.shader("standard").unwrap().reload_count(), 1);
}

#[test]
fn test_material_errors() {
    let mut engine = engine(EngineConfig::default());
    let mut def: MaterialDefinition = decode(MATERIALS[1], Format::Json).unwrap();

    def.name = "other".to_owned();
    def.shader = "toon".to_owned();
    assert!(matches!(
        engine.register_material(&def),
        Err(EngineError::UnknownShader(name)) if name == "toon"
    ));

    def.shader = "standard".to_owned();
    def.passes[0].resources[0].pattern = "wood_*".to_owned();
    assert!(matches!(
        engine.register_material(&def),
        Err(EngineError::Material(_))
    ));
    assert!(!engine.resolver().contains("other"));
}

#[test]
fn test_background_asset_loading() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = engine(EngineConfig::default());

    let material_path = dir.path().join("marble.json");
    let material: Value = decode(
        r#"{ "name": "marble", "shader": "standard", "passes": [
            { "pass": "forward", "resources": [{ "name": "albedo", "pattern": "bricks_*" }] }
        ]}"#,
        Format::Json,
    )
    .unwrap();
    save_file(&material_path, &material, None).unwrap();

    let scene_path = dir.path().join("level.json");
    save_file(&scene_path, &scene(), None).unwrap();

    engine
        .request_asset(&material_path, AssetKind::Material)
        .unwrap();
    engine.request_asset(&scene_path, AssetKind::Scene).unwrap();
    engine
        .request_asset(dir.path().join("missing.json"), AssetKind::Shader)
        .unwrap();

    let mut results = engine.wait_assets();
    results.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(results.len(), 3);
    let failures = results.iter().filter(|(_, r)| r.is_err()).count();
    assert_eq!(failures, 1);

    assert!(engine.resolver().contains("marble"));
    assert_eq!(engine.world().entity_count(), 3);
}

#[test]
fn test_scene_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.json");

    let mut engine_a = engine(EngineConfig::default());
    engine_a.load_scene(&scene()).unwrap();
    engine_a.save_scene_file(&path).unwrap();

    let mut engine_b = engine(EngineConfig::default());
    let loaded = engine_b.load_scene_file(&path).unwrap();
    assert_eq!(loaded.len(), 3);
    assert_eq!(engine_b.renderable_entities().len(), 2);
}

#[test]
fn test_shutdown_tears_down_processors() {
    let mut engine = engine(EngineConfig::default());
    engine.load_scene(&scene()).unwrap();
    engine.shutdown();
    assert!(engine.renderable_entities().is_empty());
    assert_eq!(engine.world().processor_count(), 0);
}

#[test]
fn test_frames_after_shutdown_draw_nothing() {
    let mut engine = engine(EngineConfig::default());
    engine.load_scene(&scene()).unwrap();
    assert_eq!(render(&mut engine).count(Mode::Forward), 4);

    engine.shutdown();
    let mut ctx = RecordingContext::new();
    let stats = engine.frame(
        0.016,
        Mat4::IDENTITY,
        Frustum::INFINITE,
        ResourceHandle::NULL,
        &mut ctx,
    );
    assert_eq!(stats.draws, 0);
    assert!(ctx.commands().is_empty());
    // The entities are still there; only the queue went away.
    assert_eq!(engine.world().entity_count(), 3);

    let alive: Vec<_> = engine.world().iter_entities().collect();
    for entity in alive {
        engine.world_mut().destroy_entity(entity).unwrap();
    }
    assert!(render(&mut engine).commands().is_empty());
}

#[test]
fn test_stock_components_register_again_after_shutdown() {
    let mut engine = engine(EngineConfig::default());
    let entities = engine.load_scene(&scene()).unwrap();
    engine.shutdown();
    assert!(matches!(
        engine.load_scene(&scene()),
        Err(EngineError::NotInitialized(_))
    ));

    engine.register_stock_components().unwrap();
    assert_eq!(engine.world().processor_count(), 3);
    // Live entities are picked up by the new processors.
    assert_eq!(engine.renderable_entities(), &entities[..2]);
    assert_eq!(render(&mut engine).count(Mode::Forward), 4);

    // A second call while running changes nothing.
    engine.register_stock_components().unwrap();
    assert_eq!(engine.world().processor_count(), 3);
    assert_eq!(engine.load_scene(&scene()).unwrap().len(), 3);
}

const WATER: &str = r#"{
    "name": "water",
    "resources": [{ "name": "backbuffer", "kind": "target" }],
    "blocks": [
        { "name": "surface", "passes": [
            { "name": "ripples", "mode": "forward", "outputs": ["backbuffer"] }
        ]}
    ]
}"#;

#[test]
fn test_draws_render_only_in_their_material_shader() {
    let mut engine = engine(EngineConfig::default());
    engine.declare_texture("water_normal").unwrap();
    let water: ShaderDefinition = decode(WATER, Format::Json).unwrap();
    engine.register_shader(&water).unwrap();
    let pond: MaterialDefinition = decode(
        r#"{ "name": "pond", "shader": "water", "passes": [
            { "pass": "ripples", "resources": [{ "name": "normal", "pattern": "water_*" }] }
        ]}"#,
        Format::Json,
    )
    .unwrap();
    engine.register_material(&pond).unwrap();

    let mut doc = scene();
    let pool: Value = decode(
        r#"{ "components": {
            "Transform": { "position": [0, 0, -8] },
            "MeshRenderer": { "mesh": 3, "material": "pond" }
        }}"#,
        Format::Json,
    )
    .unwrap();
    if let Value::Map(root) = &mut doc {
        for (key, value) in root.iter_mut() {
            if let Value::List(entities) = value {
                if key.as_str() == "entities" {
                    entities.push(pool.clone());
                }
            }
        }
    }
    assert_eq!(engine.load_scene(&doc).unwrap().len(), 4);

    let ctx = render(&mut engine);
    let ripples: Vec<_> = ctx.commands().iter().filter(|c| c.shader == "water").collect();
    assert_eq!(ripples.len(), 1);
    assert_eq!(ripples[0].material.as_deref(), Some("pond"));
    assert_eq!(
        ripples[0].bindings[0].resource,
        engine.catalog().get("water_normal").unwrap()
    );

    // The standard shader keeps bricks and the fallback draw, never the pond.
    let standard: Vec<_> = ctx
        .commands()
        .iter()
        .filter(|c| c.shader == "standard" && c.pass == "forward")
        .collect();
    assert_eq!(standard.len(), 2);
    assert!(standard.iter().all(|c| c.material.as_deref() != Some("pond")));
}

#[test]
fn test_demo_assets_write_the_gbuffer_before_lighting() {
    init_logging();
    let assets = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/assets");
    let mut engine = Engine::new(EngineConfig::default());
    engine.register_stock_components().unwrap();
    for name in ["default_albedo", "bricks_albedo", "bricks_normal"] {
        engine.declare_texture(name).unwrap();
    }
    let shader: ShaderDefinition =
        load_file(format!("{assets}/standard.shader.json"), None).unwrap();
    engine.register_shader(&shader).unwrap();
    for file in ["default.material.json", "bricks.material.json"] {
        let def: MaterialDefinition = load_file(format!("{assets}/{file}"), None).unwrap();
        engine.register_material(&def).unwrap();
    }
    engine
        .load_scene_file(format!("{assets}/courtyard.scene.json"))
        .unwrap();

    let albedo = engine.catalog().get("gbuffer_albedo").unwrap();
    let normals = engine.catalog().get("gbuffer_normals").unwrap();
    let swapchain = engine.declare_texture("swapchain").unwrap();
    let mut ctx = RecordingContext::new();
    engine.frame(
        0.016,
        Mat4::IDENTITY,
        Frustum::INFINITE,
        swapchain,
        &mut ctx,
    );

    let gbuffer: Vec<_> = ctx.commands().iter().filter(|c| c.pass == "gbuffer").collect();
    assert_eq!(gbuffer.len(), 2);
    for command in gbuffer {
        assert_eq!(command.targets[..2], [albedo, normals]);
        assert!(!command.targets.contains(&swapchain));
    }

    let sun = ctx
        .commands()
        .iter()
        .find(|c| c.pass == "sun_light")
        .unwrap();
    assert_eq!(sun.targets, vec![swapchain]);
    let read: Vec<_> = sun.bindings.iter().map(|b| b.resource).collect();
    assert!(read.contains(&albedo) && read.contains(&normals));
}
