use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use cobalt_core::data::{decode, encode, Format, Value};
use cobalt_core::math::{approx_eq, quat_approx_eq};
use cobalt_core::scene::{LightKind, MeshHandle};
use glam::{Quat, Vec3, Vec4};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rstest::rstest;

use cobalt_ecs::components::*;
use cobalt_ecs::{
    register_stock_components, Component, ComponentType, Components, EcsError, Entity, Processor,
    ProcessorContext, ProcessorId, World,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn stock_world() -> World {
    init_logger();
    let mut world = World::new();
    register_stock_components(&mut world).unwrap();
    world
}

// ---------------------------------------------------------------------------
// Recording processor
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Calls {
    tracked: Vec<Entity>,
    untracked: Vec<Entity>,
    updates: Vec<(&'static str, usize)>,
}

struct Recorder {
    label: &'static str,
    calls: Rc<RefCell<Calls>>,
}

impl Processor for Recorder {
    fn on_entity_tracked(&mut self, entity: Entity, _: &Components) {
        self.calls.borrow_mut().tracked.push(entity);
    }

    fn on_entity_untracked(&mut self, entity: Entity, _: &Components) {
        self.calls.borrow_mut().untracked.push(entity);
    }

    fn update(&mut self, ctx: &mut ProcessorContext<'_>) {
        self.calls
            .borrow_mut()
            .updates
            .push((self.label, ctx.tracked.len()));
    }
}

fn recorder(
    world: &mut World,
    label: &'static str,
    required: &[ComponentType],
    priority: i32,
    calls: &Rc<RefCell<Calls>>,
) -> ProcessorId {
    world
        .register_processor(
            Recorder {
                label,
                calls: calls.clone(),
            },
            required,
            priority,
        )
        .unwrap()
}

fn transform_spin(world: &World) -> [ComponentType; 2] {
    [
        world.component_type::<Transform>().unwrap(),
        world.component_type::<Spin>().unwrap(),
    ]
}

// ---------------------------------------------------------------------------
// Tracked set transitions
// ---------------------------------------------------------------------------

#[test]
fn spinning_entity_is_tracked_after_finalize() {
    let mut world = stock_world();
    let calls = Rc::new(RefCell::new(Calls::default()));
    let required = transform_spin(&world);
    let id = recorder(&mut world, "spin", &required, 0, &calls);

    let e = world.create_entity();
    world
        .insert(e, Transform::from_translation(Vec3::ZERO))
        .unwrap();
    world.insert(e, Spin::new(Vec3::new(0.0, 1.0, 0.0))).unwrap();
    assert_eq!(world.tracked(id).unwrap().len(), 0);

    world.finalize_entity(e).unwrap();
    assert_eq!(world.tracked(id).unwrap().len(), 1);
}

#[test]
fn detaching_required_component_untracks_once() {
    let mut world = stock_world();
    let calls = Rc::new(RefCell::new(Calls::default()));
    let required = transform_spin(&world);
    let id = recorder(&mut world, "spin", &required, 0, &calls);

    let e = world.create_entity();
    world.attach::<Transform>(e).unwrap();
    world.insert(e, Spin::new(Vec3::Y)).unwrap();
    world.finalize_entity(e).unwrap();

    world.detach::<Spin>(e).unwrap();
    assert_eq!(world.tracked(id).unwrap().len(), 0);
    assert_eq!(calls.borrow().untracked, vec![e]);

    // Already untracked: no further callback.
    world.detach::<Spin>(e).unwrap();
    world.detach::<Transform>(e).unwrap();
    assert_eq!(calls.borrow().untracked.len(), 1);
}

#[test]
fn reattach_tracks_again() {
    let mut world = stock_world();
    let calls = Rc::new(RefCell::new(Calls::default()));
    let required = transform_spin(&world);
    let id = recorder(&mut world, "spin", &required, 0, &calls);

    let e = world.create_entity();
    world.attach::<Transform>(e).unwrap();
    world.finalize_entity(e).unwrap();
    assert!(!world.is_tracking(id, e));

    world.attach::<Spin>(e).unwrap();
    assert!(world.is_tracking(id, e));
    assert_eq!(calls.borrow().tracked, vec![e]);
}

#[test]
fn destroy_lets_untrack_read_final_state() {
    struct Snapshot(Rc<RefCell<Option<Vec3>>>);
    impl Processor for Snapshot {
        fn on_entity_untracked(&mut self, entity: Entity, components: &Components) {
            let t = components.get::<Transform>(entity).unwrap();
            *self.0.borrow_mut() = Some(t.position);
        }
        fn update(&mut self, _: &mut ProcessorContext<'_>) {}
    }

    let mut world = stock_world();
    let seen = Rc::new(RefCell::new(None));
    let required = transform_spin(&world);
    world
        .register_processor(Snapshot(seen.clone()), &required, 0)
        .unwrap();

    let e = world.create_entity();
    world.insert(e, Transform::from_xyz(7.0, 8.0, 9.0)).unwrap();
    world.attach::<Spin>(e).unwrap();
    world.finalize_entity(e).unwrap();
    world.destroy_entity(e).unwrap();

    assert_eq!(*seen.borrow(), Some(Vec3::new(7.0, 8.0, 9.0)));
    assert!(matches!(
        world.get::<Transform>(e),
        Err(EcsError::InvalidEntity(_))
    ));
}

// ---------------------------------------------------------------------------
// Randomized membership closure
// ---------------------------------------------------------------------------

fn brute_force(world: &World, required: &[ComponentType]) -> HashSet<Entity> {
    world
        .iter_entities()
        .filter(|&e| world.is_finalized(e))
        .filter(|&e| required.iter().all(|&ty| world.has_component(e, ty)))
        .collect()
}

#[test]
fn tracked_sets_match_brute_force_intersection() {
    let mut world = stock_world();
    let types = [
        world.component_type::<Transform>().unwrap(),
        world.component_type::<Spin>().unwrap(),
        world.component_type::<Color>().unwrap(),
    ];
    let requirements: [&[ComponentType]; 3] =
        [&types[0..2], &types[2..3], &types[..]];

    let mut processors = Vec::new();
    for (i, req) in requirements.iter().enumerate() {
        let calls = Rc::new(RefCell::new(Calls::default()));
        let id = recorder(&mut world, "replay", req, i as i32, &calls);
        processors.push((id, *req, calls));
    }

    let mut rng = StdRng::seed_from_u64(0xC0BA17);
    let mut live: Vec<Entity> = Vec::new();

    for step in 0..2_000 {
        match rng.gen_range(0..10) {
            0 | 1 => live.push(world.create_entity()),
            2 if !live.is_empty() => {
                let e = live.swap_remove(rng.gen_range(0..live.len()));
                world.destroy_entity(e).unwrap();
            }
            3 | 4 if !live.is_empty() => {
                let e = live[rng.gen_range(0..live.len())];
                world.finalize_entity(e).unwrap();
            }
            5..=7 if !live.is_empty() => {
                let e = live[rng.gen_range(0..live.len())];
                let ty = types[rng.gen_range(0..types.len())];
                let result = world.attach_component(e, ty);
                assert!(result.is_ok() || matches!(result, Err(EcsError::DuplicateComponent { .. })));
            }
            8 | 9 if !live.is_empty() => {
                let e = live[rng.gen_range(0..live.len())];
                let ty = types[rng.gen_range(0..types.len())];
                world.detach_component(e, ty).unwrap();
            }
            _ => {}
        }

        for (id, req, calls) in &processors {
            let tracked: HashSet<Entity> = world.tracked(*id).unwrap().iter().copied().collect();
            assert_eq!(tracked, brute_force(&world, req), "step {step}");
            let calls = calls.borrow();
            assert_eq!(
                calls.tracked.len() - calls.untracked.len(),
                tracked.len(),
                "callbacks out of balance at step {step}"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Update dispatch
// ---------------------------------------------------------------------------

#[test]
fn update_runs_by_priority_then_registration() {
    let mut world = stock_world();
    let calls = Rc::new(RefCell::new(Calls::default()));
    recorder(&mut world, "late", &[], 10, &calls);
    recorder(&mut world, "first", &[], -1, &calls);
    recorder(&mut world, "tie_a", &[], 5, &calls);
    recorder(&mut world, "tie_b", &[], 5, &calls);

    world.update(0.016);
    let order: Vec<_> = calls.borrow().updates.iter().map(|(l, _)| *l).collect();
    assert_eq!(order, vec!["first", "tie_a", "tie_b", "late"]);
}

#[test]
fn structural_changes_are_deferred_until_after_update() {
    struct Reaper {
        seen: Rc<RefCell<Vec<usize>>>,
    }
    impl Processor for Reaper {
        fn update(&mut self, ctx: &mut ProcessorContext<'_>) {
            self.seen.borrow_mut().push(ctx.tracked.len());
            for &e in ctx.tracked {
                ctx.commands.destroy(e);
            }
            ctx.commands
                .create_entity()
                .with(Name::new("spawned"))
                .build();
        }
    }

    let mut world = stock_world();
    let name = world.component_type::<Name>().unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let id = world
        .register_processor(Reaper { seen: seen.clone() }, &[name], 0)
        .unwrap();

    for i in 0..3 {
        let e = world.create_entity();
        world.insert(e, Name::new(format!("n{i}"))).unwrap();
        world.finalize_entity(e).unwrap();
    }

    world.update(0.016);
    assert_eq!(*seen.borrow(), vec![3]);
    // The three originals are gone, the spawned one is finalized and tracked.
    assert_eq!(world.entity_count(), 1);
    assert_eq!(world.tracked(id).unwrap().len(), 1);
    let (_, n) = world.iter::<Name>().next().unwrap();
    assert_eq!(n.as_str(), "spawned");
}

#[test]
fn processors_mutate_components_through_context() {
    struct Grow;
    impl Processor for Grow {
        fn update(&mut self, ctx: &mut ProcessorContext<'_>) {
            for &e in ctx.tracked {
                if let Ok(t) = ctx.components.get_mut::<Transform>(e) {
                    t.scale *= 2.0;
                }
            }
        }
    }

    let mut world = stock_world();
    let ty = world.component_type::<Transform>().unwrap();
    world.register_processor(Grow, &[ty], 0).unwrap();
    let e = world.create_entity();
    world.attach::<Transform>(e).unwrap();
    world.finalize_entity(e).unwrap();

    world.update(0.1);
    world.update(0.1);
    assert_eq!(world.get::<Transform>(e).unwrap().scale, Vec3::splat(4.0));
}

#[test]
fn failed_deferred_command_is_skipped() {
    let mut world = stock_world();
    let e = world.create_entity();
    world.destroy_entity(e).unwrap();
    world.commands().destroy(e);
    world.commands().insert(e, Name::new("late"));
    assert_eq!(world.apply_commands(), 0);
    assert!(world.commands().is_empty());
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn color_document_round_trips() {
    let mut world = stock_world();
    let ty = world.lookup_component("Color").unwrap();
    let e = world.create_entity();
    world.attach_component(e, ty).unwrap();

    let data: Value = decode(r#"{"value":[1,0,0,1]}"#, Format::Json).unwrap();
    world.load_component(e, ty, &data).unwrap();
    let saved = world.save_component(e, ty).unwrap();

    assert_eq!(
        saved.get("value").unwrap().read_vec4("value").unwrap(),
        Vec4::new(1.0, 0.0, 0.0, 1.0)
    );
    assert_eq!(encode(&saved, Format::Json).unwrap(), encode(&data, Format::Json).unwrap());
}

fn round_trip<T: Component>(value: &T) -> T {
    let text = encode(&value.save(), Format::Ron).unwrap();
    T::load(&decode(&text, Format::Ron).unwrap()).unwrap()
}

#[rstest]
#[case(Transform::IDENTITY)]
#[case(Transform::from_xyz(1.5, -2.0, 3.25)
    .with_rotation(Quat::from_euler(glam::EulerRot::XYZ, 0.3, 1.2, -0.7))
    .with_scale(Vec3::new(1.0, 2.0, 0.5)))]
fn transform_round_trip(#[case] t: Transform) {
    let back = round_trip(&t);
    assert!(back.position.abs_diff_eq(t.position, 1e-5));
    assert!(quat_approx_eq(back.rotation, t.rotation));
    assert!(back.scale.abs_diff_eq(t.scale, 1e-5));
}

#[rstest]
#[case(Color::WHITE)]
#[case(Color::new(0.1, 0.2, 0.3, 0.4))]
fn color_round_trip(#[case] c: Color) {
    assert!(round_trip(&c).value.abs_diff_eq(c.value, 1e-5));
}

#[rstest]
#[case(LightKind::Directional, 0.25)]
#[case(LightKind::Point, 1.0)]
#[case(LightKind::Spot, 40.0)]
fn light_round_trip(#[case] kind: LightKind, #[case] intensity: f32) {
    let light = Light {
        kind,
        color: Vec3::new(1.0, 0.5, 0.25),
        intensity,
    };
    let back = round_trip(&light);
    assert_eq!(back.kind, kind);
    assert!(approx_eq(back.intensity, intensity));
}

#[test]
fn remaining_stock_round_trips() {
    assert_eq!(round_trip(&Spin::new(Vec3::Y)), Spin::new(Vec3::Y));
    assert_eq!(round_trip(&Name::new("lamp")), Name::new("lamp"));
    let r = MeshRenderer::new(MeshHandle::from_parts(9, 2), "metal");
    assert_eq!(round_trip(&r), r);
}

#[test]
fn scene_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.ron");

    let mut world = stock_world();
    let e = world.create_entity();
    world.insert(e, Light::new(LightKind::Spot)).unwrap();
    world.insert(e, Transform::from_xyz(0.0, 3.0, 0.0)).unwrap();
    world.finalize_entity(e).unwrap();
    cobalt_core::data::save_file(&path, &world.save_scene().unwrap(), None).unwrap();

    let doc: Value = cobalt_core::data::load_file(&path, None).unwrap();
    let mut other = stock_world();
    let loaded = other.load_scene(&doc).unwrap();
    assert_eq!(other.get::<Light>(loaded[0]).unwrap().kind, LightKind::Spot);
}
