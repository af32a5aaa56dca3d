//! Headless demo: loads the courtyard assets in the background, then renders
//! a few frames into a recording context and prints what was submitted.
//!
//! Run with:
//!   cargo run --example demo
//!   cargo run --example demo -- --frames 10 --no-culling
//!   cargo run --example demo -- --config engine.ron

use std::path::PathBuf;

use clap::Parser;
use cobalt_core::math::{Frustum, Mat4, Vec3};
use cobalt_engine::{AssetKind, Engine, EngineConfig, EngineError, FrameEvent};
use cobalt_graphics::{Mode, RecordingContext, ResourceHandle};

/// Cobalt Engine headless demo.
#[derive(Parser, Debug)]
#[command(name = "Cobalt Demo", version)]
struct Args {
    /// Directory holding the shader, material and scene files.
    #[arg(long, default_value = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/assets"))]
    assets: PathBuf,

    /// Engine configuration file (JSON or RON).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of frames to render.
    #[arg(long, default_value = "3")]
    frames: u64,

    /// Render draws outside the view frustum too.
    #[arg(long)]
    no_culling: bool,

    /// Print every recorded submission of the last frame.
    #[arg(long)]
    verbose: bool,
}

const TEXTURES: [&str; 3] = ["default_albedo", "bricks_albedo", "bricks_normal"];

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(err) = run(&args) {
        eprintln!("demo failed: {err}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), EngineError> {
    cobalt_engine::init();

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if args.no_culling {
        config.frustum_culling = false;
    }

    let mut engine = Engine::new(config);
    engine.register_stock_components()?;
    for name in TEXTURES {
        engine.declare_texture(name)?;
    }

    // Materials resolve against a registered shader, so load in two waves.
    load(&mut engine, &[("standard.shader.json", AssetKind::Shader)], args)?;
    load(
        &mut engine,
        &[
            ("default.material.json", AssetKind::Material),
            ("bricks.material.json", AssetKind::Material),
            ("courtyard.scene.json", AssetKind::Scene),
        ],
        args,
    )?;

    let backbuffer = engine
        .catalog()
        .get("backbuffer")
        .unwrap_or(ResourceHandle::NULL);
    engine.on_frame(0, |event: &FrameEvent| {
        log::info!("Frame {} (dt {:.3}s)", event.frame, event.dt);
    });

    let view = Mat4::look_at_rh(Vec3::new(0.0, 1.0, 2.0), Vec3::new(0.0, 0.0, -5.0), Vec3::Y);
    let projection = Mat4::perspective_rh(60f32.to_radians(), 16.0 / 9.0, 0.1, 100.0);
    let frustum = Frustum::from_view_projection(projection * view);

    let mut ctx = RecordingContext::new();
    for _ in 0..args.frames {
        ctx.clear();
        let stats = engine.frame(1.0 / 60.0, view, frustum, backbuffer, &mut ctx);
        println!(
            "frame {}: {} passes run, {} skipped, {} draws, {} dispatches, {} culled, {} fallbacks",
            engine.frame_count(),
            stats.passes_run,
            stats.passes_skipped,
            stats.draws,
            stats.dispatches,
            stats.culled,
            stats.fallbacks,
        );
    }

    println!(
        "last frame: {} deferred, {} forward, {} compute submissions",
        ctx.count(Mode::Deferred),
        ctx.count(Mode::Forward),
        ctx.count(Mode::Compute),
    );
    if args.verbose {
        for command in ctx.commands() {
            println!(
                "  {:?} {}/{} material={:?} bindings={}",
                command.mode,
                command.shader,
                command.pass,
                command.material,
                command.bindings.len()
            );
        }
    }

    engine.shutdown();
    Ok(())
}

/// Queues every file, waits for the pool and stops at the first failure.
fn load(engine: &mut Engine, files: &[(&str, AssetKind)], args: &Args) -> Result<(), EngineError> {
    for (file, kind) in files {
        engine.request_asset(args.assets.join(file), *kind)?;
    }
    for (path, result) in engine.wait_assets() {
        println!("loaded {}", path.display());
        result?;
    }
    Ok(())
}
