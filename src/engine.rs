//! The engine aggregate.

use std::path::{Path, PathBuf};

use cobalt_core::data::{from_value, load_file, save_file, DataError, Value};
use cobalt_core::math::{Frustum, Mat4};
use cobalt_core::scene::LightCounts;
use cobalt_core::signal::{Signal, SlotHandle};
use cobalt_core::worker::WorkerPool;
use cobalt_ecs::components::{Light, MeshRenderer, Spin, Transform};
use cobalt_ecs::{register_stock_components, Entity, ProcessorId, World};
use cobalt_graphics::material::MaterialDefinition;
use cobalt_graphics::{
    DrawQueue, FrameContext, FrameStats, GraphicsContext, MaterialResolver, RenderStateCache,
    Renderer, ResourceCatalog, ResourceHandle, ResourceKind, ShaderDefinition, ShaderPassGraph,
};

use crate::asset_loader::{AssetKind, AssetLoader, AssetRequestId, LoadedAsset};
use crate::processors::{DrawExtractProcessor, LightCountProcessor, SpinProcessor};
use crate::{EngineConfig, EngineError};

/// Argument of the frame signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameEvent {
    /// Frames completed so far, counting this one.
    pub frame: u64,
    pub dt: f32,
}

/// Processor ids of the engine's own processors.
#[derive(Debug, Clone, Copy)]
struct EngineProcessors {
    spin: ProcessorId,
    lights: ProcessorId,
    draws: ProcessorId,
}

// Engine processors run in this order, around application processors
// registered at priority 0.
const SPIN_PRIORITY: i32 = -100;
const LIGHT_PRIORITY: i32 = 100;
const DRAW_PRIORITY: i32 = 200;

/// The main engine
pub struct Engine {
    config: EngineConfig,
    world: World,
    catalog: ResourceCatalog,
    states: RenderStateCache,
    /// Rendered in registration order.
    shaders: Vec<ShaderPassGraph>,
    resolver: MaterialResolver,
    renderer: Renderer,
    loader: AssetLoader,
    frame_signal: Signal<FrameEvent>,
    frame: u64,
    stock_components: bool,
    processors: Option<EngineProcessors>,
}

impl Engine {
    /// Creates an engine with an empty world and no shaders.
    pub fn new(config: EngineConfig) -> Self {
        let pool = WorkerPool::new(config.worker_threads, config.worker_queue_capacity);
        let mut renderer = Renderer::new();
        renderer.set_default_material(config.default_material.clone());
        renderer.set_frustum_culling(config.frustum_culling);

        log::info!(
            "Engine created ({} workers, default material {:?})",
            config.worker_threads,
            config.default_material
        );
        Self {
            loader: AssetLoader::new(pool, config.asset_format),
            config,
            world: World::new(),
            catalog: ResourceCatalog::new(),
            states: RenderStateCache::new(),
            shaders: Vec::new(),
            resolver: MaterialResolver::new(),
            renderer,
            frame_signal: Signal::new(),
            frame: 0,
            stock_components: false,
            processors: None,
        }
    }

    /// Registers the stock component types and the engine processors.
    /// Calling it again does nothing; after [`shutdown`](Self::shutdown) it
    /// brings the processors back.
    pub fn register_stock_components(&mut self) -> Result<(), EngineError> {
        if !self.stock_components {
            register_stock_components(&mut self.world)?;
            self.stock_components = true;
        }
        if self.processors.is_some() {
            return Ok(());
        }

        let transform = self.world.component_type::<Transform>()?;
        let spin = self.world.component_type::<Spin>()?;
        let light = self.world.component_type::<Light>()?;
        let mesh = self.world.component_type::<MeshRenderer>()?;

        let processors = EngineProcessors {
            spin: self
                .world
                .register_processor(SpinProcessor, &[transform, spin], SPIN_PRIORITY)?,
            lights: self
                .world
                .register_processor(LightCountProcessor::new(), &[light], LIGHT_PRIORITY)?,
            draws: self.world.register_processor(
                DrawExtractProcessor::new(self.config.mesh_radius),
                &[transform, mesh],
                DRAW_PRIORITY,
            )?,
        };
        log::debug!("Engine processors registered: {processors:?}");
        self.processors = Some(processors);
        Ok(())
    }

    // ---- Shaders and materials ----

    /// Compiles and registers a shader. Names must be unique.
    pub fn register_shader(&mut self, def: &ShaderDefinition) -> Result<(), EngineError> {
        let result = if self.shader(&def.name).is_some() {
            Err(EngineError::DuplicateShader(def.name.clone()))
        } else {
            ShaderPassGraph::load(def, &mut self.catalog, &mut self.states)
                .map(|graph| self.shaders.push(graph))
                .map_err(EngineError::from)
        };
        report("register shader", &def.name, result)
    }

    /// Rebuilds a registered shader. On error the old graph stays active.
    ///
    /// Materials stay bound to passes that keep their name.
    pub fn reload_shader(&mut self, def: &ShaderDefinition) -> Result<(), EngineError> {
        let result = match self.shaders.iter_mut().find(|g| g.name() == def.name) {
            Some(graph) => graph
                .reload(def, &mut self.catalog, &mut self.states)
                .map_err(EngineError::from),
            None => Err(EngineError::UnknownShader(def.name.clone())),
        };
        report("reload shader", &def.name, result)
    }

    pub fn shader(&self, name: &str) -> Option<&ShaderPassGraph> {
        self.shaders.iter().find(|g| g.name() == name)
    }

    pub fn shader_mut(&mut self, name: &str) -> Option<&mut ShaderPassGraph> {
        self.shaders.iter_mut().find(|g| g.name() == name)
    }

    pub fn shaders(&self) -> &[ShaderPassGraph] {
        &self.shaders
    }

    /// Resolves and registers a material against the shader it names.
    pub fn register_material(&mut self, def: &MaterialDefinition) -> Result<(), EngineError> {
        let result = self.resolve_material(def, false);
        report("register material", &def.name, result)
    }

    /// Like [`register_material`](Self::register_material), replacing any
    /// material of the same name.
    pub fn replace_material(&mut self, def: &MaterialDefinition) -> Result<(), EngineError> {
        let result = self.resolve_material(def, true);
        report("replace material", &def.name, result)
    }

    fn resolve_material(&mut self, def: &MaterialDefinition, replace: bool) -> Result<(), EngineError> {
        let graph = self
            .shaders
            .iter()
            .find(|g| g.name() == def.shader)
            .ok_or_else(|| EngineError::UnknownShader(def.shader.clone()))?;
        if replace {
            self.resolver
                .replace(def, graph, &self.catalog, &mut self.states)?;
        } else {
            self.resolver
                .register(def, graph, &self.catalog, &mut self.states)?;
        }
        Ok(())
    }

    pub fn resolver(&self) -> &MaterialResolver {
        &self.resolver
    }

    /// Adds a named texture that materials can match by pattern.
    pub fn declare_texture(&mut self, name: &str) -> Result<ResourceHandle, EngineError> {
        Ok(self.catalog.declare(name, ResourceKind::Texture)?)
    }

    pub fn catalog(&self) -> &ResourceCatalog {
        &self.catalog
    }

    pub fn render_states(&self) -> &RenderStateCache {
        &self.states
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    // ---- World ----

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Tracked set of one of the engine processors.
    pub fn renderable_entities(&self) -> &[Entity] {
        self.processors
            .and_then(|p| self.world.tracked(p.draws).ok())
            .unwrap_or(&[])
    }

    /// Entities the engine's spin and light processors track.
    pub fn spinning_entities(&self) -> &[Entity] {
        self.processors
            .and_then(|p| self.world.tracked(p.spin).ok())
            .unwrap_or(&[])
    }

    pub fn light_entities(&self) -> &[Entity] {
        self.processors
            .and_then(|p| self.world.tracked(p.lights).ok())
            .unwrap_or(&[])
    }

    /// Loads a scene document. Nothing is kept if any entity fails.
    pub fn load_scene(&mut self, doc: &Value) -> Result<Vec<Entity>, EngineError> {
        if self.processors.is_none() {
            return Err(EngineError::NotInitialized("loading scenes"));
        }
        let result = self
            .world
            .load_scene_with(doc, self.config.unknown_components())
            .map_err(EngineError::from);
        report("load scene", "<document>", result)
    }

    pub fn load_scene_file(&mut self, path: impl AsRef<Path>) -> Result<Vec<Entity>, EngineError> {
        let path = path.as_ref();
        let doc: Value = report(
            "read scene",
            &path.display().to_string(),
            load_file(path, self.config.asset_format).map_err(EngineError::from),
        )?;
        self.load_scene(&doc)
    }

    pub fn save_scene_file(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        let doc = self.world.save_scene()?;
        save_file(path, &doc, self.config.asset_format)?;
        Ok(())
    }

    // ---- Frame ----

    /// Connects a callback fired after every world update.
    pub fn on_frame(&mut self, priority: i32, callback: impl FnMut(&FrameEvent) + 'static) -> SlotHandle {
        self.frame_signal.connect(priority, callback)
    }

    pub fn disconnect_frame(&mut self, handle: SlotHandle) -> bool {
        self.frame_signal.disconnect(handle)
    }

    /// Frames completed so far.
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Binds a per-frame resource at a reserved stage of a shader pass.
    /// Released after the next rendered frame.
    pub fn bind_transient(
        &mut self,
        shader: &str,
        pass: &str,
        stage: u32,
        resource: ResourceHandle,
    ) -> Result<(), EngineError> {
        let graph = self
            .shader_mut(shader)
            .ok_or_else(|| EngineError::UnknownShader(shader.to_owned()))?;
        let id = graph
            .pass_id(pass)
            .ok_or_else(|| cobalt_graphics::ShaderError::UnknownPass(pass.to_owned()))?;
        graph.bind_transient(id, stage, resource)?;
        Ok(())
    }

    /// Runs one frame: world update, frame signal, then every shader.
    pub fn frame<C: GraphicsContext + ?Sized>(
        &mut self,
        dt: f32,
        view: Mat4,
        frustum: Frustum,
        target: ResourceHandle,
        ctx: &mut C,
    ) -> FrameStats {
        self.world.update(dt);
        self.frame += 1;
        self.frame_signal.emit(&FrameEvent {
            frame: self.frame,
            dt,
        });

        let lights = self
            .world
            .resource::<LightCounts>()
            .copied()
            .unwrap_or_default();
        let frame = FrameContext::new(view, frustum, target).with_lights(lights);
        let empty = DrawQueue::new();
        let queue = self.world.resource::<DrawQueue>().unwrap_or(&empty);

        let mut stats = FrameStats::default();
        for graph in &self.shaders {
            let shader_stats = self
                .renderer
                .render(graph, &self.resolver, &frame, queue, &mut *ctx);
            stats.accumulate(&shader_stats);
        }
        for graph in &mut self.shaders {
            graph.clear();
        }

        log::trace!("Frame {} done: {stats:?}", self.frame);
        stats
    }

    // ---- Assets ----

    /// Queues a definition file for background loading.
    pub fn request_asset(
        &mut self,
        path: impl AsRef<Path>,
        kind: AssetKind,
    ) -> Result<AssetRequestId, EngineError> {
        Ok(self.loader.request(path, kind)?)
    }

    /// Applies every background load finished so far.
    pub fn poll_assets(&mut self) -> Vec<(PathBuf, Result<(), EngineError>)> {
        let loaded = self.loader.poll_results();
        self.apply_assets(loaded)
    }

    /// Waits for every queued load, then applies them.
    pub fn wait_assets(&mut self) -> Vec<(PathBuf, Result<(), EngineError>)> {
        let loaded = self.loader.wait();
        self.apply_assets(loaded)
    }

    fn apply_assets(&mut self, loaded: Vec<LoadedAsset>) -> Vec<(PathBuf, Result<(), EngineError>)> {
        loaded
            .into_iter()
            .map(|asset| {
                let result = self.apply_asset(asset.kind, asset.document, &asset.path);
                (asset.path, result)
            })
            .collect()
    }

    fn apply_asset(
        &mut self,
        kind: AssetKind,
        document: Result<Value, DataError>,
        path: &Path,
    ) -> Result<(), EngineError> {
        let doc = report(
            "read asset",
            &path.display().to_string(),
            document.map_err(EngineError::from),
        )?;
        match kind {
            AssetKind::Shader => {
                let def: ShaderDefinition = from_value(&doc)?;
                if self.shader(&def.name).is_some() {
                    self.reload_shader(&def)
                } else {
                    self.register_shader(&def)
                }
            }
            AssetKind::Material => {
                let def: MaterialDefinition = from_value(&doc)?;
                self.replace_material(&def)
            }
            AssetKind::Scene => self.load_scene(&doc).map(|_| ()),
        }
    }

    /// Tears down processors and drops queued loads. Later frames draw
    /// nothing until the processors are registered again.
    pub fn shutdown(&mut self) {
        let dropped = self.loader.cancel_pending();
        self.world.teardown_processors();
        self.world.remove_resource::<DrawQueue>();
        self.world.remove_resource::<LightCounts>();
        self.processors = None;
        log::info!("Engine shut down ({dropped} queued loads dropped)");
    }
}

/// Logs a load-time failure before handing it back.
fn report<T>(action: &str, name: &str, result: Result<T, EngineError>) -> Result<T, EngineError> {
    if let Err(err) = &result {
        log::error!("Failed to {action} '{name}': {err}");
    }
    result
}
