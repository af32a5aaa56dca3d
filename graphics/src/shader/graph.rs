use std::collections::{HashMap, HashSet};

use cobalt_core::scene::LightKind;
use cobalt_core::SymbolTable;

use super::definition::ShaderDefinition;
use super::pass::{Mode, PassId, PassMode, PassOutput, ShaderPass};
use crate::error::ShaderError;
use crate::frame::FrameContext;
use crate::render_state::{RenderState, RenderStateCache};
use crate::resource::{ResourceCatalog, ResourceHandle, ResourceKind};

/// An ordered group of passes.
#[derive(Debug, Clone)]
pub struct ShaderBlock {
    name: String,
    light: Option<LightKind>,
    passes: Vec<ShaderPass>,
}

impl ShaderBlock {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Light kind gating this block, if any.
    pub fn light(&self) -> Option<LightKind> {
        self.light
    }

    pub fn passes(&self) -> &[ShaderPass] {
        &self.passes
    }

    /// Returns `false` when the block contributes nothing this frame.
    pub fn prepare(&self, frame: &FrameContext) -> bool {
        self.light.map_or(true, |kind| frame.lights.get(kind) > 0)
    }
}

/// A compiled shader: blocks of passes in declaration order.
///
/// # Iteration
///
/// Rendering pulls blocks and passes through cursors instead of flattening
/// the graph up front:
///
/// ```
/// # use cobalt_core::math::{Frustum, Mat4};
/// # use cobalt_graphics::{FrameContext, Mode, RenderStateCache, ResourceCatalog, ResourceHandle};
/// # use cobalt_graphics::shader::{ShaderDefinition, ShaderPassGraph};
/// # let def: ShaderDefinition = cobalt_core::data::decode(
/// #     r#"{"name":"s","blocks":[{"name":"b","passes":[{"name":"c","mode":"compute"}]}]}"#,
/// #     cobalt_core::data::Format::Json).unwrap();
/// # let mut catalog = ResourceCatalog::new();
/// # let mut states = RenderStateCache::new();
/// let graph = ShaderPassGraph::load(&def, &mut catalog, &mut states)?;
/// let frame = FrameContext::new(Mat4::IDENTITY, Frustum::INFINITE, ResourceHandle::NULL);
///
/// let mut blocks = graph.begin(&frame);
/// while let Some(block) = blocks.next() {
///     if !block.prepare() {
///         continue;
///     }
///     let mut passes = block.begin();
///     while let Some(pass) = passes.next() {
///         match pass.prepare() {
///             Mode::None => continue,
///             mode => println!("{} runs as {mode:?}", pass.pass().name()),
///         }
///     }
/// }
/// # Ok::<(), cobalt_graphics::ShaderError>(())
/// ```
///
/// # Reload
///
/// [`reload`](Self::reload) rebuilds every block and pass. Pass identifiers
/// are interned by name in a table the graph keeps across reloads, so a pass
/// that still exists after a reload keeps its [`PassId`]. Cursors borrow the
/// graph, so none can outlive a reload.
#[derive(Debug)]
pub struct ShaderPassGraph {
    name: String,
    symbols: SymbolTable,
    blocks: Vec<ShaderBlock>,
    /// Pass id to (block index, pass index).
    lookup: HashMap<PassId, (usize, usize)>,
    reloads: u32,
}

impl ShaderPassGraph {
    /// Compiles a shader definition.
    ///
    /// Resources the shader declares are added to `catalog`, and render
    /// states are interned in `states`. Nothing is added to either when
    /// the definition is rejected.
    pub fn load(
        def: &ShaderDefinition,
        catalog: &mut ResourceCatalog,
        states: &mut RenderStateCache,
    ) -> Result<Self, ShaderError> {
        let plan = Plan::build(def, catalog)?;
        let mut graph = Self {
            name: String::new(),
            symbols: SymbolTable::new(),
            blocks: Vec::new(),
            lookup: HashMap::new(),
            reloads: 0,
        };
        graph.commit(plan, catalog, states)?;
        log::debug!(
            "Loaded shader '{}' ({} blocks, {} passes)",
            graph.name,
            graph.blocks.len(),
            graph.lookup.len()
        );
        Ok(graph)
    }

    /// Rebuilds the graph from a new definition.
    ///
    /// On error the graph is left exactly as it was.
    pub fn reload(
        &mut self,
        def: &ShaderDefinition,
        catalog: &mut ResourceCatalog,
        states: &mut RenderStateCache,
    ) -> Result<(), ShaderError> {
        let plan = Plan::build(def, catalog)?;
        self.commit(plan, catalog, states)?;
        self.reloads += 1;
        log::debug!("Reloaded shader '{}' (reload #{})", self.name, self.reloads);
        Ok(())
    }

    fn commit(
        &mut self,
        plan: Plan,
        catalog: &mut ResourceCatalog,
        states: &mut RenderStateCache,
    ) -> Result<(), ShaderError> {
        let mut handles = HashMap::with_capacity(plan.resources.len());
        for (name, kind) in &plan.resources {
            handles.insert(name.clone(), catalog.declare(name, *kind)?);
        }
        let resolve = |name: &String| handles.get(name).copied().unwrap_or(ResourceHandle::NULL);

        let mut blocks = Vec::with_capacity(plan.blocks.len());
        let mut lookup = HashMap::new();
        for (bi, block) in plan.blocks.into_iter().enumerate() {
            let mut passes = Vec::with_capacity(block.passes.len());
            for (pi, pass) in block.passes.into_iter().enumerate() {
                let id = PassId::new(self.symbols.intern(&pass.name));
                lookup.insert(id, (bi, pi));
                passes.push(ShaderPass {
                    id,
                    inputs: pass.inputs.iter().map(resolve).collect(),
                    outputs: pass
                        .outputs
                        .iter()
                        .map(|(name, kind)| match kind {
                            ResourceKind::Target => PassOutput::FrameTarget,
                            _ => PassOutput::Resource(resolve(name)),
                        })
                        .collect(),
                    render_state: states.intern(pass.state),
                    transient: vec![ResourceHandle::NULL; pass.transient as usize],
                    mode: pass.mode,
                    enabled: pass.enabled,
                    name: pass.name,
                });
            }
            blocks.push(ShaderBlock {
                name: block.name,
                light: block.light,
                passes,
            });
        }

        self.name = plan.name;
        self.blocks = blocks;
        self.lookup = lookup;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn blocks(&self) -> &[ShaderBlock] {
        &self.blocks
    }

    /// Number of successful reloads since load.
    pub fn reload_count(&self) -> u32 {
        self.reloads
    }

    pub fn pass_count(&self) -> usize {
        self.lookup.len()
    }

    /// Iterates every pass in declaration order.
    pub fn passes(&self) -> impl Iterator<Item = &ShaderPass> {
        self.blocks.iter().flat_map(|b| b.passes.iter())
    }

    /// Identifier of a pass the current definition declares.
    pub fn pass_id(&self, name: &str) -> Option<PassId> {
        let id = PassId::new(self.symbols.find(name)?);
        self.lookup.contains_key(&id).then_some(id)
    }

    /// Name behind an identifier this graph issued, even if the pass was
    /// dropped by a later reload.
    pub fn pass_name(&self, id: PassId) -> Option<&str> {
        self.symbols.resolve(id.symbol())
    }

    pub fn pass(&self, id: PassId) -> Option<&ShaderPass> {
        let &(bi, pi) = self.lookup.get(&id)?;
        Some(&self.blocks[bi].passes[pi])
    }

    fn pass_mut(&mut self, id: PassId) -> Result<&mut ShaderPass, ShaderError> {
        let &(bi, pi) = self
            .lookup
            .get(&id)
            .ok_or_else(|| ShaderError::UnknownPass(id.to_string()))?;
        Ok(&mut self.blocks[bi].passes[pi])
    }

    /// Binds a per-frame resource at one of the pass's reserved stages.
    pub fn bind_transient(
        &mut self,
        pass: PassId,
        stage: u32,
        resource: ResourceHandle,
    ) -> Result<(), ShaderError> {
        self.pass_mut(pass)?.bind_transient(stage, resource)
    }

    /// Enables or disables a pass until the next reload.
    pub fn set_enabled(&mut self, pass: PassId, enabled: bool) -> Result<(), ShaderError> {
        self.pass_mut(pass)?.enabled = enabled;
        Ok(())
    }

    /// Releases every transient binding of every pass.
    pub fn clear(&mut self) {
        for pass in self.blocks.iter_mut().flat_map(|b| b.passes.iter_mut()) {
            pass.clear();
        }
    }

    /// Starts iterating the blocks for one frame.
    pub fn begin<'g>(&'g self, frame: &'g FrameContext) -> BlockCursor<'g> {
        BlockCursor {
            blocks: self.blocks.iter(),
            frame,
        }
    }
}

/// Pulls blocks of a graph in declaration order.
pub struct BlockCursor<'g> {
    blocks: std::slice::Iter<'g, ShaderBlock>,
    frame: &'g FrameContext,
}

impl<'g> Iterator for BlockCursor<'g> {
    type Item = BlockRef<'g>;

    fn next(&mut self) -> Option<Self::Item> {
        let block = self.blocks.next()?;
        Some(BlockRef {
            block,
            frame: self.frame,
        })
    }
}

/// A block positioned on a frame.
#[derive(Clone, Copy)]
pub struct BlockRef<'g> {
    block: &'g ShaderBlock,
    frame: &'g FrameContext,
}

impl<'g> BlockRef<'g> {
    pub fn block(&self) -> &'g ShaderBlock {
        self.block
    }

    pub fn prepare(&self) -> bool {
        self.block.prepare(self.frame)
    }

    /// Starts iterating the block's passes.
    pub fn begin(&self) -> PassCursor<'g> {
        PassCursor {
            passes: self.block.passes.iter(),
            frame: self.frame,
        }
    }
}

/// Pulls passes of a block in declaration order.
pub struct PassCursor<'g> {
    passes: std::slice::Iter<'g, ShaderPass>,
    frame: &'g FrameContext,
}

impl<'g> Iterator for PassCursor<'g> {
    type Item = PassRef<'g>;

    fn next(&mut self) -> Option<Self::Item> {
        let pass = self.passes.next()?;
        Some(PassRef {
            pass,
            frame: self.frame,
        })
    }
}

/// A pass positioned on a frame.
#[derive(Clone, Copy)]
pub struct PassRef<'g> {
    pass: &'g ShaderPass,
    frame: &'g FrameContext,
}

impl<'g> PassRef<'g> {
    pub fn pass(&self) -> &'g ShaderPass {
        self.pass
    }

    pub fn prepare(&self) -> Mode {
        self.pass.prepare(self.frame)
    }

    pub fn first_resource_stage(&self) -> u32 {
        self.pass.first_resource_stage()
    }

    pub fn targets(&self) -> Vec<ResourceHandle> {
        self.pass.targets(self.frame)
    }
}

/// A definition that passed validation, ready to commit.
struct Plan {
    name: String,
    resources: Vec<(String, ResourceKind)>,
    blocks: Vec<BlockPlan>,
}

struct BlockPlan {
    name: String,
    light: Option<LightKind>,
    passes: Vec<PassPlan>,
}

struct PassPlan {
    name: String,
    mode: PassMode,
    inputs: Vec<String>,
    outputs: Vec<(String, ResourceKind)>,
    transient: u32,
    state: RenderState,
    enabled: bool,
}

impl Plan {
    /// Validates everything that can fail, without touching shared state.
    fn build(def: &ShaderDefinition, catalog: &ResourceCatalog) -> Result<Self, ShaderError> {
        if def.name.is_empty() {
            return Err(ShaderError::MissingParameters {
                context: "shader".to_owned(),
                what: "a name",
            });
        }

        let mut declared: HashMap<&str, ResourceKind> = HashMap::new();
        // At most one resource stands for the frame's render target.
        let mut frame_target: Option<&str> = None;
        let mut resources = Vec::with_capacity(def.resources.len());
        for res in &def.resources {
            if res.name.is_empty() {
                return Err(ShaderError::MissingParameters {
                    context: def.name.clone(),
                    what: "a resource name",
                });
            }
            let kind = ResourceKind::parse(&res.kind, &res.name)?;
            if declared.insert(&res.name, kind).is_some() {
                return Err(ShaderError::DuplicateResource {
                    name: res.name.clone(),
                    shader: def.name.clone(),
                });
            }
            if kind == ResourceKind::Target && frame_target.replace(&res.name).is_some() {
                return Err(ShaderError::InvalidElementType {
                    element: "second frame target",
                    value: res.name.clone(),
                    context: def.name.clone(),
                });
            }
            catalog.check(&res.name, kind)?;
            resources.push((res.name.clone(), kind));
        }

        let mut seen_passes: HashSet<&str> = HashSet::new();
        let mut blocks = Vec::with_capacity(def.blocks.len());
        for block in &def.blocks {
            if block.name.is_empty() {
                return Err(ShaderError::MissingParameters {
                    context: def.name.clone(),
                    what: "a block name",
                });
            }
            if block.passes.is_empty() {
                return Err(ShaderError::MissingParameters {
                    context: block.name.clone(),
                    what: "passes",
                });
            }
            let light = match &block.light {
                Some(kind) => Some(LightKind::parse("light", kind).map_err(|_| {
                    ShaderError::InvalidElementType {
                        element: "light kind",
                        value: kind.clone(),
                        context: block.name.clone(),
                    }
                })?),
                None => None,
            };

            let mut passes = Vec::with_capacity(block.passes.len());
            for pass in &block.passes {
                if pass.name.is_empty() {
                    return Err(ShaderError::MissingParameters {
                        context: block.name.clone(),
                        what: "a pass name",
                    });
                }
                if !seen_passes.insert(&pass.name) {
                    return Err(ShaderError::DuplicatePass {
                        name: pass.name.clone(),
                        shader: def.name.clone(),
                    });
                }
                let mode = PassMode::parse(&pass.mode, &pass.name)?;

                let lookup = |resource: &String| {
                    declared
                        .get(resource.as_str())
                        .copied()
                        .ok_or_else(|| ShaderError::UnlistedRenderTarget {
                            pass: pass.name.clone(),
                            resource: resource.clone(),
                        })
                };
                for input in &pass.inputs {
                    if lookup(input)? == ResourceKind::Target {
                        return Err(ShaderError::InvalidElementType {
                            element: "input",
                            value: input.clone(),
                            context: pass.name.clone(),
                        });
                    }
                }
                let outputs = pass
                    .outputs
                    .iter()
                    .map(|output| Ok((output.clone(), lookup(output)?)))
                    .collect::<Result<Vec<_>, ShaderError>>()?;
                if mode.is_geometry() && outputs.is_empty() {
                    return Err(ShaderError::MissingParameters {
                        context: pass.name.clone(),
                        what: "render targets",
                    });
                }

                passes.push(PassPlan {
                    name: pass.name.clone(),
                    mode,
                    inputs: pass.inputs.clone(),
                    outputs,
                    transient: pass.transient_stages,
                    state: RenderState::from_desc(&pass.render_state, &pass.name)?,
                    enabled: pass.enabled,
                });
            }
            blocks.push(BlockPlan {
                name: block.name.clone(),
                light,
                passes,
            });
        }

        Ok(Self {
            name: def.name.clone(),
            resources,
            blocks,
        })
    }
}
