use std::collections::HashMap;

use cobalt_core::data::Value;

use super::definition::MaterialDefinition;
use crate::error::MaterialError;
use crate::render_state::{RenderState, RenderStateCache, RenderStateHandle};
use crate::resource::{ResourceCatalog, ResourceHandle};
use crate::shader::{Binding, PassId, ShaderPassGraph};

/// A material resource after catalog resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundResource {
    pub name: String,
    /// Name of the catalog entry the pattern matched.
    pub matched: String,
    pub handle: ResourceHandle,
    pub params: Value,
}

/// Resolved resources and render state of a material for one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PassBinding {
    resources: Vec<BoundResource>,
    render_state: Option<RenderStateHandle>,
}

impl PassBinding {
    /// Resources in declaration order.
    pub fn resources(&self) -> &[BoundResource] {
        &self.resources
    }

    /// Render state override, if the material sets one for this pass.
    pub fn render_state(&self) -> Option<RenderStateHandle> {
        self.render_state
    }

    /// Stage bindings starting at `first_stage`.
    pub fn bindings(&self, first_stage: u32) -> impl Iterator<Item = Binding> + '_ {
        self.resources.iter().enumerate().map(move |(i, r)| Binding {
            stage: first_stage + i as u32,
            resource: r.handle,
        })
    }
}

/// A resolved material: its bindings keyed by pass identifier.
#[derive(Debug, Clone)]
pub struct PassMaterial {
    name: String,
    shader: String,
    passes: HashMap<PassId, PassBinding>,
}

impl PassMaterial {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shader whose passes the bindings refer to.
    pub fn shader(&self) -> &str {
        &self.shader
    }

    /// Binding for one pass, or `None` when the material leaves the pass
    /// to its defaults.
    pub fn binding(&self, pass: PassId) -> Option<&PassBinding> {
        self.passes.get(&pass)
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }
}

/// Name-keyed table of resolved materials.
///
/// All resolution happens in [`register`](Self::register); lookups during a
/// frame never fail except with [`MaterialError::NotFound`]. Choosing a
/// fallback for a missing material is the renderer's job.
#[derive(Debug, Default)]
pub struct MaterialResolver {
    materials: HashMap<String, PassMaterial>,
}

impl MaterialResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a material definition against a compiled shader.
    ///
    /// Each resource's pattern is matched against `catalog` in catalog
    /// order and the first match is bound. A resource that matches nothing
    /// fails the whole material.
    pub fn register(
        &mut self,
        def: &MaterialDefinition,
        shader: &ShaderPassGraph,
        catalog: &ResourceCatalog,
        states: &mut RenderStateCache,
    ) -> Result<(), MaterialError> {
        if self.materials.contains_key(&def.name) {
            return Err(MaterialError::DuplicateMaterial(def.name.clone()));
        }
        let material = resolve(def, shader, catalog, states)?;
        log::debug!(
            "Registered material '{}' for shader '{}' ({} passes)",
            material.name,
            material.shader,
            material.passes.len()
        );
        self.materials.insert(def.name.clone(), material);
        Ok(())
    }

    /// Resolves a definition and replaces any material of the same name.
    ///
    /// The previous material stays in place when resolution fails.
    pub fn replace(
        &mut self,
        def: &MaterialDefinition,
        shader: &ShaderPassGraph,
        catalog: &ResourceCatalog,
        states: &mut RenderStateCache,
    ) -> Result<(), MaterialError> {
        let material = resolve(def, shader, catalog, states)?;
        self.materials.insert(def.name.clone(), material);
        Ok(())
    }

    /// Exact-name lookup.
    pub fn get_pass_material(&self, name: &str) -> Result<&PassMaterial, MaterialError> {
        self.materials
            .get(name)
            .ok_or_else(|| MaterialError::NotFound(name.to_owned()))
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.materials.remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.materials.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.materials.keys().map(String::as_str)
    }
}

fn resolve(
    def: &MaterialDefinition,
    shader: &ShaderPassGraph,
    catalog: &ResourceCatalog,
    states: &mut RenderStateCache,
) -> Result<PassMaterial, MaterialError> {
    let missing = |what: String| MaterialError::MissingParameters {
        material: def.name.clone(),
        what,
    };
    if def.name.is_empty() {
        return Err(missing("name is empty".to_owned()));
    }

    // Validate everything before interning any render state.
    let mut resolved = Vec::with_capacity(def.passes.len());
    for pass_def in &def.passes {
        let pass = shader
            .pass_id(&pass_def.pass)
            .ok_or_else(|| MaterialError::UnknownMaterialType {
                material: def.name.clone(),
                shader: shader.name().to_owned(),
                pass: pass_def.pass.clone(),
            })?;

        let mut resources = Vec::with_capacity(pass_def.resources.len());
        for res in &pass_def.resources {
            if res.name.is_empty() || res.pattern.is_empty() {
                return Err(missing(format!(
                    "resource in pass '{}' needs a name and a pattern",
                    pass_def.pass
                )));
            }
            let entry = catalog.find(&res.pattern).ok_or_else(|| {
                missing(format!(
                    "resource '{}' of pass '{}' matches nothing for pattern '{}'",
                    res.name, pass_def.pass, res.pattern
                ))
            })?;
            resources.push(BoundResource {
                name: res.name.clone(),
                matched: entry.name.clone(),
                handle: entry.handle,
                params: res.params.clone(),
            });
        }

        let state = pass_def
            .render_state
            .as_ref()
            .map(|desc| RenderState::from_desc(desc, &def.name))
            .transpose()?;
        resolved.push((pass, resources, state));
    }

    let mut passes = HashMap::with_capacity(resolved.len());
    for (pass, resources, state) in resolved {
        let binding = PassBinding {
            resources,
            render_state: state.map(|s| states.intern(s)),
        };
        if passes.insert(pass, binding).is_some() {
            log::warn!(
                "Material '{}' configures pass '{}' more than once; the last entry wins",
                def.name,
                shader.pass_name(pass).unwrap_or("?")
            );
        }
    }

    Ok(PassMaterial {
        name: def.name.clone(),
        shader: shader.name().to_owned(),
        passes,
    })
}
