//! Named GPU resources referenced through handles.
//!
//! The [`ResourceCatalog`] is the single table of resource names known to
//! the renderer: render targets declared by shaders and textures registered
//! by the application. Shaders reference entries by exact name; materials
//! find them by wildcard pattern, scanning in registration order.

use std::collections::HashMap;

use cobalt_core::{Handle, HandleAllocator};

use crate::error::ShaderError;

/// Handle category for catalog resources.
pub enum ResourceCategory {}

/// Handle to a catalog resource.
pub type ResourceHandle = Handle<ResourceCategory>;

/// What a catalog entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Texture,
    Depth,
    Buffer,
    /// Stand-in for the frame's output target, substituted when a pass runs.
    Target,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Texture,
        ResourceKind::Depth,
        ResourceKind::Buffer,
        ResourceKind::Target,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Texture => "texture",
            ResourceKind::Depth => "depth",
            ResourceKind::Buffer => "buffer",
            ResourceKind::Target => "target",
        }
    }

    /// Parses the document name of a kind.
    pub fn parse(value: &str, context: &str) -> Result<Self, ShaderError> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == value)
            .ok_or_else(|| ShaderError::InvalidElementType {
                element: "resource kind",
                value: value.to_owned(),
                context: context.to_owned(),
            })
    }
}

/// One catalog entry.
#[derive(Debug, Clone)]
pub struct ResourceEntry {
    pub name: String,
    pub kind: ResourceKind,
    pub handle: ResourceHandle,
}

/// Ordered name to handle table.
///
/// Entries are never removed, so a handle stays valid for the catalog's
/// lifetime and re-declaring a name returns its existing handle.
#[derive(Debug, Default)]
pub struct ResourceCatalog {
    handles: HandleAllocator<ResourceCategory>,
    entries: Vec<ResourceEntry>,
    by_name: HashMap<String, usize>,
}

impl ResourceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a resource, returning the existing handle if the name is
    /// already known with the same kind.
    pub fn declare(&mut self, name: &str, kind: ResourceKind) -> Result<ResourceHandle, ShaderError> {
        if let Some(existing) = self.check(name, kind)? {
            return Ok(existing);
        }
        let handle = self.handles.allocate();
        self.by_name.insert(name.to_owned(), self.entries.len());
        self.entries.push(ResourceEntry {
            name: name.to_owned(),
            kind,
            handle,
        });
        log::debug!("Declared {} resource '{name}' as {handle}", kind.as_str());
        Ok(handle)
    }

    /// Checks whether `declare(name, kind)` would succeed without changing
    /// the catalog. Returns the existing handle, if any.
    pub fn check(&self, name: &str, kind: ResourceKind) -> Result<Option<ResourceHandle>, ShaderError> {
        match self.entry(name) {
            Some(entry) if entry.kind == kind => Ok(Some(entry.handle)),
            Some(entry) => Err(ShaderError::InvalidElementType {
                element: "resource kind",
                value: kind.as_str().to_owned(),
                context: format!("'{name}' already declared as {}", entry.kind.as_str()),
            }),
            None => Ok(None),
        }
    }

    /// Exact-name lookup.
    pub fn get(&self, name: &str) -> Option<ResourceHandle> {
        self.entry(name).map(|e| e.handle)
    }

    pub fn entry(&self, name: &str) -> Option<&ResourceEntry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    /// Returns the first entry, in declaration order, whose name matches
    /// `pattern`.
    pub fn find(&self, pattern: &str) -> Option<&ResourceEntry> {
        self.entries.iter().find(|e| glob_match(pattern, &e.name))
    }

    /// Returns the entry owning a handle.
    pub fn resolve(&self, handle: ResourceHandle) -> Option<&ResourceEntry> {
        self.entries.iter().find(|e| e.handle == handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Matches `name` against a pattern where `*` matches any run of characters
/// and `?` matches exactly one.
pub fn glob_match(pattern: &str, name: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let n: Vec<char> = name.chars().collect();
    let (mut pi, mut ni) = (0, 0);
    // Position of the last `*` and the name index it was tried at.
    let mut star: Option<(usize, usize)> = None;

    while ni < n.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == n[ni]) {
            pi += 1;
            ni += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ni));
            pi += 1;
        } else if let Some((sp, sn)) = star {
            pi = sp + 1;
            ni = sn + 1;
            star = Some((sp, sn + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|&c| c == '*')
}
