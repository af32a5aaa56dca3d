//! Scene-level vocabulary shared by the ECS and the renderer.

use serde::{Deserialize, Serialize};

use crate::data::DataError;

/// Handle category for meshes owned by the graphics collaborator.
pub enum MeshCategory {}

/// Handle to a mesh owned by the graphics collaborator.
pub type MeshHandle = crate::handle::Handle<MeshCategory>;

/// Kind of light source. Shader blocks can be gated on a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightKind {
    Directional,
    Point,
    Spot,
}

impl LightKind {
    /// All kinds, in a fixed order usable as an array index.
    pub const ALL: [LightKind; 3] = [LightKind::Directional, LightKind::Point, LightKind::Spot];

    /// Lower-case name used in documents.
    pub fn as_str(self) -> &'static str {
        match self {
            LightKind::Directional => "directional",
            LightKind::Point => "point",
            LightKind::Spot => "spot",
        }
    }

    /// Parses the document name of a kind.
    pub fn parse(field: &str, value: &str) -> Result<Self, DataError> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == value)
            .ok_or_else(|| DataError::InvalidVariant {
                field: field.to_owned(),
                value: value.to_owned(),
            })
    }

    /// Position of this kind in [`LightKind::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Number of active lights per kind for the current frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LightCounts([u32; 3]);

impl LightCounts {
    /// Returns the count for one kind.
    pub fn get(&self, kind: LightKind) -> u32 {
        self.0[kind.index()]
    }

    /// Overwrites the count for one kind.
    pub fn set(&mut self, kind: LightKind, count: u32) {
        self.0[kind.index()] = count;
    }

    /// Adds one light of `kind`.
    pub fn increment(&mut self, kind: LightKind) {
        self.0[kind.index()] += 1;
    }

    /// Removes one light of `kind`, saturating at zero.
    pub fn decrement(&mut self, kind: LightKind) {
        let slot = &mut self.0[kind.index()];
        *slot = slot.saturating_sub(1);
    }

    /// Total number of lights of every kind.
    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }
}
