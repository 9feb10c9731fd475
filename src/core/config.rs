//! Compiler configuration
//!
//! All tunables live in an explicit [`MeshConfig`] handed to the store and
//! scheduler at construction time. There is no ambient global state.

use serde::{Deserialize, Serialize};

use crate::core::types::Result;
use crate::lattice::Lattice;
use crate::mesh::optimize::{MergePolicy, OptimizerKind};
use crate::voxel::material::VoxelMaterial;

/// Configuration for a mesh compiler instance
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshConfig {
    /// Lattice geometry: layer ratio and permitted layer range
    pub lattice: Lattice,
    /// Material assigned to voxels inserted without an explicit one
    pub default_material: VoxelMaterial,
    /// Ordered optimiser passes applied to the face set
    pub optimizers: Vec<OptimizerKind>,
    /// Surface selection policy for coplanar merging
    pub merge_policy: MergePolicy,
    /// Time slice budget for incremental builds, in milliseconds
    pub max_slice_ms: u64,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            lattice: Lattice::default(),
            default_material: VoxelMaterial::default(),
            optimizers: vec![OptimizerKind::CullInternal, OptimizerKind::MergeCoplanar],
            merge_policy: MergePolicy::default(),
            max_slice_ms: 8,
        }
    }
}

impl MeshConfig {
    /// Parse a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the configuration to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Voxel at a coordinate carrying the configured default material
    pub fn voxel(&self, coordinate: crate::lattice::VoxelCoordinate) -> crate::voxel::Voxel {
        crate::voxel::Voxel::new(coordinate, self.default_material.clone())
    }
}
