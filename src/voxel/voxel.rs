//! Voxel record

use serde::{Deserialize, Serialize};

use crate::lattice::VoxelCoordinate;
use crate::voxel::material::VoxelMaterial;

/// One voxel: a lattice address plus its material.
///
/// Voxels are copied by value out of the store; mutating one means reading
/// a copy, changing it, and putting it back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Voxel {
    pub coordinate: VoxelCoordinate,
    pub material: VoxelMaterial,
}

impl Voxel {
    /// Create a voxel at the given coordinate
    pub fn new(coordinate: VoxelCoordinate, material: VoxelMaterial) -> Self {
        Self { coordinate, material }
    }
}
