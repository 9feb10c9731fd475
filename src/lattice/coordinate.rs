//! Voxel coordinate type

use serde::{Deserialize, Serialize};

use crate::core::types::IVec3;
use crate::lattice::direction::{Axis, Direction};

/// Address of one voxel on the multi-resolution lattice.
///
/// `(x, y, z)` index lattice points at the resolution selected by `layer`;
/// the voxel center sits at `(x, y, z) * scale(layer)`. Coordinates at
/// different layers are not directly comparable - combine them through
/// [`Lattice`](crate::lattice::Lattice) operations, which promote to the
/// coarser layer first.
///
/// The derived `Ord` (layer, then x, y, z) gives rebuilds a stable,
/// content-determined processing order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoxelCoordinate {
    pub layer: i8,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl VoxelCoordinate {
    /// Create a coordinate at the given layer
    pub fn new(layer: i8, x: i32, y: i32, z: i32) -> Self {
        Self { layer, x, y, z }
    }

    /// Lattice position as an integer vector
    pub fn position(&self) -> IVec3 {
        IVec3::new(self.x, self.y, self.z)
    }

    /// Same-layer neighbour one step in the given direction
    pub fn stepped(&self, direction: Direction) -> Self {
        let p = self.position() + direction.offset();
        Self::new(self.layer, p.x, p.y, p.z)
    }

    /// Component along an axis
    pub fn component(&self, axis: Axis) -> i32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }
}

impl std::fmt::Display for VoxelCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "L{}:({}, {}, {})", self.layer, self.x, self.y, self.z)
    }
}
