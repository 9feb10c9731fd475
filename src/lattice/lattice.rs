//! Lattice geometry: layer scales and coordinate conversions

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::{Result, Vec3};
use crate::lattice::coordinate::VoxelCoordinate;
use crate::math::Aabb;

/// Fraction of a voxel's scale used to shrink bounds in collision tests,
/// so exactly touching faces do not count as overlap.
const COLLISION_SHRINK: f32 = 1e-3;

/// Tolerance factor for neighbour distance tests
const NEIGHBOUR_SLACK: f32 = 1e-4;

/// Lattice geometry configuration.
///
/// `ratio` is the branching factor between adjacent layers: a voxel at layer
/// `l` spans `ratio` voxels per axis at layer `l + 1`. Layer values outside
/// `[min_layer, max_layer]` are rejected with [`Error::LayerOutOfRange`]
/// rather than clamped, so corrupted addresses never propagate silently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lattice {
    /// Voxels per axis a parent spans at the next finer layer (>= 2)
    pub ratio: u32,
    /// Coarsest permitted layer
    pub min_layer: i8,
    /// Finest permitted layer
    pub max_layer: i8,
}

impl Default for Lattice {
    fn default() -> Self {
        Self {
            ratio: 2,
            min_layer: -5,
            max_layer: 5,
        }
    }
}

impl Lattice {
    /// Create a lattice with the given ratio and symmetric layer range
    pub fn new(ratio: u32, min_layer: i8, max_layer: i8) -> Self {
        debug_assert!(ratio >= 2, "layer ratio must be at least 2");
        debug_assert!(min_layer <= max_layer);
        Self { ratio, min_layer, max_layer }
    }

    /// Validate that a layer lies in the configured range
    pub fn check_layer(&self, layer: i8) -> Result<()> {
        if layer < self.min_layer || layer > self.max_layer {
            return Err(Error::LayerOutOfRange {
                layer,
                min: self.min_layer,
                max: self.max_layer,
            });
        }
        Ok(())
    }

    /// Voxel edge length at a layer: `ratio^-layer`.
    ///
    /// Larger layer values mean smaller voxels.
    pub fn scale(&self, layer: i8) -> f32 {
        (self.ratio as f32).powi(-(layer as i32))
    }

    /// Continuous-space center of a coordinate. Pure and deterministic.
    pub fn to_world(&self, c: VoxelCoordinate) -> Vec3 {
        c.position().as_vec3() * self.scale(c.layer)
    }

    /// Nearest lattice point at `layer` for a continuous position.
    ///
    /// Rounds each component to the nearest integer, which makes the mapping
    /// stable and idempotent: `from_world(to_world(c), c.layer) == c`. Lossy
    /// in general - positions between lattice points collapse.
    pub fn from_world(&self, point: Vec3, layer: i8) -> Result<VoxelCoordinate> {
        self.check_layer(layer)?;
        let scaled = point / self.scale(layer);
        Ok(VoxelCoordinate::new(
            layer,
            scaled.x.round() as i32,
            scaled.y.round() as i32,
            scaled.z.round() as i32,
        ))
    }

    /// Re-quantize a coordinate onto another layer through continuous space.
    /// Lossy whenever the layers do not nest exactly.
    pub fn change_layer(&self, c: VoxelCoordinate, new_layer: i8) -> Result<VoxelCoordinate> {
        self.check_layer(c.layer)?;
        if new_layer == c.layer {
            return Ok(c);
        }
        self.from_world(self.to_world(c), new_layer)
    }

    /// Component-wise sum, both operands promoted to the coarser layer first
    pub fn add(&self, a: VoxelCoordinate, b: VoxelCoordinate) -> Result<VoxelCoordinate> {
        self.combine(a, b, |x, y| x + y)
    }

    /// Component-wise difference, both operands promoted to the coarser layer
    pub fn sub(&self, a: VoxelCoordinate, b: VoxelCoordinate) -> Result<VoxelCoordinate> {
        self.combine(a, b, |x, y| x - y)
    }

    fn combine(
        &self,
        a: VoxelCoordinate,
        b: VoxelCoordinate,
        op: fn(i32, i32) -> i32,
    ) -> Result<VoxelCoordinate> {
        // Coarser layer = numerically smaller layer value
        let layer = a.layer.min(b.layer);
        let a = self.change_layer(a, layer)?;
        let b = self.change_layer(b, layer)?;
        Ok(VoxelCoordinate::new(
            layer,
            op(a.x, b.x),
            op(a.y, b.y),
            op(a.z, b.z),
        ))
    }

    /// Enumerate the `ratio^3` children one layer finer, placed at the
    /// centers of the parent's sub-cells.
    ///
    /// For even ratios sub-cell centers fall between lattice points and
    /// re-quantize deterministically via [`Lattice::from_world`]; child
    /// bounds are then guaranteed to intersect the parent's bounds but do
    /// not tile them exactly.
    pub fn subdivide(&self, c: VoxelCoordinate) -> Result<Vec<VoxelCoordinate>> {
        self.check_layer(c.layer)?;
        let child_layer = c.layer + 1;
        self.check_layer(child_layer)?;

        let scale = self.scale(c.layer);
        let child_scale = self.scale(child_layer);
        let corner = self.to_world(c) - Vec3::splat(scale * 0.5);

        let n = self.ratio;
        let mut children = Vec::with_capacity((n * n * n) as usize);
        for i in 0..n {
            for j in 0..n {
                for k in 0..n {
                    let center = corner
                        + Vec3::new(
                            (i as f32 + 0.5) * child_scale,
                            (j as f32 + 0.5) * child_scale,
                            (k as f32 + 0.5) * child_scale,
                        );
                    children.push(self.from_world(center, child_layer)?);
                }
            }
        }
        Ok(children)
    }

    /// Bounding box of a voxel: center plus/minus half its scale
    pub fn bounds(&self, c: VoxelCoordinate) -> Aabb {
        let half = self.scale(c.layer) * 0.5;
        Aabb::from_center_half_extent(self.to_world(c), Vec3::splat(half))
    }

    /// Bounds shrunk for collision testing, tolerating touching faces
    pub fn collision_bounds(&self, c: VoxelCoordinate) -> Aabb {
        self.bounds(c).shrunk(self.scale(c.layer) * COLLISION_SHRINK)
    }

    /// Whether two coordinates are adjacent: world-space Manhattan distance
    /// at most one voxel-scale at the coarser of the two layers.
    pub fn is_neighbour(&self, a: VoxelCoordinate, b: VoxelCoordinate) -> bool {
        let coarse_scale = self.scale(a.layer.min(b.layer));
        let d = self.to_world(a) - self.to_world(b);
        let manhattan = d.x.abs() + d.y.abs() + d.z.abs();
        manhattan <= coarse_scale * (1.0 + NEIGHBOUR_SLACK)
    }
}
