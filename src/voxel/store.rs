//! Voxel store with collision-safe insert semantics

use std::collections::HashMap;

use rayon::prelude::*;

use crate::core::error::Error;
use crate::core::types::Result;
use crate::lattice::{Lattice, VoxelCoordinate};
use crate::math::Aabb;
use crate::voxel::voxel::Voxel;

/// Mapping from coordinate to voxel with a no-spatial-overlap guarantee.
///
/// The overlap check is the store's only strong consistency invariant: every
/// insert tests epsilon-shrunk bounds against every existing voxel, so voxels
/// may touch faces exactly but never overlap. The scan is O(n) per insert and
/// runs on the rayon pool.
///
/// Structural changes are cheap; callers run [`VoxelStore::invalidate`] once
/// per edit batch to refresh the version token and the layer span.
#[derive(Debug)]
pub struct VoxelStore {
    lattice: Lattice,
    voxels: HashMap<VoxelCoordinate, Voxel>,
    version: u64,
    layer_span: Option<(i8, i8)>,
}

impl VoxelStore {
    /// Create an empty store over the given lattice
    pub fn new(lattice: Lattice) -> Self {
        Self {
            lattice,
            voxels: HashMap::new(),
            version: 0,
            layer_span: None,
        }
    }

    /// Lattice this store addresses
    pub fn lattice(&self) -> Lattice {
        self.lattice
    }

    /// Number of voxels
    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    /// Whether the store holds no voxels
    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    /// Copy of the voxel at a coordinate
    pub fn get(&self, coord: VoxelCoordinate) -> Option<Voxel> {
        self.voxels.get(&coord).cloned()
    }

    /// Whether a voxel exists at the exact coordinate
    pub fn contains(&self, coord: VoxelCoordinate) -> bool {
        self.voxels.contains_key(&coord)
    }

    /// Insert unless the voxel's shrunk bounds intersect an existing voxel.
    ///
    /// Returns false and leaves the store unchanged on collision. Exact
    /// face adjacency does not collide.
    pub fn insert_if_free(&mut self, voxel: Voxel) -> bool {
        if self.collides(voxel.coordinate) {
            return false;
        }
        self.voxels.insert(voxel.coordinate, voxel);
        true
    }

    /// Insert unconditionally, removing every colliding voxel first.
    ///
    /// A coarse voxel may displace many finer voxels inside its volume.
    /// Returns the number of voxels removed.
    pub fn insert_overwrite(&mut self, voxel: Voxel) -> usize {
        let colliding = self.colliding_coords(self.lattice.collision_bounds(voxel.coordinate));
        for coord in &colliding {
            self.voxels.remove(coord);
        }
        self.voxels.insert(voxel.coordinate, voxel);
        colliding.len()
    }

    /// Remove the voxel at an exact coordinate
    pub fn remove(&mut self, coord: VoxelCoordinate) -> Option<Voxel> {
        self.voxels.remove(&coord)
    }

    /// Remove every voxel whose bounds intersect the given bounds.
    ///
    /// Voxel bounds are shrunk the same way as in collision tests, so voxels
    /// that merely touch the region's boundary survive. Returns the number
    /// removed.
    pub fn remove_range(&mut self, bounds: &Aabb) -> usize {
        let doomed: Vec<VoxelCoordinate> = self
            .voxels
            .keys()
            .filter(|c| self.lattice.collision_bounds(**c).intersects(bounds))
            .copied()
            .collect();
        for coord in &doomed {
            self.voxels.remove(coord);
        }
        doomed.len()
    }

    fn collides(&self, coord: VoxelCoordinate) -> bool {
        let bounds = self.lattice.collision_bounds(coord);
        let lattice = self.lattice;
        self.voxels
            .par_iter()
            .any(|(c, _)| lattice.collision_bounds(*c).intersects(&bounds))
    }

    fn colliding_coords(&self, bounds: Aabb) -> Vec<VoxelCoordinate> {
        self.voxels
            .keys()
            .filter(|c| self.lattice.collision_bounds(**c).intersects(&bounds))
            .copied()
            .collect()
    }

    /// Refresh the version token and layer span after an edit batch.
    ///
    /// O(n) over the store; intended once per batch, not per voxel.
    pub fn invalidate(&mut self) {
        self.version = self.version.wrapping_add(1);
        self.layer_span = self
            .voxels
            .keys()
            .map(|c| c.layer)
            .fold(None, |span, layer| match span {
                None => Some((layer, layer)),
                Some((min, max)) => Some((min.min(layer), max.max(layer))),
            });
    }

    /// Version token for cache busting; changes on every invalidation
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Min and max layer present as of the last invalidation
    pub fn layer_span(&self) -> Option<(i8, i8)> {
        self.layer_span
    }

    /// Iterate voxels in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = &Voxel> {
        self.voxels.values()
    }

    /// Deterministic snapshot for a rebuild: sorted by material mode, then
    /// coordinate, optionally restricted to a `[min, max]` layer range.
    pub fn snapshot(&self, layer_range: Option<(i8, i8)>) -> Result<Vec<Voxel>> {
        if let Some((min, max)) = layer_range {
            if min > max {
                return Err(Error::EmptyLayerRange { min, max });
            }
        }
        let mut voxels: Vec<Voxel> = self
            .voxels
            .values()
            .filter(|v| match layer_range {
                Some((min, max)) => v.coordinate.layer >= min && v.coordinate.layer <= max,
                None => true,
            })
            .cloned()
            .collect();
        voxels.sort_by_key(|v| (v.material.material_mode, v.coordinate));
        Ok(voxels)
    }
}
