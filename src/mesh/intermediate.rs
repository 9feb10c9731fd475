//! Transient per-job mesh build state

use std::collections::HashMap;

use crate::lattice::VoxelCoordinate;
use crate::mesh::face::{FaceCoordinate, VoxelFace};
use crate::voxel::voxel::Voxel;

/// Everything one build job owns while it runs: the voxel snapshot, the
/// open face set, the per-voxel face-key lists and the layer span seen so
/// far. Dropped wholesale when the job completes or is cancelled, so a
/// cancelled job can never leak partial state into caller-visible output.
#[derive(Debug, Default)]
pub struct IntermediateMeshData {
    /// Voxel snapshot in deterministic build order
    pub voxels: Vec<Voxel>,
    /// Open face set, keyed for dedup and merging
    pub faces: HashMap<FaceCoordinate, VoxelFace>,
    /// Face keys produced per source voxel, for re-lookup and removal
    pub voxel_faces: HashMap<VoxelCoordinate, Vec<FaceCoordinate>>,
    layer_span: Option<(i8, i8)>,
}

impl IntermediateMeshData {
    /// Create build state over a voxel snapshot
    pub fn new(voxels: Vec<Voxel>) -> Self {
        Self {
            voxels,
            faces: HashMap::new(),
            voxel_faces: HashMap::new(),
            layer_span: None,
        }
    }

    /// Record a face and index it under its source voxel
    pub fn insert_face(&mut self, key: FaceCoordinate, face: VoxelFace) {
        self.voxel_faces.entry(face.source).or_default().push(key);
        self.faces.insert(key, face);
    }

    /// Remove a face and drop it from its source voxel's key list
    pub fn remove_face(&mut self, key: &FaceCoordinate) -> Option<VoxelFace> {
        let face = self.faces.remove(key)?;
        if let Some(keys) = self.voxel_faces.get_mut(&face.source) {
            keys.retain(|k| k != key);
        }
        Some(face)
    }

    /// Number of open faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Face keys in deterministic (plane-major) order
    pub fn sorted_keys(&self) -> Vec<FaceCoordinate> {
        let mut keys: Vec<FaceCoordinate> = self.faces.keys().copied().collect();
        keys.sort();
        keys
    }

    /// Fold a processed voxel's layer into the running span
    pub fn track_layer(&mut self, layer: i8) {
        self.layer_span = Some(match self.layer_span {
            None => (layer, layer),
            Some((min, max)) => (min.min(layer), max.max(layer)),
        });
    }

    /// Min and max layer across all voxels processed so far
    pub fn layer_span(&self) -> Option<(i8, i8)> {
        self.layer_span
    }
}
