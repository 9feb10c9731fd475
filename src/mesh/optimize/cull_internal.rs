//! Internal face culling between adjacent solid voxels

use std::collections::HashSet;

use crate::mesh::face::FaceCoordinate;
use crate::mesh::intermediate::IntermediateMeshData;
use crate::mesh::optimize::FaceOptimizer;
use crate::voxel::material::RenderMode;

/// Removes pairs of mutually occluding boundary faces.
///
/// A `Block` face and the opposite-facing `Block` face of the adjacent voxel
/// occupy the same geometric plane; when their render and material modes
/// match, neither can ever be seen and both are dropped. Removal is
/// symmetric and tracked in a removed set, so a face is removed at most once
/// regardless of iteration order.
pub struct CullInternalFaces;

impl FaceOptimizer for CullInternalFaces {
    fn name(&self) -> &'static str {
        "cull-internal"
    }

    fn run(&self, data: &mut IntermediateMeshData) {
        let keys = data.sorted_keys();
        let mut removed: HashSet<FaceCoordinate> = HashSet::new();

        for key in keys {
            if removed.contains(&key) {
                continue;
            }
            let Some(face) = data.faces.get(&key) else {
                continue;
            };
            if face.render_mode != RenderMode::Block {
                continue;
            }
            let Some(mirror) = key.mirror() else {
                continue;
            };
            if removed.contains(&mirror) {
                continue;
            }
            let Some(other) = data.faces.get(&mirror) else {
                continue;
            };
            if other.render_mode == face.render_mode && other.material_mode == face.material_mode {
                removed.insert(key);
                removed.insert(mirror);
            }
        }

        let count = removed.len();
        for key in &removed {
            data.remove_face(key);
        }
        if count > 0 {
            log::trace!("internal face culling removed {count} faces");
        }
    }
}
