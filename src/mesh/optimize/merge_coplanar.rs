//! Coplanar face merging

use crate::mesh::face::FaceCoordinate;
use crate::mesh::intermediate::IntermediateMeshData;
use crate::mesh::optimize::{FaceOptimizer, MergePolicy};

/// Greedily combines adjacent same-plane faces into larger rectangles.
///
/// Within each plane group (layer, direction, depth, offset) any two
/// distinct faces whose rectangles are exactly edge-adjacent with equal
/// cross-extent collapse into their bounding rectangle, inheriting the
/// earlier face's payload per the configured [`MergePolicy`]. The scan
/// repeats until a full pass finds no merge.
///
/// Worst case O(n^2) per pass over a plane group; face counts are expected
/// in the hundreds to low thousands, so callers with very large voxel sets
/// should chunk them.
pub struct MergeCoplanarFaces {
    policy: MergePolicy,
}

impl MergeCoplanarFaces {
    /// Create the pass with the given surface policy
    pub fn new(policy: MergePolicy) -> Self {
        Self { policy }
    }

    fn mergeable(&self, data: &IntermediateMeshData, a: &FaceCoordinate, b: &FaceCoordinate) -> bool {
        let face_a = &data.faces[a];
        let face_b = &data.faces[b];
        if face_a.material_mode != face_b.material_mode {
            return false;
        }
        match self.policy {
            MergePolicy::TakeFirst => true,
            MergePolicy::RequireEqualSurface => face_a.surface == face_b.surface,
        }
    }

    /// Merge one plane group to its own fixed point. Returns merges made.
    fn merge_plane(&self, data: &mut IntermediateMeshData, group: &[FaceCoordinate]) -> usize {
        let mut open: Vec<FaceCoordinate> = group.to_vec();
        let mut merges = 0;
        'scan: loop {
            for i in 0..open.len() {
                for j in (i + 1)..open.len() {
                    let (a, b) = (open[i], open[j]);
                    if !self.mergeable(data, &a, &b) {
                        continue;
                    }
                    let Some(merged) = a.merged_with(&b) else {
                        continue;
                    };
                    // The earlier face's payload survives; the other side's
                    // surface is dropped
                    let keep = data.remove_face(&a).expect("open face present");
                    data.remove_face(&b).expect("open face present");
                    data.insert_face(merged, keep);
                    open.swap_remove(j);
                    open.swap_remove(i);
                    open.push(merged);
                    merges += 1;
                    continue 'scan;
                }
            }
            break;
        }
        merges
    }
}

impl FaceOptimizer for MergeCoplanarFaces {
    fn name(&self) -> &'static str {
        "merge-coplanar"
    }

    fn run(&self, data: &mut IntermediateMeshData) {
        let mut total = 0;
        loop {
            let keys = data.sorted_keys();
            let mut merged_any = false;

            // Keys sort plane-major, so plane groups are contiguous runs
            let mut start = 0;
            while start < keys.len() {
                let mut end = start + 1;
                while end < keys.len() && keys[end].same_plane(&keys[start]) {
                    end += 1;
                }
                let merges = self.merge_plane(data, &keys[start..end]);
                if merges > 0 {
                    merged_any = true;
                    total += merges;
                }
                start = end;
            }

            if !merged_any {
                break;
            }
        }
        if total > 0 {
            log::trace!("coplanar merging collapsed {total} face pairs");
        }
    }
}
