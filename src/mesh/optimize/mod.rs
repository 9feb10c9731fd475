//! Face optimisation passes
//!
//! Passes run in the configured order over the open face set, mutating it in
//! place. Each pass is idempotent: running it twice with no intervening
//! mutation produces no further change.

pub mod cull_internal;
pub mod merge_coplanar;

use serde::{Deserialize, Serialize};

use crate::mesh::intermediate::IntermediateMeshData;

pub use cull_internal::CullInternalFaces;
pub use merge_coplanar::MergeCoplanarFaces;

/// One pass over the face set
pub trait FaceOptimizer: Send {
    /// Name for logging and diagnostics
    fn name(&self) -> &'static str;

    /// Mutate the face set in place
    fn run(&self, data: &mut IntermediateMeshData);
}

/// Optimiser selection by capability, for configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizerKind {
    /// Remove mutually occluding faces between adjacent solid voxels
    CullInternal,
    /// Merge adjacent coplanar faces into larger rectangles
    MergeCoplanar,
}

/// Which surface a merged face inherits when the two sides differ
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergePolicy {
    /// Inherit the first side's surface. Merging two faces with different
    /// surfaces loses the other side's material, matching the historical
    /// behavior this pass reproduces.
    #[default]
    TakeFirst,
    /// Only merge faces whose surface data is identical
    RequireEqualSurface,
}

impl OptimizerKind {
    /// Instantiate the pass this kind names
    pub fn build(self, policy: MergePolicy) -> Box<dyn FaceOptimizer> {
        match self {
            OptimizerKind::CullInternal => Box::new(CullInternalFaces),
            OptimizerKind::MergeCoplanar => Box::new(MergeCoplanarFaces::new(policy)),
        }
    }
}

/// Build the ordered pass pipeline from configuration
pub fn build_pipeline(kinds: &[OptimizerKind], policy: MergePolicy) -> Vec<Box<dyn FaceOptimizer>> {
    kinds.iter().map(|kind| kind.build(policy)).collect()
}
