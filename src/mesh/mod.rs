//! Face decomposition, optimisation and buffer assembly

pub mod face;
pub mod intermediate;
pub mod decompose;
pub mod optimize;
pub mod buffers;
pub mod assemble;

pub use face::{FaceCoordinate, FaceOffset, VoxelFace};
pub use intermediate::IntermediateMeshData;
pub use decompose::decompose_voxel;
pub use optimize::{FaceOptimizer, MergePolicy, OptimizerKind, build_pipeline};
pub use buffers::{MeshOutput, QUAD_INDICES, Submesh};
pub use assemble::{LightmapPacker, MeshAssembler, PointOffsets, assemble};
