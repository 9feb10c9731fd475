//! Voxel data structures and storage

pub mod surface;
pub mod material;
pub mod voxel;
pub mod store;
pub mod layer_tree;

pub use surface::{SurfaceData, UvMode};
pub use material::{MaterialMode, NormalMode, RenderMode, VoxelMaterial};
pub use voxel::Voxel;
pub use store::VoxelStore;
pub use layer_tree::{AverageMaterials, LayerTree, LodReduce, TreeNode};
