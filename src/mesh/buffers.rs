//! Output geometry buffers

use crate::lattice::{Direction, VoxelCoordinate};
use crate::voxel::material::MaterialMode;

/// Fixed index pattern for one quad's two triangles, relative to its four
/// corner vertices
pub const QUAD_INDICES: [u32; 6] = [3, 1, 0, 3, 2, 1];

/// Geometry buffers for one submesh (one material mode)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Submesh {
    pub material_mode: MaterialMode,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub colors: Vec<[f32; 4]>,
    /// Texture coordinates per the surface's UV mode
    pub uv0: Vec<[f32; 2]>,
    /// (texture index, texture fade)
    pub uv1: Vec<[f32; 2]>,
    /// (metallic, smoothness), or packed lightmap coordinates when a
    /// lightmap packer is registered
    pub uv2: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    /// Source voxel and face direction per triangle
    pub triangle_sources: Vec<(VoxelCoordinate, Direction)>,
}

impl Submesh {
    /// Empty submesh for a material mode
    pub fn new(material_mode: MaterialMode) -> Self {
        Self { material_mode, ..Self::default() }
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Source voxel and direction of one triangle
    pub fn triangle_source(&self, triangle: usize) -> Option<(VoxelCoordinate, Direction)> {
        self.triangle_sources.get(triangle).copied()
    }

    /// Position buffer as raw bytes, for upload
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Normal buffer as raw bytes
    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }

    /// Color buffer as raw bytes
    pub fn color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors)
    }

    /// Index buffer as raw bytes
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// Final output of a build job
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshOutput {
    /// Submeshes sorted by material mode
    pub submeshes: Vec<Submesh>,
    /// Min and max layer present in the processed voxel set
    pub layer_span: Option<(i8, i8)>,
}

impl MeshOutput {
    /// Total vertices across submeshes
    pub fn vertex_count(&self) -> usize {
        self.submeshes.iter().map(Submesh::vertex_count).sum()
    }

    /// Whether no geometry was produced
    pub fn is_empty(&self) -> bool {
        self.vertex_count() == 0
    }

    /// Submesh for a material mode, if any geometry landed there
    pub fn submesh(&self, mode: MaterialMode) -> Option<&Submesh> {
        self.submeshes.iter().find(|s| s.material_mode == mode)
    }

    /// Reverse lookup from (submesh, triangle) to source voxel and direction
    pub fn triangle_source(
        &self,
        submesh: usize,
        triangle: usize,
    ) -> Option<(VoxelCoordinate, Direction)> {
        self.submeshes.get(submesh)?.triangle_source(triangle)
    }
}
