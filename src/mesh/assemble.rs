//! Face set to vertex/index buffer assembly

use std::collections::HashMap;

use crate::core::types::{IVec2, Vec3};
use crate::lattice::Lattice;
use crate::mesh::buffers::{MeshOutput, QUAD_INDICES, Submesh};
use crate::mesh::face::{FaceCoordinate, FaceOffset, VoxelFace};
use crate::mesh::intermediate::IntermediateMeshData;
use crate::voxel::material::{MaterialMode, NormalMode};
use crate::voxel::surface::UvMode;

/// Quantization step for point-offset lookup keys
const POINT_QUANTUM: f32 = 1.0 / 4096.0;

/// Sparse position to displacement map for mesh warping.
///
/// Corner positions are quantized before lookup, so registrations survive
/// float rounding in corner computation.
#[derive(Clone, Debug, Default)]
pub struct PointOffsets {
    map: HashMap<(i64, i64, i64), Vec3>,
}

impl PointOffsets {
    /// Empty offset map
    pub fn new() -> Self {
        Self::default()
    }

    fn key(position: Vec3) -> (i64, i64, i64) {
        (
            (position.x / POINT_QUANTUM).round() as i64,
            (position.y / POINT_QUANTUM).round() as i64,
            (position.z / POINT_QUANTUM).round() as i64,
        )
    }

    /// Register a displacement for corners at this position
    pub fn insert(&mut self, position: Vec3, offset: Vec3) {
        self.map.insert(Self::key(position), offset);
    }

    /// Displacement registered for a position, if any
    pub fn get(&self, position: Vec3) -> Option<Vec3> {
        self.map.get(&Self::key(position)).copied()
    }

    /// Number of registered offsets
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether no offsets are registered
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Pluggable lightmap UV generation.
///
/// The exact 2D bin-packing algorithm is the packer's business; when one is
/// registered it claims the third UV channel for its packed coordinates.
pub trait LightmapPacker: Send {
    /// Lightmap UVs for the four corners of a face rectangle
    fn pack(&mut self, key: &FaceCoordinate) -> [[f32; 2]; 4];
}

/// Incremental face-to-buffer assembler.
///
/// Faces are pushed one at a time (the build job yields between faces in
/// time-sliced mode) and must arrive in deterministic order for rebuilds of
/// unchanged input to produce byte-identical buffers.
pub struct MeshAssembler {
    lattice: Lattice,
    offsets: PointOffsets,
    lightmap: Option<Box<dyn LightmapPacker>>,
    submeshes: Vec<Submesh>,
}

impl MeshAssembler {
    /// Create an assembler over the given lattice and point offsets
    pub fn new(lattice: Lattice, offsets: PointOffsets) -> Self {
        Self {
            lattice,
            offsets,
            lightmap: None,
            submeshes: Vec::new(),
        }
    }

    /// Register a lightmap packer; it takes over the third UV channel
    pub fn with_lightmap_packer(mut self, packer: Box<dyn LightmapPacker>) -> Self {
        self.lightmap = Some(packer);
        self
    }

    fn submesh_index(&mut self, mode: MaterialMode) -> usize {
        match self.submeshes.iter().position(|s| s.material_mode == mode) {
            Some(index) => index,
            None => {
                self.submeshes.push(Submesh::new(mode));
                self.submeshes.len() - 1
            }
        }
    }

    /// Append one face as four vertices and two triangles
    pub fn push_face(&mut self, key: &FaceCoordinate, face: &VoxelFace) {
        let scale = self.lattice.scale(key.layer);
        let (u_axis, v_axis, n_axis) = key.direction.plane_basis();
        let sign = key.direction.sign() as f32;

        let plane = match key.offset {
            FaceOffset::Centered => key.depth as f32 * scale,
            FaceOffset::Boundary => (key.depth as f32 + 0.5 * sign) * scale,
        };

        // Corner order is chosen per direction so the fixed quad index
        // pattern always winds outward
        let ccw = u_axis.cross(v_axis).dot(key.direction.normal()) > 0.0;
        let (mn, mx) = (key.min, key.max);
        let corners: [IVec2; 4] = if ccw {
            [mn, IVec2::new(mn.x, mx.y), mx, IVec2::new(mx.x, mn.y)]
        } else {
            [mn, IVec2::new(mx.x, mn.y), mx, IVec2::new(mn.x, mx.y)]
        };

        let center = self.lattice.to_world(face.source);
        let size = key.size();
        let lightmap_uv = self.lightmap.as_mut().map(|packer| packer.pack(key));

        let mut positions = [[0.0f32; 3]; 4];
        let mut normals = [[0.0f32; 3]; 4];
        let mut uv0 = [[0.0f32; 2]; 4];
        for (i, corner) in corners.iter().enumerate() {
            let world = u_axis * ((corner.x as f32 - 0.5) * scale)
                + v_axis * ((corner.y as f32 - 0.5) * scale)
                + n_axis * plane;
            let world = world + self.offsets.get(world).unwrap_or(Vec3::ZERO);
            positions[i] = world.to_array();

            let normal = match face.normal_mode {
                NormalMode::Hard => key.direction.normal(),
                NormalMode::Spherical => (world - center)
                    .try_normalize()
                    .unwrap_or(key.direction.normal()),
            };
            normals[i] = normal.to_array();

            let local_u = (corner.x - mn.x) as f32;
            let local_v = (corner.y - mn.y) as f32;
            let world_u = (corner.x as f32 - 0.5) * scale;
            let world_v = (corner.y as f32 - 0.5) * scale;
            uv0[i] = match face.surface.uv_mode {
                UvMode::Local => [local_u / size.x as f32, local_v / size.y as f32],
                UvMode::LocalScaled => [local_u, local_v],
                UvMode::Global => [world_u, world_v],
                UvMode::GlobalScaled => [
                    world_u / (size.x as f32 * scale),
                    world_v / (size.y as f32 * scale),
                ],
            };
        }

        let index = self.submesh_index(face.material_mode);
        let submesh = &mut self.submeshes[index];
        let base = submesh.positions.len() as u32;

        submesh.positions.extend_from_slice(&positions);
        submesh.normals.extend_from_slice(&normals);
        submesh.uv0.extend_from_slice(&uv0);
        for i in 0..4 {
            submesh.colors.push(face.surface.albedo);
            submesh.uv1.push([
                face.surface.texture_index as f32,
                face.surface.texture_fade,
            ]);
            submesh.uv2.push(match &lightmap_uv {
                Some(packed) => packed[i],
                None => [face.surface.metallic, face.surface.smoothness],
            });
        }
        for offset in QUAD_INDICES {
            submesh.indices.push(base + offset);
        }
        submesh.triangle_sources.push((face.source, key.direction));
        submesh.triangle_sources.push((face.source, key.direction));
    }

    /// Finish assembly: submeshes come out sorted by material mode
    pub fn finish(mut self, layer_span: Option<(i8, i8)>) -> MeshOutput {
        self.submeshes.sort_by_key(|s| s.material_mode);
        MeshOutput {
            submeshes: self.submeshes,
            layer_span,
        }
    }
}

/// Assemble a whole face set in one call.
///
/// Faces are processed sorted by material mode then face key, the same
/// order the incremental path uses.
pub fn assemble(
    data: &IntermediateMeshData,
    lattice: Lattice,
    offsets: PointOffsets,
) -> MeshOutput {
    let mut assembler = MeshAssembler::new(lattice, offsets);
    for key in assembly_order(data) {
        assembler.push_face(&key, &data.faces[&key]);
    }
    assembler.finish(data.layer_span())
}

/// Deterministic face processing order: material mode, then face key
pub fn assembly_order(data: &IntermediateMeshData) -> Vec<FaceCoordinate> {
    let mut keys = data.sorted_keys();
    keys.sort_by_key(|k| (data.faces[k].material_mode, *k));
    keys
}
