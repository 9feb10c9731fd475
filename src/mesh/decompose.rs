//! Voxel to face decomposition

use crate::core::types::Result;
use crate::lattice::Lattice;
use crate::mesh::face::{FaceCoordinate, FaceOffset, VoxelFace};
use crate::mesh::intermediate::IntermediateMeshData;
use crate::voxel::voxel::Voxel;

/// Decompose one voxel into its oriented face records.
///
/// The render mode selects the direction set (all six boundary faces for
/// `Block`, centered planes for the plane and cross modes); directions whose
/// resolved surface is marked `skip` emit nothing. Faces are recorded in the
/// job's face map and under the source voxel's key list, and the voxel's
/// layer is folded into the running span.
///
/// A voxel whose layer lies outside the lattice range is rejected with
/// [`Error::LayerOutOfRange`](crate::core::error::Error::LayerOutOfRange);
/// the caller decides whether to abort or skip.
pub fn decompose_voxel(
    lattice: &Lattice,
    voxel: &Voxel,
    data: &mut IntermediateMeshData,
) -> Result<()> {
    let coord = voxel.coordinate;
    lattice.check_layer(coord.layer)?;

    let material = &voxel.material;
    let offset = if material.render_mode.boundary_faces() {
        FaceOffset::Boundary
    } else {
        FaceOffset::Centered
    };

    for &direction in material.render_mode.directions() {
        let surface = material.surface(direction);
        if surface.skip {
            continue;
        }
        let (depth, uv) = direction.swizzle(coord.position());
        let key = FaceCoordinate::unit(coord.layer, direction, offset, depth, uv);
        data.insert_face(
            key,
            VoxelFace {
                surface: *surface,
                source: coord,
                render_mode: material.render_mode,
                material_mode: material.material_mode,
                normal_mode: material.normal_mode,
            },
        );
    }

    data.track_layer(coord.layer);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::{Direction, VoxelCoordinate};
    use crate::voxel::material::{RenderMode, VoxelMaterial};
    use crate::voxel::surface::SurfaceData;

    fn decompose_one(material: VoxelMaterial) -> IntermediateMeshData {
        let lattice = Lattice::default();
        let voxel = Voxel::new(VoxelCoordinate::new(0, 1, 2, 3), material);
        let mut data = IntermediateMeshData::new(Vec::new());
        decompose_voxel(&lattice, &voxel, &mut data).unwrap();
        data
    }

    #[test]
    fn test_block_emits_six_boundary_faces() {
        let data = decompose_one(VoxelMaterial::default());
        assert_eq!(data.face_count(), 6);
        for key in data.faces.keys() {
            assert_eq!(key.offset, FaceOffset::Boundary);
            assert_eq!(key.size(), crate::core::types::IVec2::ONE);
        }
    }

    #[test]
    fn test_xplane_emits_two_centered_faces() {
        let mut material = VoxelMaterial::default();
        material.render_mode = RenderMode::XPlane;
        let data = decompose_one(material);

        assert_eq!(data.face_count(), 2);
        for key in data.faces.keys() {
            assert_eq!(key.offset, FaceOffset::Centered);
            assert_eq!(key.direction.axis(), crate::lattice::Axis::X);
            // Both planes share the voxel's depth along X
            assert_eq!(key.depth, 1);
        }
    }

    #[test]
    fn test_cross_emits_four_faces() {
        let mut material = VoxelMaterial::default();
        material.render_mode = RenderMode::CrossXZ;
        let data = decompose_one(material);
        assert_eq!(data.face_count(), 4);
    }

    #[test]
    fn test_full_cross_emits_six_centered_faces() {
        let mut material = VoxelMaterial::default();
        material.render_mode = RenderMode::FullCross;
        let data = decompose_one(material);
        assert_eq!(data.face_count(), 6);
        assert!(data.faces.keys().all(|k| k.offset == FaceOffset::Centered));
    }

    #[test]
    fn test_skip_suppresses_direction() {
        let material = VoxelMaterial::default()
            .with_override(Direction::PosY, SurfaceData::skipped());
        let data = decompose_one(material);
        assert_eq!(data.face_count(), 5);
        assert!(
            data.faces
                .keys()
                .all(|k| k.direction != Direction::PosY)
        );
    }

    #[test]
    fn test_all_skipped_emits_nothing_but_tracks_layer() {
        let mut material = VoxelMaterial::default();
        material.default = SurfaceData::skipped();
        let data = decompose_one(material);
        assert_eq!(data.face_count(), 0);
        assert_eq!(data.layer_span(), Some((0, 0)));
    }

    #[test]
    fn test_out_of_range_layer_rejected() {
        let lattice = Lattice::default();
        let voxel = Voxel::new(VoxelCoordinate::new(7, 0, 0, 0), VoxelMaterial::default());
        let mut data = IntermediateMeshData::new(Vec::new());
        assert!(decompose_voxel(&lattice, &voxel, &mut data).is_err());
        assert_eq!(data.face_count(), 0);
    }

    #[test]
    fn test_face_depth_follows_axis_component() {
        let data = decompose_one(VoxelMaterial::default());
        for key in data.faces.keys() {
            let expected = match key.direction.axis() {
                crate::lattice::Axis::X => 1,
                crate::lattice::Axis::Y => 2,
                crate::lattice::Axis::Z => 3,
            };
            assert_eq!(key.depth, expected);
        }
    }
}
