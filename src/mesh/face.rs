//! Oriented rectangular face records

use crate::core::types::IVec2;
use crate::lattice::{Direction, VoxelCoordinate};
use crate::voxel::material::{MaterialMode, NormalMode, RenderMode};
use crate::voxel::surface::SurfaceData;

/// Where a face's plane sits along its axis
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FaceOffset {
    /// Plane through the voxel center (plane and cross render modes)
    Centered,
    /// Plane pushed half a scale to the voxel boundary (cube faces)
    Boundary,
}

/// Identity of a rectangular face: the merge and dedup key for the
/// optimisation passes.
///
/// The rectangle lives in the 2D plane perpendicular to `direction` at
/// integer `depth` along that axis, swizzled canonically per axis (see
/// [`Direction::swizzle`]) so opposite faces of the same cell share
/// rectangle coordinates. All fields are integers, so equality and hashing
/// are exact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FaceCoordinate {
    pub layer: i8,
    pub direction: Direction,
    pub offset: FaceOffset,
    pub depth: i32,
    pub min: IVec2,
    pub max: IVec2,
}

impl FaceCoordinate {
    /// One-cell face at the swizzled in-plane position
    pub fn unit(layer: i8, direction: Direction, offset: FaceOffset, depth: i32, uv: IVec2) -> Self {
        Self {
            layer,
            direction,
            offset,
            depth,
            min: uv,
            max: uv + IVec2::ONE,
        }
    }

    /// Rectangle size in cells
    pub fn size(&self) -> IVec2 {
        self.max - self.min
    }

    /// Key of the face that would occlude this one: the opposite-facing
    /// boundary face of the neighbouring voxel, which shares this face's
    /// geometric plane. Centered faces have no mirror.
    pub fn mirror(&self) -> Option<FaceCoordinate> {
        match self.offset {
            FaceOffset::Centered => None,
            FaceOffset::Boundary => Some(FaceCoordinate {
                direction: self.direction.opposite(),
                depth: self.depth + self.direction.sign(),
                ..*self
            }),
        }
    }

    /// Whether two faces lie in the same plane group
    pub fn same_plane(&self, other: &FaceCoordinate) -> bool {
        self.layer == other.layer
            && self.direction == other.direction
            && self.offset == other.offset
            && self.depth == other.depth
    }

    /// Bounding rectangle of two coplanar faces whose rectangles are
    /// exactly edge-adjacent with equal cross-extent; None otherwise.
    pub fn merged_with(&self, other: &FaceCoordinate) -> Option<FaceCoordinate> {
        if !self.same_plane(other) || self == other {
            return None;
        }
        let horizontal = self.min.y == other.min.y
            && self.max.y == other.max.y
            && (self.max.x == other.min.x || other.max.x == self.min.x);
        let vertical = self.min.x == other.min.x
            && self.max.x == other.max.x
            && (self.max.y == other.min.y || other.max.y == self.min.y);
        if !horizontal && !vertical {
            return None;
        }
        Some(FaceCoordinate {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
            ..*self
        })
    }

    fn sort_key(&self) -> (i8, u8, u8, i32, i32, i32, i32, i32) {
        (
            self.layer,
            self.direction as u8,
            self.offset as u8,
            self.depth,
            self.min.x,
            self.min.y,
            self.max.x,
            self.max.y,
        )
    }
}

impl Ord for FaceCoordinate {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for FaceCoordinate {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Payload of a face: resolved surface plus everything the optimisation
/// and assembly stages need to know about its source voxel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoxelFace {
    pub surface: SurfaceData,
    pub source: VoxelCoordinate,
    pub render_mode: RenderMode,
    pub material_mode: MaterialMode,
    pub normal_mode: NormalMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(direction: Direction, depth: i32, min: (i32, i32), max: (i32, i32)) -> FaceCoordinate {
        FaceCoordinate {
            layer: 0,
            direction,
            offset: FaceOffset::Boundary,
            depth,
            min: IVec2::new(min.0, min.1),
            max: IVec2::new(max.0, max.1),
        }
    }

    #[test]
    fn test_mirror_of_boundary_face() {
        let f = face(Direction::PosX, 3, (0, 0), (1, 1));
        let m = f.mirror().unwrap();
        assert_eq!(m.direction, Direction::NegX);
        assert_eq!(m.depth, 4);
        assert_eq!(m.min, f.min);
        // Mirroring twice returns the original key
        assert_eq!(m.mirror().unwrap(), f);
    }

    #[test]
    fn test_centered_face_has_no_mirror() {
        let mut f = face(Direction::PosX, 3, (0, 0), (1, 1));
        f.offset = FaceOffset::Centered;
        assert!(f.mirror().is_none());
    }

    #[test]
    fn test_merge_adjacent_horizontal() {
        let a = face(Direction::PosY, 0, (0, 0), (1, 1));
        let b = face(Direction::PosY, 0, (1, 0), (2, 1));
        let m = a.merged_with(&b).unwrap();
        assert_eq!(m.min, IVec2::new(0, 0));
        assert_eq!(m.max, IVec2::new(2, 1));
        // Symmetric
        assert_eq!(b.merged_with(&a).unwrap(), m);
    }

    #[test]
    fn test_merge_adjacent_vertical() {
        let a = face(Direction::PosY, 0, (0, 0), (2, 1));
        let b = face(Direction::PosY, 0, (0, 1), (2, 2));
        let m = a.merged_with(&b).unwrap();
        assert_eq!(m.max, IVec2::new(2, 2));
    }

    #[test]
    fn test_merge_rejects_mismatched_extent() {
        let a = face(Direction::PosY, 0, (0, 0), (1, 1));
        let b = face(Direction::PosY, 0, (1, 0), (2, 2));
        assert!(a.merged_with(&b).is_none());
    }

    #[test]
    fn test_merge_rejects_different_plane() {
        let a = face(Direction::PosY, 0, (0, 0), (1, 1));
        let b = face(Direction::PosY, 1, (1, 0), (2, 1));
        let c = face(Direction::NegY, 0, (1, 0), (2, 1));
        assert!(a.merged_with(&b).is_none());
        assert!(a.merged_with(&c).is_none());
    }

    #[test]
    fn test_merge_rejects_diagonal() {
        let a = face(Direction::PosY, 0, (0, 0), (1, 1));
        let b = face(Direction::PosY, 0, (1, 1), (2, 2));
        assert!(a.merged_with(&b).is_none());
    }

    #[test]
    fn test_sort_is_plane_major() {
        let mut keys = vec![
            face(Direction::PosY, 1, (0, 0), (1, 1)),
            face(Direction::PosY, 0, (5, 0), (6, 1)),
            face(Direction::PosY, 0, (0, 0), (1, 1)),
        ];
        keys.sort();
        assert_eq!(keys[0].depth, 0);
        assert_eq!(keys[0].min.x, 0);
        assert_eq!(keys[1].min.x, 5);
        assert_eq!(keys[2].depth, 1);
    }
}
