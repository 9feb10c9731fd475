//! Axis-aligned face directions

use serde::{Deserialize, Serialize};

use crate::core::types::{IVec2, IVec3, Vec3};

/// One of the three lattice axes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// One of the six axis-aligned face directions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl Direction {
    /// All six directions, in canonical order
    pub const ALL: [Direction; 6] = [
        Direction::PosX,
        Direction::NegX,
        Direction::PosY,
        Direction::NegY,
        Direction::PosZ,
        Direction::NegZ,
    ];

    /// Integer offset to the neighbouring coordinate in this direction
    pub fn offset(self) -> IVec3 {
        match self {
            Direction::PosX => IVec3::new(1, 0, 0),
            Direction::NegX => IVec3::new(-1, 0, 0),
            Direction::PosY => IVec3::new(0, 1, 0),
            Direction::NegY => IVec3::new(0, -1, 0),
            Direction::PosZ => IVec3::new(0, 0, 1),
            Direction::NegZ => IVec3::new(0, 0, -1),
        }
    }

    /// Unit normal of a face looking in this direction
    pub fn normal(self) -> Vec3 {
        self.offset().as_vec3()
    }

    /// The opposite direction
    pub fn opposite(self) -> Direction {
        match self {
            Direction::PosX => Direction::NegX,
            Direction::NegX => Direction::PosX,
            Direction::PosY => Direction::NegY,
            Direction::NegY => Direction::PosY,
            Direction::PosZ => Direction::NegZ,
            Direction::NegZ => Direction::PosZ,
        }
    }

    /// Axis this direction runs along
    pub fn axis(self) -> Axis {
        match self {
            Direction::PosX | Direction::NegX => Axis::X,
            Direction::PosY | Direction::NegY => Axis::Y,
            Direction::PosZ | Direction::NegZ => Axis::Z,
        }
    }

    /// +1 for positive directions, -1 for negative
    pub fn sign(self) -> i32 {
        match self {
            Direction::PosX | Direction::PosY | Direction::PosZ => 1,
            Direction::NegX | Direction::NegY | Direction::NegZ => -1,
        }
    }

    /// Whether this is a positive-axis direction
    pub fn is_positive(self) -> bool {
        self.sign() > 0
    }

    /// Swizzle an integer position into (depth, in-plane uv).
    ///
    /// The uv swizzle is canonical per axis (X plane -> (y, z), Y -> (x, z),
    /// Z -> (x, y)), independent of the direction's sign, so opposite faces
    /// of the same cell share rectangle coordinates.
    pub fn swizzle(self, p: IVec3) -> (i32, IVec2) {
        match self.axis() {
            Axis::X => (p.x, IVec2::new(p.y, p.z)),
            Axis::Y => (p.y, IVec2::new(p.x, p.z)),
            Axis::Z => (p.z, IVec2::new(p.x, p.y)),
        }
    }

    /// Inverse of [`Direction::swizzle`]: world basis vectors for the
    /// in-plane u and v axes and the depth axis.
    pub fn plane_basis(self) -> (Vec3, Vec3, Vec3) {
        match self.axis() {
            Axis::X => (Vec3::Y, Vec3::Z, Vec3::X),
            Axis::Y => (Vec3::X, Vec3::Z, Vec3::Y),
            Axis::Z => (Vec3::X, Vec3::Y, Vec3::Z),
        }
    }
}
