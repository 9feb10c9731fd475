//! Voxel material: render shape, material mode and per-face surfaces

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::lattice::Direction;
use crate::voxel::surface::SurfaceData;

/// Submesh partition a voxel's geometry lands in
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MaterialMode {
    #[default]
    Opaque,
    Transparent,
}

impl MaterialMode {
    /// Submesh index this mode maps to (0 = opaque, 1 = transparent)
    pub fn submesh_index(self) -> u8 {
        match self {
            MaterialMode::Opaque => 0,
            MaterialMode::Transparent => 1,
        }
    }
}

/// Shape category a voxel is decomposed into
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RenderMode {
    /// Solid cube, one face per direction at the voxel boundary
    #[default]
    Block,
    /// Double-sided plane through the center, perpendicular to X
    XPlane,
    /// Double-sided plane through the center, perpendicular to Y
    YPlane,
    /// Double-sided plane through the center, perpendicular to Z
    ZPlane,
    /// Two crossed planes spanning the X and Y axes
    CrossXY,
    /// Two crossed planes spanning the X and Z axes
    CrossXZ,
    /// Two crossed planes spanning the Y and Z axes
    CrossYZ,
    /// Three crossed planes through the center, all six directions
    FullCross,
}

impl RenderMode {
    /// Compact wire form
    pub fn raw(self) -> u8 {
        match self {
            RenderMode::Block => 0,
            RenderMode::XPlane => 1,
            RenderMode::YPlane => 2,
            RenderMode::ZPlane => 3,
            RenderMode::CrossXY => 4,
            RenderMode::CrossXZ => 5,
            RenderMode::CrossYZ => 6,
            RenderMode::FullCross => 7,
        }
    }

    /// Face directions this mode emits, before per-surface skips
    pub fn directions(self) -> &'static [Direction] {
        use Direction::*;
        match self {
            RenderMode::Block | RenderMode::FullCross => &Direction::ALL,
            RenderMode::XPlane => &[PosX, NegX],
            RenderMode::YPlane => &[PosY, NegY],
            RenderMode::ZPlane => &[PosZ, NegZ],
            RenderMode::CrossXY => &[PosX, NegX, PosY, NegY],
            RenderMode::CrossXZ => &[PosX, NegX, PosZ, NegZ],
            RenderMode::CrossYZ => &[PosY, NegY, PosZ, NegZ],
        }
    }

    /// Whether faces sit on the voxel boundary (cubes) or through its
    /// center (planes and crosses)
    pub fn boundary_faces(self) -> bool {
        matches!(self, RenderMode::Block)
    }
}

impl TryFrom<u8> for RenderMode {
    type Error = Error;

    fn try_from(raw: u8) -> Result<Self, Error> {
        match raw {
            0 => Ok(RenderMode::Block),
            1 => Ok(RenderMode::XPlane),
            2 => Ok(RenderMode::YPlane),
            3 => Ok(RenderMode::ZPlane),
            4 => Ok(RenderMode::CrossXY),
            5 => Ok(RenderMode::CrossXZ),
            6 => Ok(RenderMode::CrossYZ),
            7 => Ok(RenderMode::FullCross),
            other => Err(Error::UnsupportedRenderMode(other)),
        }
    }
}

/// How vertex normals are generated
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NormalMode {
    /// Face normal on every vertex
    #[default]
    Hard,
    /// Normals point away from the voxel center, for a rounded look
    Spherical,
}

/// Full material description of a voxel.
///
/// `default` covers every face direction unless an override is present.
/// Equality is structural and override order-independent.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VoxelMaterial {
    pub material_mode: MaterialMode,
    pub render_mode: RenderMode,
    pub normal_mode: NormalMode,
    pub default: SurfaceData,
    pub overrides: Vec<(Direction, SurfaceData)>,
}

impl Default for VoxelMaterial {
    fn default() -> Self {
        Self {
            material_mode: MaterialMode::Opaque,
            render_mode: RenderMode::Block,
            normal_mode: NormalMode::Hard,
            default: SurfaceData::default(),
            overrides: Vec::new(),
        }
    }
}

impl VoxelMaterial {
    /// Opaque block with the given surface on all faces
    pub fn block(surface: SurfaceData) -> Self {
        Self { default: surface, ..Self::default() }
    }

    /// Resolved surface for one face direction: the override if present,
    /// else the default
    pub fn surface(&self, direction: Direction) -> &SurfaceData {
        self.overrides
            .iter()
            .find(|(d, _)| *d == direction)
            .map(|(_, s)| s)
            .unwrap_or(&self.default)
    }

    /// Add or replace a per-direction surface override
    pub fn with_override(mut self, direction: Direction, surface: SurfaceData) -> Self {
        self.overrides.retain(|(d, _)| *d != direction);
        self.overrides.push((direction, surface));
        self
    }
}

impl PartialEq for VoxelMaterial {
    fn eq(&self, other: &Self) -> bool {
        if self.material_mode != other.material_mode
            || self.render_mode != other.render_mode
            || self.normal_mode != other.normal_mode
            || self.default != other.default
            || self.overrides.len() != other.overrides.len()
        {
            return false;
        }
        // Override lists compare as sets
        self.overrides
            .iter()
            .all(|entry| other.overrides.contains(entry))
    }
}
