//! Per-face surface data

use serde::{Deserialize, Serialize};

/// How texture coordinates are generated for a face
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UvMode {
    /// Unit quad per face regardless of size
    #[default]
    Local,
    /// Unit quad scaled by the face size in voxels
    LocalScaled,
    /// Projected world-plane coordinates
    Global,
    /// World-plane coordinates divided by the face size
    GlobalScaled,
}

/// Appearance of one face direction of a voxel
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurfaceData {
    /// Base color, RGBA in [0, 1]
    pub albedo: [f32; 4],
    /// Metallic factor in [0, 1]
    pub metallic: f32,
    /// Smoothness factor in [0, 1]
    pub smoothness: f32,
    /// Index into the caller's texture set
    pub texture_index: i32,
    /// Texture coordinate generation mode
    pub uv_mode: UvMode,
    /// Texture blend factor in [0, 1]
    pub texture_fade: f32,
    /// Suppress face generation for this direction entirely
    pub skip: bool,
}

impl Default for SurfaceData {
    fn default() -> Self {
        Self {
            albedo: [1.0, 1.0, 1.0, 1.0],
            metallic: 0.0,
            smoothness: 0.5,
            texture_index: 0,
            uv_mode: UvMode::Local,
            texture_fade: 0.0,
            skip: false,
        }
    }
}

impl SurfaceData {
    /// Surface with the given color, other fields defaulted
    pub fn with_albedo(albedo: [f32; 4]) -> Self {
        Self { albedo, ..Self::default() }
    }

    /// Surface that suppresses its face entirely
    pub fn skipped() -> Self {
        Self { skip: true, ..Self::default() }
    }
}
