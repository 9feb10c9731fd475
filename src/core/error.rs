//! Error types for the voxel mesh compiler

use thiserror::Error;

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    /// A coordinate or layer operation left the configured layer range.
    /// Rejected rather than clamped so corrupted addresses never propagate.
    #[error("layer {layer} outside configured range [{min}, {max}]")]
    LayerOutOfRange { layer: i8, min: i8, max: i8 },

    /// A raw render mode value did not decode to a known mode
    #[error("unsupported render mode {0}")]
    UnsupportedRenderMode(u8),

    /// A layer restriction had min > max
    #[error("empty layer range [{min}, {max}]")]
    EmptyLayerRange { min: i8, max: i8 },

    /// Configuration could not be parsed
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}
