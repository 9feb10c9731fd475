//! Multi-resolution integer lattice addressing
//!
//! Coordinates live on an integer lattice whose spacing depends on their
//! layer: `scale(layer) = ratio^-layer`, so larger layer values address
//! smaller voxels. All geometry-producing operations go through [`Lattice`],
//! which carries the ratio and the permitted layer range.

pub mod direction;
pub mod coordinate;
pub mod lattice;

pub use direction::{Axis, Direction};
pub use coordinate::VoxelCoordinate;
pub use lattice::Lattice;
