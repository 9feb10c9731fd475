//! Voxmesh - a sparse multi-resolution voxel to triangle mesh compiler
//!
//! Converts a sparse, layered voxel grid (per-face material data, arbitrary
//! resolution layers) into renderable triangle geometry:
//!
//! - [`lattice`] - multi-resolution integer lattice addressing
//! - [`voxel`] - voxel store and layered spatial index
//! - [`mesh`] - face decomposition, optimisation passes, buffer assembly
//! - [`build`] - synchronous, background and time-sliced rebuild scheduling

pub mod core;
pub mod math;
pub mod lattice;
pub mod voxel;
pub mod mesh;
pub mod build;
