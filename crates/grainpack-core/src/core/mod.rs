//! # Core Module
//!
//! The stateless foundation of grainpack: data models, implicit shape functions,
//! orientation math, special functions and file exporters.
//!
//! ## Architecture
//!
//! - **Models** ([`models`]) - Phase statistics, grains, the voxel domain and output arrays
//! - **Shapes** ([`shapes`]) - Implicit "insideness" functions and volume-to-radius conversion
//! - **Orientation** ([`orientation`]) - Orientation-density bins and Bunge rotation matrices
//! - **File I/O** ([`io`]) - Statistics loading and CSV/VTK exporters
//! - **Utilities** ([`utils`]) - Special functions (erf, log-gamma, log-normal CDF)
//!
//! Nothing in this layer holds packing state; every function is deterministic given its
//! inputs, which keeps the engine's stateful code small and testable.

pub mod io;
pub mod models;
pub mod orientation;
pub mod shapes;
pub mod utils;
