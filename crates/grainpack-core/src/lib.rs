//! # grainpack Core Library
//!
//! A packing engine that synthesizes voxelized polycrystalline microstructures whose grain
//! size, shape, orientation and neighbor-count distributions match per-phase statistics.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture so that each concern can be tested
//! on its own and swapped without touching the others.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`PhaseStatistics`, `Grain`, `Domain`,
//!   `VoxelField`), the implicit shape functions, orientation math, special functions and the
//!   file exporters.
//!
//! - **[`engine`]: The Logic Core.** The stateful packing machinery: the coarse `PackingGrid`,
//!   the filling-error evaluator, histogram scorers, the transactional grain mover and the
//!   individual pipeline tasks (generation, placement, refinement, rasterization, gap filling,
//!   cleanup and compaction).
//!
//! - **[`workflows`]: The Public API.** Ties `engine` and `core` together into a complete
//!   packing run with progress reporting, cancellation and an explicit status outcome.

pub mod core;
pub mod engine;
pub mod workflows;
