//! # Engine Module
//!
//! The stateful packing machinery that turns sampled grains into a space-filling voxel
//! microstructure.
//!
//! ## Overview
//!
//! Grains are first packed on a coarse [`packing_grid`] where every cell counts how many
//! grain footprints cover it. The [`filling`] error summarizes overlap and empty space of
//! that grid as a single integer running total, and a greedy local search moves grains
//! while it does not grow. The packed grains are then rasterized onto the fine output
//! grid, gaps are filled from neighboring grains and grain ids are compacted.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Domain, seed, refinement effort and output settings
//! - **State** ([`state`], [`transaction`]) - Grains, packing grid and filling error, with
//!   trial moves that are undone by exact inverse grid updates
//! - **Scoring** ([`histogram`], [`scoring`], [`neighbors`]) - Target distributions and
//!   similarity coefficients for grain sizes and neighbor counts
//! - **Tasks** ([`tasks`]) - One module per pipeline stage
//! - **Progress and cancellation** ([`progress`], [`cancel`])
//! - **Error Handling** ([`error`]) - Engine errors with stable integer status codes
//!
//! ## Key Capabilities
//!
//! - **Reproducible runs** from a single seeded random number generator
//! - **Periodic or bounded domains** throughout placement, rasterization and cleanup
//! - **Parallel rasterization** of each grain's bounding box over z-planes
//! - **Cooperative cancellation** between iterations of every long-running stage

pub mod cancel;
pub mod config;
pub(crate) mod context;
pub mod error;
pub(crate) mod filling;
pub(crate) mod histogram;
pub(crate) mod neighbors;
pub(crate) mod packing_grid;
pub mod progress;
pub(crate) mod scoring;
pub(crate) mod state;
pub(crate) mod tasks;
pub(crate) mod transaction;
pub(crate) mod utils;
