//! # Core Models Module
//!
//! Plain data structures describing what is packed and where it is packed.
//!
//! ## Key Components
//!
//! - [`statistics`] - Per-phase statistical models read from the statistics collaborator
//! - [`grain`] - Sampled grains, their footprints on the packing grid, and grain ids
//! - [`domain`] - The voxel domain geometry and voxel addressing
//! - [`field`] - The per-voxel grain-id and phase-id output arrays
//!
//! Models carry no packing logic; the [`engine`](crate::engine) mutates them.

pub mod domain;
pub mod field;
pub mod grain;
pub mod statistics;
