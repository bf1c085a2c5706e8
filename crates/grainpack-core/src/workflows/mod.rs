//! # Workflows Module
//!
//! High-level entry points that run a complete packing from phase statistics to a
//! voxelized microstructure.
//!
//! ## Overview
//!
//! A workflow validates its inputs, seeds the random number generator, drives every
//! engine stage in order and returns the voxel arrays together with the final grains and
//! an explicit status. Callers observe it through a [`ProgressReporter`] and can stop it
//! with a [`CancellationToken`].
//!
//! ## Architecture
//!
//! - **Packing Workflow** ([`pack`]) - Generation, placement, refinement, rasterization,
//!   gap filling, cleanup and compaction, with optional diagnostic and tabular exports.
//!
//! [`ProgressReporter`]: crate::engine::progress::ProgressReporter
//! [`CancellationToken`]: crate::engine::cancel::CancellationToken

pub mod pack;
