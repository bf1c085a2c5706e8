//! Utility functions for the engine module.
//!
//! Sampling of candidate grains from phase statistics lives here, shared by the generation
//! task and by the grain-count estimate.

pub mod sampling;
