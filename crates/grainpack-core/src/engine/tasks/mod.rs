//! Tasks for grain generation, packing and voxelization.
//!
//! Each submodule implements one stage of the packing pipeline. Stages that loop over
//! grains or moves poll the cancellation token once per iteration and report whether they
//! ran to completion through [`Flow`].

pub mod cleanup;
pub mod compaction;
pub mod gap_fill;
pub mod generation;
pub mod placement;
pub mod rasterize;
pub mod refinement;

pub const STAGE_GENERATING: &str = "Generating";
pub const STAGE_INITIAL_PLACEMENT: &str = "InitialPlacement";
pub const STAGE_NEIGHBOR_INIT: &str = "NeighborInit";
pub const STAGE_REFINING: &str = "Refining";
pub const STAGE_RASTERIZING: &str = "Rasterizing";
pub const STAGE_GAP_FILLING: &str = "GapFilling";
pub const STAGE_CLEANUP: &str = "Cleanup";
pub const STAGE_COMPACTING: &str = "Compacting";

/// Whether a task ran to completion or stopped at a cancellation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Completed,
    Cancelled,
}

impl Flow {
    pub fn is_cancelled(self) -> bool {
        self == Self::Cancelled
    }
}
