use crate::core::models::domain::Domain;
use crate::core::models::field::VoxelField;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapFillReport {
    /// Passes that assigned at least one voxel.
    pub iterations: usize,
    /// Voxels still unassigned when no pass could make progress.
    pub remaining: usize,
}

/// One vote sweep followed by one assignment sweep. Returns the number of voxels assigned.
fn fill_pass(domain: &Domain, field: &mut VoxelField, votes: &mut [u32], best: &mut [Option<usize>]) -> usize {
    for voxel in 0..field.len() {
        best[voxel] = None;
        if field.grain_ids[voxel] > 0 {
            continue;
        }
        let mut most = 0;
        for neighbor in domain.face_neighbors(voxel) {
            let id = field.grain_ids[neighbor];
            if id <= 0 {
                continue;
            }
            let count = &mut votes[id as usize];
            *count += 1;
            if *count > most {
                most = *count;
                best[voxel] = Some(neighbor);
            }
        }
        for neighbor in domain.face_neighbors(voxel) {
            let id = field.grain_ids[neighbor];
            if id > 0 {
                votes[id as usize] = 0;
            }
        }
    }

    let mut assigned = 0;
    for voxel in 0..field.len() {
        let Some(neighbor) = best[voxel] else {
            continue;
        };
        if field.grain_ids[voxel] <= 0 && field.grain_ids[neighbor] > 0 {
            field.grain_ids[voxel] = field.grain_ids[neighbor];
            field.phases[voxel] = field.phases[neighbor];
            assigned += 1;
        }
    }
    assigned
}

/// Grows grains into unassigned voxels until a pass assigns nothing.
///
/// Each unassigned voxel takes the id and phase of the face neighbor whose grain holds the
/// most of its neighbors, with the first direction winning ties. Assignments happen after
/// the whole sweep, so a pass only grows grains by one voxel layer.
#[instrument(skip_all, name = "gap_fill_task")]
pub fn run(domain: &Domain, field: &mut VoxelField) -> GapFillReport {
    let max_id = field.grain_ids.iter().copied().max().unwrap_or(0).max(0) as usize;
    let mut votes = vec![0u32; max_id + 1];
    let mut best = vec![None; field.len()];

    let mut iterations = 0;
    let mut remaining = field.unassigned_count();
    info!(unassigned = remaining, "Filling gaps.");
    while remaining > 0 {
        let assigned = fill_pass(domain, field, &mut votes, &mut best);
        if assigned == 0 {
            break;
        }
        iterations += 1;
        remaining -= assigned;
        debug!(iteration = iterations, assigned, remaining, "Gap fill pass.");
    }

    if remaining > 0 {
        warn!(remaining, "Some voxels are not connected to any grain.");
    }
    info!(iterations, "Gap filling finished.");
    GapFillReport {
        iterations,
        remaining,
    }
}
