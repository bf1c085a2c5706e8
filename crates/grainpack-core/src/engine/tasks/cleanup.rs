use crate::core::models::domain::Domain;
use crate::core::models::field::{NO_PHASE, UNASSIGNED, VoxelField};
use crate::core::models::statistics::PrimaryPhase;
use std::collections::VecDeque;
use std::f64::consts::PI;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Components detached from their grain's main body.
    pub fragments: usize,
    /// Grains dropped for being smaller than their phase's minimum size.
    pub undersized: usize,
    pub voxels_cleared: usize,
}

/// A face-connected set of voxels sharing one grain id.
struct Component {
    voxels: Vec<usize>,
    on_surface: bool,
}

fn flood(domain: &Domain, field: &VoxelField, start: usize, visited: &mut [bool]) -> Component {
    let id = field.grain_ids[start];
    let mut component = Component {
        voxels: Vec::new(),
        on_surface: false,
    };
    let mut queue = VecDeque::from([start]);
    visited[start] = true;
    while let Some(voxel) = queue.pop_front() {
        component.voxels.push(voxel);
        component.on_surface |= domain.on_surface(voxel);
        for neighbor in domain.face_neighbors(voxel) {
            if !visited[neighbor] && field.grain_ids[neighbor] == id {
                visited[neighbor] = true;
                queue.push_back(neighbor);
            }
        }
    }
    component
}

/// Minimum voxel count of a grain of `phase`: the volume of its smallest sampled
/// diameter, in voxels.
pub fn minimum_voxels(phase: &PrimaryPhase, domain: &Domain) -> usize {
    let voxel_volume = domain.voxel_volume();
    if !(voxel_volume > 0.0) {
        return 0;
    }
    (PI / 6.0 * phase.stats.min_diameter.powi(3) / voxel_volume).floor() as usize
}

fn clear(field: &mut VoxelField, voxels: &[usize]) {
    for &voxel in voxels {
        field.grain_ids[voxel] = UNASSIGNED;
        field.phases[voxel] = NO_PHASE;
    }
}

/// Keeps only the largest face-connected piece of every grain and drops interior grains
/// that are too small for their phase. Cleared voxels are left for the gap filler.
#[instrument(skip_all, name = "cleanup_task")]
pub fn run(domain: &Domain, phases: &[PrimaryPhase], field: &mut VoxelField) -> CleanupReport {
    let max_id = field.grain_ids.iter().copied().max().unwrap_or(0).max(0) as usize;
    let mut pieces: Vec<Vec<Component>> = (0..=max_id).map(|_| Vec::new()).collect();
    let mut visited = vec![false; field.len()];
    for voxel in 0..field.len() {
        let id = field.grain_ids[voxel];
        if id > 0 && !visited[voxel] {
            pieces[id as usize].push(flood(domain, field, voxel, &mut visited));
        }
    }

    let mut report = CleanupReport::default();
    for (id, mut components) in pieces.into_iter().enumerate().skip(1) {
        let Some(largest) = (0..components.len()).max_by_key(|&i| components[i].voxels.len())
        else {
            continue;
        };
        let main = components.swap_remove(largest);
        for fragment in &components {
            clear(field, &fragment.voxels);
            report.fragments += 1;
            report.voxels_cleared += fragment.voxels.len();
        }

        let Some(&voxel) = main.voxels.first() else {
            continue;
        };
        let phase_id = field.phases[voxel];
        let minimum = phases
            .iter()
            .find(|p| p.id as i32 == phase_id)
            .map_or(0, |p| minimum_voxels(p, domain));
        if main.voxels.len() < minimum && !main.on_surface {
            debug!(grain = id, voxels = main.voxels.len(), minimum, "Dropping undersized grain.");
            clear(field, &main.voxels);
            report.undersized += 1;
            report.voxels_cleared += main.voxels.len();
        }
    }

    info!(
        fragments = report.fragments,
        undersized = report.undersized,
        cleared = report.voxels_cleared,
        "Cleanup finished."
    );
    report
}
