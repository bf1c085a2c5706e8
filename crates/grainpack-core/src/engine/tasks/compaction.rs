use crate::core::models::field::{NO_PHASE, UNASSIGNED, VoxelField};
use crate::core::models::grain::Grain;
use tracing::{info, instrument};

/// Drops grains that own no voxels and renumbers the rest contiguously from 1.
///
/// Returns the new id of every old grain (`None` for dropped grains), indexed by old
/// zero-based grain index. Voxel ids and phases are rewritten to match the surviving
/// grains; voxels carrying an id without a grain are cleared.
#[instrument(skip_all, name = "compaction_task")]
pub fn run(field: &mut VoxelField, grains: &mut Vec<Grain>) -> Vec<Option<i32>> {
    let mut owned = vec![0usize; grains.len()];
    for &id in &field.grain_ids {
        if let Some(count) = usize::try_from(id - 1).ok().and_then(|i| owned.get_mut(i)) {
            *count += 1;
        }
    }

    let mut remap = vec![None; grains.len()];
    let mut next = 1;
    for (index, grain) in grains.iter_mut().enumerate() {
        grain.active = owned[index] > 0;
        if grain.active {
            remap[index] = Some(next);
            next += 1;
        }
    }

    let before = grains.len();
    let mut index = 0;
    grains.retain(|_| {
        let keep = remap[index].is_some();
        index += 1;
        keep
    });

    for (id, phase) in field.grain_ids.iter_mut().zip(field.phases.iter_mut()) {
        let new_id = usize::try_from(*id - 1)
            .ok()
            .and_then(|i| remap.get(i).copied().flatten());
        match new_id {
            Some(new_id) => {
                *id = new_id;
                *phase = grains[new_id as usize - 1].phase as i32;
            }
            None => {
                *id = UNASSIGNED;
                *phase = NO_PHASE;
            }
        }
    }

    info!(before, after = grains.len(), "Grain ids compacted.");
    remap
}
