/// Grain id of a voxel that no grain owns yet.
pub const UNASSIGNED: i32 = -1;

/// Phase id of a voxel that no grain owns.
pub const NO_PHASE: i32 = 0;

/// Per-voxel output arrays of a packing run.
///
/// `grain_ids[i]` is either a positive grain id or [`UNASSIGNED`]; `phases[i]` is the
/// owning grain's phase id or [`NO_PHASE`]. Both arrays always have the domain's voxel
/// count as length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoxelField {
    pub grain_ids: Vec<i32>,
    pub phases: Vec<i32>,
}

impl VoxelField {
    pub fn new(voxel_count: usize) -> Self {
        Self {
            grain_ids: vec![UNASSIGNED; voxel_count],
            phases: vec![NO_PHASE; voxel_count],
        }
    }

    pub fn len(&self) -> usize {
        self.grain_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grain_ids.is_empty()
    }

    pub fn unassigned_count(&self) -> usize {
        self.grain_ids.iter().filter(|&&id| id <= 0).count()
    }

    /// Number of voxels owned by each phase id, indexed by phase id.
    pub fn phase_voxel_counts(&self, phase_count: usize) -> Vec<usize> {
        let mut counts = vec![0; phase_count + 1];
        for &phase in &self.phases {
            if let Some(slot) = usize::try_from(phase).ok().and_then(|p| counts.get_mut(p)) {
                *slot += 1;
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_field_is_fully_unassigned() {
        let field = VoxelField::new(8);
        assert_eq!(field.len(), 8);
        assert_eq!(field.unassigned_count(), 8);
        assert!(field.phases.iter().all(|&p| p == NO_PHASE));
    }

    #[test]
    fn phase_voxel_counts_skip_out_of_range_phases() {
        let field = VoxelField {
            grain_ids: vec![1, 1, 2, UNASSIGNED],
            phases: vec![1, 1, 2, 0],
        };
        assert_eq!(field.phase_voxel_counts(2), vec![1, 2, 1]);
        assert_eq!(field.phase_voxel_counts(1), vec![1, 2]);
    }
}
