use super::error::EngineError;
use super::filling::FillingError;
use super::state::PackingState;
use crate::core::models::grain::Footprint;
use nalgebra::Point3;

/// Placement of one grain before a trial move.
struct MoveRecord {
    centroid: Point3<f64>,
    footprint: Footprint,
    error: FillingError,
}

impl PackingState {
    /// Runs a trial move of the grain at `index` and keeps it only if `action` says so.
    ///
    /// `action` is expected to take the grain off the grid, move it and put it back. A
    /// rejected move is undone through the same inverse grid updates, restoring the grain,
    /// the grid and the filling error. An accepted move refreshes the available points
    /// under both the old and the new footprint.
    pub fn transaction<F>(&mut self, index: usize, action: F) -> Result<bool, EngineError>
    where
        F: FnOnce(&mut Self) -> Result<bool, EngineError>,
    {
        // 1. Record the original placement of the grain.
        let grain = self.grains.get(index).ok_or_else(|| {
            EngineError::Internal(format!("Grain index {index} is out of range"))
        })?;
        let record = MoveRecord {
            centroid: grain.centroid,
            footprint: grain.footprint.clone(),
            error: self.error,
        };

        // 2. Execute the action.
        let keep = action(self)?;

        // 3. Keep the move, or put the grain back where it was.
        if keep {
            self.available.refresh(&self.grid, &record.footprint);
            let footprint = self.grains[index].footprint.clone();
            self.available.refresh(&self.grid, &footprint);
        } else {
            self.remove_from_grid(index);
            self.relocate(index, record.centroid);
            self.grains[index].footprint = record.footprint;
            self.add_to_grid(index);
            debug_assert_eq!(self.error, record.error);
            self.error = record.error;
        }
        Ok(keep)
    }
}
