//! Filling error: a penalty on how grain footprints cover the packing grid.
//!
//! Adding a footprint cell at occupancy `o` contributes `m·(2o − 1)` and removing it at
//! occupancy `o` contributes `m·(3 − 2o)`, where the multiplier `m` is 2 while the cell
//! lies in some grain's exclusion zone and 1 otherwise. Empty cells therefore reward
//! coverage and crowded cells are penalized super-linearly.
//!
//! The error is a plain value threaded through every call. Its running total is an
//! integer, so adding and then removing the same footprint restores it exactly.

use super::packing_grid::PackingGrid;
use crate::core::models::grain::Footprint;

/// Cells where a footprint's insideness exceeds this value join its exclusion zone.
pub const EXCLUSION_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillingError {
    total: i64,
    cells: usize,
}

impl FillingError {
    /// The error of an empty packing grid.
    pub fn empty(grid: &PackingGrid) -> Self {
        Self {
            total: 0,
            cells: grid.cell_count(),
        }
    }

    /// Running total divided by the number of packing cells.
    pub fn value(&self) -> f64 {
        if self.cells == 0 {
            0.0
        } else {
            self.total as f64 / self.cells as f64
        }
    }
}

/// Applies an optional footprint addition followed by an optional removal.
pub fn apply(
    error: FillingError,
    add: Option<&Footprint>,
    remove: Option<&Footprint>,
    grid: &mut PackingGrid,
) -> FillingError {
    let mut total = error.total;

    if let Some(footprint) = add {
        for cell in footprint.iter() {
            let Some(index) = grid.resolve(cell.cell) else {
                continue;
            };
            let occupancy = i64::from(grid.owners[index]);
            let multiplier = if grid.exclusion[index] > 0 { 2 } else { 1 };
            if cell.insideness > EXCLUSION_THRESHOLD {
                grid.exclusion[index] += 1;
            }
            total += multiplier * (2 * occupancy - 1);
            grid.owners[index] += 1;
        }
    }

    // Walking backwards undoes an addition of the same footprint cell by cell, even when
    // wrapped cells repeat.
    if let Some(footprint) = remove {
        for cell in footprint.iter().rev() {
            let Some(index) = grid.resolve(cell.cell) else {
                continue;
            };
            let occupancy = i64::from(grid.owners[index]);
            if cell.insideness > EXCLUSION_THRESHOLD {
                grid.exclusion[index] = grid.exclusion[index].saturating_sub(1);
            }
            let multiplier = if grid.exclusion[index] > 0 { 2 } else { 1 };
            total += multiplier * (3 - 2 * occupancy);
            grid.owners[index] -= 1;
        }
    }

    FillingError {
        total,
        cells: error.cells,
    }
}
