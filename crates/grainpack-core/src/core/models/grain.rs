use crate::core::shapes::{GrainShape, ShapeClass};
use nalgebra::Point3;

/// A packing-grid cell claimed by a grain, with the shape's insideness at that cell.
///
/// Cell coordinates may lie outside the packing grid; they are wrapped or skipped when
/// the footprint is applied, depending on the domain's periodicity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FootprintCell {
    pub cell: [i64; 3],
    pub insideness: f64,
}

/// The set of packing-grid cells a grain's shape claims at its current centroid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Footprint {
    cells: Vec<FootprintCell>,
}

impl Footprint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cell: [i64; 3], insideness: f64) {
        self.cells.push(FootprintCell { cell, insideness });
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FootprintCell> {
        self.cells.iter()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Translates every cell by a whole number of packing cells.
    pub fn shift(&mut self, delta: [i64; 3]) {
        if delta == [0, 0, 0] {
            return;
        }
        for c in &mut self.cells {
            for axis in 0..3 {
                c.cell[axis] += delta[axis];
            }
        }
    }
}

/// A synthetic grain.
///
/// Size, shape and orientation are fixed when the grain is sampled; the centroid,
/// footprint and neighbor count change while the grain is being packed.
#[derive(Debug, Clone, PartialEq)]
pub struct Grain {
    /// One-based phase id the grain belongs to.
    pub phase: usize,
    /// Target volume in physical units.
    pub volume: f64,
    /// Diameter of the sphere with the same volume.
    pub equivalent_diameter: f64,
    /// Relative axis lengths `(1, b/a, c/a)` with `b/a ≥ c/a`.
    pub axis_lengths: [f64; 3],
    /// Bunge Euler angles (φ1, Φ, φ2) of the shape axes, in radians.
    pub euler_angles: [f64; 3],
    /// Shape factor Ω3.
    pub omega3: f64,
    /// Number of grains counted as neighbors by the proximity test.
    pub neighbors: i32,
    pub centroid: Point3<f64>,
    pub footprint: Footprint,
    pub active: bool,
}

impl Grain {
    /// A placeholder grain with no volume, produced when the domain has no volume to fill.
    pub fn degenerate(phase: usize) -> Self {
        Self {
            phase,
            volume: 0.0,
            equivalent_diameter: 0.0,
            axis_lengths: [1.0, 1.0, 1.0],
            euler_angles: [0.0; 3],
            omega3: 1.0,
            neighbors: 0,
            centroid: Point3::origin(),
            footprint: Footprint::new(),
            active: false,
        }
    }

    pub fn b_over_a(&self) -> f64 {
        self.axis_lengths[1]
    }

    pub fn c_over_a(&self) -> f64 {
        self.axis_lengths[2]
    }

    /// The grain's shape in the sample frame for the given shape class.
    pub fn shape(&self, class: ShapeClass) -> GrainShape {
        GrainShape::new(
            class,
            self.volume,
            [self.b_over_a(), self.c_over_a()],
            self.omega3,
            self.euler_angles,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn footprint_shift_moves_every_cell() {
        let mut fp = Footprint::new();
        fp.push([0, 1, 2], 0.5);
        fp.push([-1, 0, 3], 0.1);
        fp.shift([2, -1, 0]);
        let cells: Vec<_> = fp.iter().map(|c| c.cell).collect();
        assert_eq!(cells, vec![[2, 0, 2], [1, -1, 3]]);
        assert_eq!(fp.iter().next().map(|c| c.insideness), Some(0.5));
    }

    #[test]
    fn degenerate_grain_is_inactive_and_empty() {
        let g = Grain::degenerate(1);
        assert_eq!(g.volume, 0.0);
        assert!(!g.active);
        assert!(g.footprint.is_empty());
        assert_eq!(g.b_over_a(), 1.0);
    }
}
