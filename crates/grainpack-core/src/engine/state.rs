use super::filling::{self, FillingError};
use super::neighbors::{initialize_neighbors, update_neighbors};
use super::packing_grid::PackingGrid;
use crate::core::models::domain::Domain;
use crate::core::models::grain::{Footprint, Grain};
use crate::core::models::statistics::PrimaryPhase;
use crate::core::shapes::{GrainShape, ShapeClass};
use nalgebra::Point3;
use rand::Rng;

/// Packing-grid cells outside every exclusion zone, with O(1) insert, remove and random
/// choice.
#[derive(Debug, Clone, Default)]
pub struct AvailablePoints {
    points: Vec<usize>,
    positions: Vec<Option<usize>>,
}

impl AvailablePoints {
    pub fn from_grid(grid: &PackingGrid) -> Self {
        let mut available = Self {
            points: Vec::new(),
            positions: vec![None; grid.cell_count()],
        };
        for index in 0..grid.cell_count() {
            if !grid.is_excluded(index) {
                available.insert(index);
            }
        }
        available
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn contains(&self, cell: usize) -> bool {
        self.positions.get(cell).is_some_and(|p| p.is_some())
    }

    pub fn insert(&mut self, cell: usize) {
        if cell >= self.positions.len() || self.positions[cell].is_some() {
            return;
        }
        self.positions[cell] = Some(self.points.len());
        self.points.push(cell);
    }

    pub fn remove(&mut self, cell: usize) {
        let Some(position) = self.positions.get_mut(cell).and_then(Option::take) else {
            return;
        };
        self.points.swap_remove(position);
        if let Some(&moved) = self.points.get(position) {
            self.positions[moved] = Some(position);
        }
    }

    pub fn choose(&self, rng: &mut impl Rng) -> Option<usize> {
        if self.points.is_empty() {
            None
        } else {
            Some(self.points[rng.gen_range(0..self.points.len())])
        }
    }

    /// Re-evaluates the cells covered by `footprint` against the grid's exclusion state.
    pub fn refresh(&mut self, grid: &PackingGrid, footprint: &Footprint) {
        for cell in footprint.iter() {
            if let Some(index) = grid.resolve(cell.cell) {
                if grid.is_excluded(index) {
                    self.remove(index);
                } else {
                    self.insert(index);
                }
            }
        }
    }
}

/// Everything the placement stages mutate: the grains, their resolved shapes, the packing
/// grid and the filling error of the grid.
#[derive(Debug, Clone)]
pub struct PackingState {
    pub grains: Vec<Grain>,
    pub shapes: Vec<GrainShape>,
    pub grid: PackingGrid,
    pub error: FillingError,
    pub available: AvailablePoints,
    neighbors_tracked: bool,
}

impl PackingState {
    pub fn new(grains: Vec<Grain>, phases: &[PrimaryPhase], domain: &Domain) -> Self {
        let shapes = grains
            .iter()
            .map(|g| {
                let class = phases
                    .iter()
                    .find(|p| p.id == g.phase)
                    .map_or(ShapeClass::Unknown, |p| p.shape);
                g.shape(class)
            })
            .collect();
        let grid = PackingGrid::new(domain);
        let error = FillingError::empty(&grid);
        Self {
            grains,
            shapes,
            grid,
            error,
            available: AvailablePoints::default(),
            neighbors_tracked: false,
        }
    }

    pub fn add_to_grid(&mut self, index: usize) {
        self.error = filling::apply(
            self.error,
            Some(&self.grains[index].footprint),
            None,
            &mut self.grid,
        );
    }

    pub fn remove_from_grid(&mut self, index: usize) {
        self.error = filling::apply(
            self.error,
            None,
            Some(&self.grains[index].footprint),
            &mut self.grid,
        );
    }

    /// Computes the grain's footprint from scratch at `centroid`.
    pub fn place(&mut self, index: usize, centroid: Point3<f64>) {
        let footprint = self.grid.footprint(&self.shapes[index], &centroid);
        let grain = &mut self.grains[index];
        grain.centroid = centroid;
        grain.footprint = footprint;
    }

    /// Moves a grain that is not on the grid to `centroid`.
    ///
    /// In a periodic grid the footprint is shifted by whole cells; in a bounded grid it is
    /// recomputed so that it never holds cells outside the grid. Neighbor counts follow
    /// the grain once they are being tracked.
    pub fn relocate(&mut self, index: usize, centroid: Point3<f64>) {
        if self.neighbors_tracked {
            update_neighbors(&mut self.grains, index, -1);
        }
        if self.grid.periodic() {
            let from = self.grid.cell_of(&self.grains[index].centroid);
            let to = self.grid.cell_of(&centroid);
            let grain = &mut self.grains[index];
            grain.footprint.shift([to[0] - from[0], to[1] - from[1], to[2] - from[2]]);
            grain.centroid = centroid;
        } else {
            self.place(index, centroid);
        }
        if self.neighbors_tracked {
            update_neighbors(&mut self.grains, index, 1);
        }
    }

    pub fn initialize_neighbors(&mut self) {
        initialize_neighbors(&mut self.grains);
        self.neighbors_tracked = true;
    }

    pub fn rebuild_available_points(&mut self) {
        self.available = AvailablePoints::from_grid(&self.grid);
    }

    pub fn len(&self) -> usize {
        self.grains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grains.is_empty()
    }

    pub fn into_grains(self) -> Vec<Grain> {
        self.grains
    }

    /// Grains with their resolved shapes, in grain order.
    pub fn into_parts(self) -> (Vec<Grain>, Vec<GrainShape>) {
        (self.grains, self.shapes)
    }
}
