use crate::core::models::domain::Domain;
use crate::core::models::grain::Footprint;
use crate::core::shapes::GrainShape;
use nalgebra::{Point3, Vector3};

/// Coarse bookkeeping grid used while grains are placed.
///
/// Each axis has half as many cells as the voxel domain (at least one), so a cell is two
/// voxels wide. Every cell tracks how many grain footprints cover it and how many of those
/// grains place it inside their exclusion zone.
#[derive(Debug, Clone)]
pub struct PackingGrid {
    dims: [usize; 3],
    cell_size: Vector3<f64>,
    periodic: bool,
    pub(super) owners: Vec<i32>,
    pub(super) exclusion: Vec<u32>,
}

impl PackingGrid {
    pub fn new(domain: &Domain) -> Self {
        let dims = domain.dims.map(|d| (d / 2).max(1));
        let count = dims.iter().product();
        Self {
            dims,
            cell_size: domain.resolution * 2.0,
            periodic: domain.periodic,
            owners: vec![0; count],
            exclusion: vec![0; count],
        }
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn cell_size(&self) -> Vector3<f64> {
        self.cell_size
    }

    pub fn cell_count(&self) -> usize {
        self.owners.len()
    }

    pub fn periodic(&self) -> bool {
        self.periodic
    }

    /// Number of footprints covering a cell.
    #[inline]
    pub fn owners(&self, index: usize) -> i32 {
        self.owners[index]
    }

    #[inline]
    pub fn is_excluded(&self, index: usize) -> bool {
        self.exclusion[index] > 0
    }

    #[inline]
    pub fn index(&self, cell: [usize; 3]) -> usize {
        (cell[2] * self.dims[1] + cell[1]) * self.dims[0] + cell[0]
    }

    #[inline]
    pub fn coords(&self, index: usize) -> [usize; 3] {
        let column = index % self.dims[0];
        let row = (index / self.dims[0]) % self.dims[1];
        let plane = index / (self.dims[0] * self.dims[1]);
        [column, row, plane]
    }

    /// Flat index of a possibly out-of-range cell: wrapped when periodic, `None` otherwise.
    pub fn resolve(&self, cell: [i64; 3]) -> Option<usize> {
        let mut resolved = [0usize; 3];
        for axis in 0..3 {
            let n = self.dims[axis] as i64;
            let c = cell[axis];
            resolved[axis] = if (0..n).contains(&c) {
                c as usize
            } else if self.periodic {
                c.rem_euclid(n) as usize
            } else {
                return None;
            };
        }
        Some(self.index(resolved))
    }

    /// Cell containing a physical point, clamped into the grid.
    pub fn cell_of(&self, point: &Point3<f64>) -> [i64; 3] {
        let mut cell = [0i64; 3];
        for axis in 0..3 {
            let size = self.cell_size[axis];
            let raw = ((point[axis] - size / 2.0) / size) as i64;
            cell[axis] = raw.clamp(0, self.dims[axis] as i64 - 1);
        }
        cell
    }

    pub fn cell_center(&self, cell: [usize; 3]) -> Point3<f64> {
        Point3::new(
            (cell[0] as f64 + 0.5) * self.cell_size.x,
            (cell[1] as f64 + 0.5) * self.cell_size.y,
            (cell[2] as f64 + 0.5) * self.cell_size.z,
        )
    }

    /// Cells inside `shape` when its centroid sits at `centroid`.
    ///
    /// The search box spans the primary radius plus one cell around the centroid's cell.
    /// In a periodic grid the box may extend one grid length past either face and the
    /// resulting cells are wrapped when applied; otherwise it is clamped to the grid.
    pub fn footprint(&self, shape: &GrainShape, centroid: &Point3<f64>) -> Footprint {
        let mut footprint = Footprint::new();
        let radius = shape.primary_radius();
        if radius <= 0.0 {
            return footprint;
        }
        let center = self.cell_of(centroid);
        let mut lo = [0i64; 3];
        let mut hi = [0i64; 3];
        for axis in 0..3 {
            let n = self.dims[axis] as i64;
            let extent = radius / self.cell_size[axis] + 1.0;
            let (min, max) = if self.periodic { (-n, 2 * n - 1) } else { (0, n - 1) };
            lo[axis] = ((center[axis] as f64 - extent) as i64).max(min);
            hi[axis] = ((center[axis] as f64 + extent) as i64).min(max);
        }

        for plane in lo[2]..=hi[2] {
            for row in lo[1]..=hi[1] {
                for column in lo[0]..=hi[0] {
                    let offset = Vector3::new(
                        column as f64 * self.cell_size.x - centroid.x,
                        row as f64 * self.cell_size.y - centroid.y,
                        plane as f64 * self.cell_size.z - centroid.z,
                    );
                    let insideness = shape.insideness(&offset);
                    if insideness >= 0.0 {
                        footprint.push([column, row, plane], insideness);
                    }
                }
            }
        }
        footprint
    }

    /// Occupancy and exclusion-zone snapshot as integer arrays, in flat cell order.
    pub fn snapshot(&self) -> (Vec<i32>, Vec<i32>) {
        let exclusion = self.exclusion.iter().map(|&e| i32::from(e > 0)).collect();
        (self.owners.clone(), exclusion)
    }
}
