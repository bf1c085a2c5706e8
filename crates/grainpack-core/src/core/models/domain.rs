use nalgebra::{Point3, Vector3};

/// The rectilinear voxel domain a microstructure is synthesized into.
///
/// Voxels are addressed either by `(column, row, plane)` or by a flat index where the
/// column varies fastest. Physical coordinates place voxel `i` along an axis at
/// `i × resolution`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Domain {
    /// Number of voxels along x, y and z.
    pub dims: [usize; 3],
    /// Physical edge length of one voxel along each axis.
    pub resolution: Vector3<f64>,
    /// Whether grains wrap around the domain faces.
    pub periodic: bool,
}

impl Domain {
    pub fn new(dims: [usize; 3], resolution: Vector3<f64>, periodic: bool) -> Self {
        Self {
            dims,
            resolution,
            periodic,
        }
    }

    pub fn voxel_count(&self) -> usize {
        self.dims.iter().product()
    }

    /// Physical extent of the domain along each axis.
    pub fn size(&self) -> Vector3<f64> {
        Vector3::new(
            self.dims[0] as f64 * self.resolution.x,
            self.dims[1] as f64 * self.resolution.y,
            self.dims[2] as f64 * self.resolution.z,
        )
    }

    pub fn volume(&self) -> f64 {
        self.size().product()
    }

    pub fn voxel_volume(&self) -> f64 {
        self.resolution.product()
    }

    pub fn center(&self) -> Point3<f64> {
        Point3::from(self.size() * 0.5)
    }

    #[inline]
    pub fn index(&self, column: usize, row: usize, plane: usize) -> usize {
        (plane * self.dims[1] + row) * self.dims[0] + column
    }

    #[inline]
    pub fn coords(&self, index: usize) -> [usize; 3] {
        let column = index % self.dims[0];
        let row = (index / self.dims[0]) % self.dims[1];
        let plane = index / (self.dims[0] * self.dims[1]);
        [column, row, plane]
    }

    /// Flat indices of the face-connected neighbors of a voxel, honoring periodicity.
    pub fn face_neighbors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        let coords = self.coords(index);
        const OFFSETS: [(usize, isize); 6] = [(2, -1), (1, -1), (0, -1), (0, 1), (1, 1), (2, 1)];
        OFFSETS.into_iter().filter_map(move |(axis, step)| {
            let mut c = coords;
            let n = self.dims[axis] as isize;
            let shifted = c[axis] as isize + step;
            if (0..n).contains(&shifted) {
                c[axis] = shifted as usize;
            } else if self.periodic && n > 1 {
                c[axis] = shifted.rem_euclid(n) as usize;
            } else {
                return None;
            }
            Some(self.index(c[0], c[1], c[2]))
        })
    }

    /// Whether the voxel lies on one of the six domain faces.
    pub fn on_surface(&self, index: usize) -> bool {
        let c = self.coords(index);
        (0..3).any(|axis| c[axis] == 0 || c[axis] + 1 == self.dims[axis])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain(periodic: bool) -> Domain {
        Domain::new([4, 3, 2], Vector3::new(0.5, 1.0, 2.0), periodic)
    }

    #[test]
    fn size_volume_and_center_follow_resolution() {
        let d = domain(false);
        assert_eq!(d.voxel_count(), 24);
        assert_eq!(d.size(), Vector3::new(2.0, 3.0, 4.0));
        assert_eq!(d.volume(), 24.0);
        assert_eq!(d.voxel_volume(), 1.0);
        assert_eq!(d.center(), Point3::new(1.0, 1.5, 2.0));
    }

    #[test]
    fn index_and_coords_round_trip() {
        let d = domain(false);
        for i in 0..d.voxel_count() {
            let [c, r, p] = d.coords(i);
            assert_eq!(d.index(c, r, p), i);
        }
    }

    #[test]
    fn face_neighbors_stop_at_faces_unless_periodic() {
        let closed = domain(false);
        let corner = closed.index(0, 0, 0);
        let neighbors: Vec<_> = closed.face_neighbors(corner).collect();
        assert_eq!(neighbors.len(), 3);

        let wrapped = domain(true);
        let neighbors: Vec<_> = wrapped.face_neighbors(corner).collect();
        assert_eq!(neighbors.len(), 6);
        assert!(neighbors.contains(&wrapped.index(3, 0, 0)));
        assert!(neighbors.contains(&wrapped.index(0, 2, 0)));
    }

    #[test]
    fn surface_detection() {
        let d = Domain::new([3, 3, 3], Vector3::new(1.0, 1.0, 1.0), false);
        assert!(!d.on_surface(d.index(1, 1, 1)));
        assert!(d.on_surface(d.index(0, 1, 1)));
        assert!(d.on_surface(d.index(1, 2, 1)));
    }
}
