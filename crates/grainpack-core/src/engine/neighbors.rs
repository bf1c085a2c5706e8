use crate::core::models::grain::Grain;

/// Adjusts neighbor counts for the grain at `index` by `delta`.
///
/// Another grain counts as a neighbor of a grain when every centroid coordinate
/// difference is smaller than that grain's equivalent diameter. The test runs in both
/// directions, so a large grain can see a small one without being seen back.
pub fn update_neighbors(grains: &mut [Grain], index: usize, delta: i32) {
    let centroid = grains[index].centroid;
    let diameter = grains[index].equivalent_diameter;
    let mut own = 0;
    for (other_index, other) in grains.iter_mut().enumerate() {
        if other_index == index || !other.active {
            continue;
        }
        let d = (other.centroid - centroid).abs();
        if d.x < diameter && d.y < diameter && d.z < diameter {
            own += delta;
        }
        let other_diameter = other.equivalent_diameter;
        if d.x < other_diameter && d.y < other_diameter && d.z < other_diameter {
            other.neighbors += delta;
        }
    }
    grains[index].neighbors += own;
}

/// Recomputes every active grain's neighbor count from scratch.
///
/// Each grain counts the grains inside its own proximity box, which is the state that
/// [`update_neighbors`] keeps consistent as grains are added, removed or moved.
pub fn initialize_neighbors(grains: &mut [Grain]) {
    let counts: Vec<i32> = grains
        .iter()
        .enumerate()
        .map(|(index, grain)| {
            if !grain.active {
                return 0;
            }
            let diameter = grain.equivalent_diameter;
            grains
                .iter()
                .enumerate()
                .filter(|&(other_index, other)| {
                    let d = (other.centroid - grain.centroid).abs();
                    other_index != index
                        && other.active
                        && d.x < diameter
                        && d.y < diameter
                        && d.z < diameter
                })
                .count() as i32
        })
        .collect();
    for (grain, count) in grains.iter_mut().zip(counts) {
        grain.neighbors = count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn grain(x: f64, diameter: f64) -> Grain {
        let mut g = Grain::degenerate(1);
        g.active = true;
        g.equivalent_diameter = diameter;
        g.centroid = Point3::new(x, 0.0, 0.0);
        g
    }

    #[test]
    fn proximity_is_asymmetric() {
        let mut grains = vec![grain(0.0, 10.0), grain(5.0, 2.0)];
        update_neighbors(&mut grains, 0, 1);
        assert_eq!(grains[0].neighbors, 1);
        assert_eq!(grains[1].neighbors, 0);
    }

    #[test]
    fn removing_undoes_adding() {
        let mut grains = vec![grain(0.0, 4.0), grain(1.0, 4.0), grain(2.0, 1.5)];
        update_neighbors(&mut grains, 1, 1);
        update_neighbors(&mut grains, 1, -1);
        assert!(grains.iter().all(|g| g.neighbors == 0));
    }

    #[test]
    fn initialization_matches_incremental_updates() {
        let mut grains = vec![grain(0.0, 4.0), grain(1.0, 4.0), grain(50.0, 4.0), grain(3.0, 1.0)];
        grains[2].neighbors = 9;
        initialize_neighbors(&mut grains);
        assert_eq!(grains[0].neighbors, 2);
        assert_eq!(grains[1].neighbors, 2);
        assert_eq!(grains[2].neighbors, 0);
        assert_eq!(grains[3].neighbors, 0);

        let initialized: Vec<_> = grains.iter().map(|g| g.neighbors).collect();
        let mut incremental = grains.clone();
        incremental.iter_mut().for_each(|g| {
            g.neighbors = 0;
            g.active = false;
        });
        for index in 0..incremental.len() {
            incremental[index].active = true;
            update_neighbors(&mut incremental, index, 1);
        }
        let rebuilt: Vec<_> = incremental.iter().map(|g| g.neighbors).collect();
        assert_eq!(initialized, rebuilt);
    }

    #[test]
    fn inactive_grains_are_ignored() {
        let mut grains = vec![grain(0.0, 4.0), grain(1.0, 4.0)];
        grains[1].active = false;
        update_neighbors(&mut grains, 0, 1);
        assert_eq!(grains[0].neighbors, 0);
        assert_eq!(grains[1].neighbors, 0);
    }
}
