//! Row-per-grain CSV export of the final grain attributes.
//!
//! The first line holds the number of grains, followed by a header line and one row per
//! grain in id order.

use super::ExportError;
use crate::core::models::grain::Grain;
use std::io::Write;
use std::path::Path;

const HEADER: [&str; 16] = [
    "GrainId",
    "Phase",
    "Volume",
    "EquivalentDiameter",
    "AxisLengths_0",
    "AxisLengths_1",
    "AxisLengths_2",
    "AxisEulerAngles_0",
    "AxisEulerAngles_1",
    "AxisEulerAngles_2",
    "Omega3",
    "NumNeighbors",
    "Centroids_0",
    "Centroids_1",
    "Centroids_2",
    "Active",
];

fn record(id: usize, grain: &Grain) -> Vec<String> {
    vec![
        id.to_string(),
        grain.phase.to_string(),
        grain.volume.to_string(),
        grain.equivalent_diameter.to_string(),
        grain.axis_lengths[0].to_string(),
        grain.axis_lengths[1].to_string(),
        grain.axis_lengths[2].to_string(),
        grain.euler_angles[0].to_string(),
        grain.euler_angles[1].to_string(),
        grain.euler_angles[2].to_string(),
        grain.omega3.to_string(),
        grain.neighbors.to_string(),
        grain.centroid.x.to_string(),
        grain.centroid.y.to_string(),
        grain.centroid.z.to_string(),
        u8::from(grain.active).to_string(),
    ]
}

/// Writes the grain table to any writer.
pub fn write_goal_attributes_to<W: Write>(writer: W, grains: &[Grain]) -> Result<(), csv::Error> {
    let mut csv_writer = csv::WriterBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record([grains.len().to_string()])?;
    csv_writer.write_record(HEADER)?;
    for (index, grain) in grains.iter().enumerate() {
        csv_writer.write_record(record(index + 1, grain))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Writes the grain table to `path`, creating parent directories as needed.
pub fn write_goal_attributes(path: &Path, grains: &[Grain]) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ExportError::Io {
            path: parent.to_string_lossy().to_string(),
            source: e,
        })?;
    }
    let file = std::fs::File::create(path).map_err(|e| ExportError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    write_goal_attributes_to(file, grains).map_err(|e| ExportError::Csv {
        path: path.to_string_lossy().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;
    use tempfile::tempdir;

    fn grain(phase: usize, volume: f64) -> Grain {
        let mut g = Grain::degenerate(phase);
        g.volume = volume;
        g.equivalent_diameter = 2.0;
        g.axis_lengths = [1.0, 0.8, 0.6];
        g.neighbors = 4;
        g.centroid = Point3::new(1.5, 2.5, 3.5);
        g.active = true;
        g
    }

    #[test]
    fn writes_count_header_and_rows() {
        let mut out = Vec::new();
        write_goal_attributes_to(&mut out, &[grain(1, 4.0), grain(2, 8.5)]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "2");
        assert!(lines[1].starts_with("GrainId,Phase,Volume,EquivalentDiameter,AxisLengths_0"));
        assert_eq!(lines[1].split(',').count(), HEADER.len());
        assert!(lines[2].starts_with("1,1,4,2,1,0.8,0.6,"));
        assert!(lines[3].starts_with("2,2,8.5,"));
        assert!(lines[3].ends_with(",4,1.5,2.5,3.5,1"));
    }

    #[test]
    fn write_goal_attributes_creates_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("grains.csv");
        write_goal_attributes(&path, &[grain(1, 1.0)]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("1\n"));
    }
}
