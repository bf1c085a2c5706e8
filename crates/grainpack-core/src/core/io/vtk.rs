//! Legacy ASCII VTK `STRUCTURED_POINTS` writer for integer cell arrays.

use super::ExportError;
use crate::core::models::domain::Domain;
use crate::core::models::field::VoxelField;
use nalgebra::Vector3;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// A named integer array with one value per grid point.
#[derive(Debug, Clone, Copy)]
pub struct ScalarArray<'a> {
    pub name: &'a str,
    pub values: &'a [i32],
}

/// A structured-points dataset with one or more scalar arrays.
#[derive(Debug, Clone)]
pub struct StructuredPoints<'a> {
    pub title: &'a str,
    pub dims: [usize; 3],
    pub spacing: Vector3<f64>,
    pub scalars: Vec<ScalarArray<'a>>,
}

impl StructuredPoints<'_> {
    fn point_count(&self) -> usize {
        self.dims.iter().product()
    }

    fn check_shapes(&self) -> Result<(), ExportError> {
        let expected = self.point_count();
        for array in &self.scalars {
            if array.values.len() != expected {
                return Err(ExportError::ShapeMismatch {
                    name: array.name.to_string(),
                    expected,
                    found: array.values.len(),
                });
            }
        }
        Ok(())
    }

    pub fn write_to(&self, writer: &mut impl Write) -> std::io::Result<()> {
        writeln!(writer, "# vtk DataFile Version 2.0")?;
        writeln!(writer, "{}", self.title)?;
        writeln!(writer, "ASCII")?;
        writeln!(writer, "DATASET STRUCTURED_POINTS")?;
        writeln!(
            writer,
            "DIMENSIONS {} {} {}",
            self.dims[0], self.dims[1], self.dims[2]
        )?;
        writeln!(writer, "ORIGIN 0.0 0.0 0.0")?;
        writeln!(
            writer,
            "SPACING {} {} {}",
            self.spacing.x, self.spacing.y, self.spacing.z
        )?;
        writeln!(writer, "POINT_DATA {}", self.point_count())?;

        let row_len = self.dims[0].max(1);
        for array in &self.scalars {
            writeln!(writer)?;
            writeln!(writer, "SCALARS {} int 1", array.name)?;
            writeln!(writer, "LOOKUP_TABLE default")?;
            for row in array.values.chunks(row_len) {
                let mut first = true;
                for value in row {
                    if !first {
                        write!(writer, " ")?;
                    }
                    write!(writer, "{value}")?;
                    first = false;
                }
                writeln!(writer)?;
            }
        }
        Ok(())
    }

    pub fn write_to_path(&self, path: &Path) -> Result<(), ExportError> {
        self.check_shapes()?;
        let io_err = |e| ExportError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
        self.write_to(&mut writer).map_err(io_err)?;
        writer.flush().map_err(io_err)
    }
}

/// Writes the fine-grid `FeatureIds` and `Phases` arrays of a packing result.
pub fn write_microstructure(path: &Path, domain: &Domain, field: &VoxelField) -> Result<(), ExportError> {
    StructuredPoints {
        title: "grainpack microstructure",
        dims: domain.dims,
        spacing: domain.resolution,
        scalars: vec![
            ScalarArray {
                name: "FeatureIds",
                values: &field.grain_ids,
            },
            ScalarArray {
                name: "Phases",
                values: &field.phases,
            },
        ],
    }
    .write_to_path(path)
}
