//! Reading statistics documents and writing packing results.
//!
//! The packing engine itself never touches the filesystem; these readers and writers are
//! invoked by workflows and front ends around it.

pub mod goal_attributes;
pub mod statistics;
pub mod vtk;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV writing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("Array '{name}' has {found} values but the grid has {expected} points")]
    ShapeMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
}
