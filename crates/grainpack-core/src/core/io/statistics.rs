use crate::core::models::statistics::StatisticsSet;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatisticsLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

/// Parses a statistics document from TOML text.
pub fn parse_statistics(content: &str) -> Result<StatisticsSet, toml::de::Error> {
    toml::from_str(content)
}

/// Loads a statistics document from a TOML file.
pub fn load_statistics(path: &Path) -> Result<StatisticsSet, StatisticsLoadError> {
    let content = std::fs::read_to_string(path).map_err(|e| StatisticsLoadError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    parse_statistics(&content).map_err(|e| StatisticsLoadError::Toml {
        path: path.to_string_lossy().to_string(),
        source: e,
    })
}
