use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileDomainConfig {
    pub dims: Option<[usize; 3]>,
    pub resolution: Option<[f64; 3]>,
    pub periodic: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FilePackingConfig {
    pub seed: Option<u64>,
    pub moves_per_grain: Option<usize>,
    pub cleanup: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileOutputConfig {
    pub goal_attributes: Option<PathBuf>,
    pub packing_dump: Option<PathBuf>,
}

/// The `pack` configuration file. Every table and key is optional.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub domain: Option<FileDomainConfig>,
    pub packing: Option<FilePackingConfig>,
    pub output: Option<FileOutputConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn parses_all_tables() {
        let config: FileConfig = toml::from_str(
            r#"
            [domain]
            dims = [10, 20, 30]
            resolution = [0.5, 0.5, 0.25]
            periodic = true

            [packing]
            seed = 9
            moves-per-grain = 12
            cleanup = false

            [output]
            goal-attributes = "goal.csv"
            "#,
        )
        .unwrap();
        let domain = config.domain.unwrap();
        assert_eq!(domain.dims, Some([10, 20, 30]));
        assert_eq!(domain.resolution, Some([0.5, 0.5, 0.25]));
        assert_eq!(domain.periodic, Some(true));
        let packing = config.packing.unwrap();
        assert_eq!(packing.moves_per_grain, Some(12));
        assert_eq!(packing.cleanup, Some(false));
        let output = config.output.unwrap();
        assert_eq!(output.goal_attributes, Some(PathBuf::from("goal.csv")));
        assert_eq!(output.packing_dump, None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[packing]\ntemperature = 3.0\n").unwrap();
        let result = FileConfig::from_file(&path);
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }
}
