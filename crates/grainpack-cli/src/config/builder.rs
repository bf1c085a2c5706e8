use super::defaults::DefaultsConfig;
use super::file::FileConfig;
use super::models::AppConfig;
use crate::cli::PackArgs;
use crate::error::{CliError, Result};
use grainpack::engine::config::PackingConfigBuilder;
use std::str::FromStr;

pub fn build_config(args: &PackArgs) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };
    let file_config = apply_set_values(file_config, &args.set_values)?;

    let domain_file = file_config.domain.unwrap_or_default();
    let packing_file = file_config.packing.unwrap_or_default();
    let output_file = file_config.output.unwrap_or_default();

    let dims = match &args.dims {
        Some(values) => to_triple(values, "--dims")?,
        None => domain_file.dims.unwrap_or(defaults.dims),
    };
    let resolution = match &args.resolution {
        Some(values) => to_triple(values, "--resolution")?,
        None => domain_file.resolution.unwrap_or(defaults.resolution),
    };
    let periodic = match (args.periodic.periodic, args.periodic.no_periodic) {
        (true, false) => true,
        (false, true) => false,
        _ => domain_file.periodic.unwrap_or(defaults.periodic),
    };

    let seed = args.seed.or(packing_file.seed).unwrap_or(defaults.seed);
    let moves_per_grain = args
        .moves_per_grain
        .or(packing_file.moves_per_grain)
        .unwrap_or(defaults.moves_per_grain);
    let cleanup = !args.no_cleanup && packing_file.cleanup.unwrap_or(defaults.cleanup);

    let mut builder = PackingConfigBuilder::new()
        .dims(dims)
        .resolution(resolution)
        .periodic(periodic)
        .seed(seed)
        .moves_per_grain(moves_per_grain)
        .cleanup(cleanup);

    if let Some(path) = args.goal_attributes.clone().or(output_file.goal_attributes) {
        builder = builder.write_goal_attributes(true).goal_attributes_path(path);
    }
    if let Some(path) = args.packing_dump.clone().or(output_file.packing_dump) {
        builder = builder.packing_dump_path(path);
    }

    let core_config = builder
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    Ok(AppConfig {
        statistics_path: args.statistics.clone(),
        output_path: args.output.clone(),
        core_config,
    })
}

fn to_triple<T: Copy>(values: &[T], name: &str) -> Result<[T; 3]> {
    values
        .try_into()
        .map_err(|_| CliError::Config(format!("{} expects exactly three values", name)))
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid value for {}: {}", key, value)))
}

fn parse_triple<T: FromStr + Copy>(key: &str, value: &str) -> Result<[T; 3]> {
    let parts = value
        .split(',')
        .map(|part| parse_value(key, part))
        .collect::<Result<Vec<T>>>()?;
    to_triple(&parts, key)
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };

        match key {
            "domain.dims" => {
                config.domain.get_or_insert_with(Default::default).dims = Some(parse_triple(key, value)?);
            }
            "domain.resolution" => {
                config.domain.get_or_insert_with(Default::default).resolution =
                    Some(parse_triple(key, value)?);
            }
            "domain.periodic" => {
                config.domain.get_or_insert_with(Default::default).periodic = Some(parse_value(key, value)?);
            }
            "packing.seed" => {
                config.packing.get_or_insert_with(Default::default).seed =
                    Some(parse_value(key, value)?);
            }
            "packing.moves-per-grain" => {
                config
                    .packing
                    .get_or_insert_with(Default::default)
                    .moves_per_grain = Some(parse_value(key, value)?);
            }
            "packing.cleanup" => {
                config.packing.get_or_insert_with(Default::default).cleanup =
                    Some(parse_value(key, value)?);
            }
            "output.goal-attributes" => {
                config
                    .output
                    .get_or_insert_with(Default::default)
                    .goal_attributes = Some(value.into());
            }
            "output.packing-dump" => {
                config.output.get_or_insert_with(Default::default).packing_dump =
                    Some(value.into());
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::PeriodicFlags;
    use grainpack::engine::config::PackingConfig;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn assert_resolution(config: &PackingConfig, expected: [f64; 3]) {
        let actual = [config.resolution.x, config.resolution.y, config.resolution.z];
        assert_eq!(actual, expected);
    }

    fn base_pack_args() -> PackArgs {
        PackArgs {
            statistics: PathBuf::from("stats.toml"),
            output: PathBuf::from("out.vtk"),
            config: None,
            dims: None,
            resolution: None,
            periodic: PeriodicFlags::default(),
            seed: None,
            moves_per_grain: None,
            no_cleanup: false,
            goal_attributes: None,
            packing_dump: None,
            set_values: vec![],
        }
    }

    #[test]
    fn defaults_fill_every_unset_value() {
        let app = build_config(&base_pack_args()).expect("build ok");
        let defaults = DefaultsConfig::default();
        let cfg = app.core_config;
        assert_eq!(cfg.dims, defaults.dims);
        assert_resolution(&cfg, defaults.resolution);
        assert_eq!(cfg.periodic, defaults.periodic);
        assert_eq!(cfg.seed, defaults.seed);
        assert_eq!(cfg.moves_per_grain, defaults.moves_per_grain);
        assert!(cfg.cleanup);
        assert!(!cfg.output.write_goal_attributes);
        assert_eq!(app.statistics_path, PathBuf::from("stats.toml"));
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempdir().unwrap();
        let cfg_path = dir.path().join("config.toml");
        fs::write(
            &cfg_path,
            r#"
            [domain]
            dims = [40, 30, 20]
            resolution = [0.5, 0.5, 0.5]
            periodic = true

            [packing]
            seed = 77
            moves-per-grain = 10
            cleanup = false

            [output]
            goal-attributes = "out/goal.csv"
            packing-dump = "out/grid.vtk"
            "#,
        )
        .unwrap();

        let mut args = base_pack_args();
        args.config = Some(cfg_path);
        let cfg = build_config(&args).expect("build ok").core_config;

        assert_eq!(cfg.dims, [40, 30, 20]);
        assert_resolution(&cfg, [0.5, 0.5, 0.5]);
        assert!(cfg.periodic);
        assert_eq!(cfg.seed, 77);
        assert_eq!(cfg.moves_per_grain, 10);
        assert!(!cfg.cleanup);
        assert!(cfg.output.write_goal_attributes);
        assert_eq!(
            cfg.output.goal_attributes_path,
            Some(PathBuf::from("out/goal.csv"))
        );
        assert_eq!(
            cfg.output.packing_dump_path,
            Some(PathBuf::from("out/grid.vtk"))
        );
    }

    #[test]
    fn flags_override_file_and_set_values() {
        let dir = tempdir().unwrap();
        let cfg_path = dir.path().join("config.toml");
        fs::write(&cfg_path, "[domain]\nperiodic = true\n[packing]\nseed = 1\n").unwrap();

        let mut args = base_pack_args();
        args.config = Some(cfg_path);
        args.set_values = vec!["packing.seed=2".to_string(), "domain.dims=8,9,10".to_string()];
        args.seed = Some(3);
        args.periodic = PeriodicFlags {
            periodic: false,
            no_periodic: true,
        };
        args.no_cleanup = true;

        let cfg = build_config(&args).expect("build ok").core_config;
        assert_eq!(cfg.seed, 3);
        assert_eq!(cfg.dims, [8, 9, 10]);
        assert!(!cfg.periodic);
        assert!(!cfg.cleanup);
    }

    #[test]
    fn set_values_override_file_values() {
        let mut args = base_pack_args();
        args.set_values = vec![
            "packing.moves-per-grain=4".to_string(),
            "domain.resolution=0.25, 0.5, 1".to_string(),
            "output.packing-dump=dump.vtk".to_string(),
        ];
        let cfg = build_config(&args).expect("build ok").core_config;
        assert_eq!(cfg.moves_per_grain, 4);
        assert_resolution(&cfg, [0.25, 0.5, 1.0]);
        assert_eq!(cfg.output.packing_dump_path, Some(PathBuf::from("dump.vtk")));
    }

    #[test]
    fn malformed_set_values_are_rejected() {
        for bad in ["packing.seed", "packing.seed=abc", "domain.dims=1,2", "unknown.key=1"] {
            let mut args = base_pack_args();
            args.set_values = vec![bad.to_string()];
            assert!(
                matches!(build_config(&args), Err(CliError::Config(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn invalid_resolution_is_a_configuration_error() {
        let mut args = base_pack_args();
        args.resolution = Some(vec![1.0, 0.0, 1.0]);
        assert!(matches!(build_config(&args), Err(CliError::Config(_))));
    }
}
