use thiserror::Error;

use super::config::ConfigError;
use super::utils::sampling::SamplingError;
use crate::core::io::ExportError;
use crate::core::models::statistics::StatisticsError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid packing configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Invalid phase statistics: {source}")]
    Statistics {
        #[from]
        source: StatisticsError,
    },

    #[error("Grain sampling failed: {source}")]
    Sampling {
        #[from]
        source: SamplingError,
    },

    #[error("Export failed: {source}")]
    Export {
        #[from]
        source: ExportError,
    },

    #[error("Packing stage '{phase}' failed: {reason}")]
    PhaseFailed { phase: &'static str, reason: String },

    #[error("Internal logic error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Negative status code reported to callers that only understand integer statuses.
    pub fn code(&self) -> i32 {
        match self {
            Self::Statistics {
                source: StatisticsError::MissingStatistics { .. },
            } => -308,
            Self::Statistics {
                source: StatisticsError::WrongKind { .. },
            } => -666,
            Self::Config {
                source: ConfigError::MissingParameter(name),
            } if name.ends_with("_path") => -200,
            Self::Config { .. }
            | Self::Statistics { .. }
            | Self::Sampling { .. } => -300,
            Self::Export { .. } => -55,
            Self::PhaseFailed { .. } | Self::Internal(_) => -1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statistics_errors_map_to_distinct_codes() {
        let missing: EngineError = StatisticsError::MissingStatistics { phase: 1 }.into();
        let wrong: EngineError = StatisticsError::WrongKind {
            phase: 1,
            expected: "primary",
            found: "matrix",
        }
        .into();
        let other: EngineError = StatisticsError::NoPrimaryPhase.into();
        assert_eq!(missing.code(), -308);
        assert_eq!(wrong.code(), -666);
        assert_eq!(other.code(), -300);
    }

    #[test]
    fn missing_output_path_is_reported_separately() {
        let path: EngineError = ConfigError::MissingParameter("goal_attributes_path").into();
        let dims: EngineError = ConfigError::MissingParameter("dims").into();
        assert_eq!(path.code(), -200);
        assert_eq!(dims.code(), -300);
    }

    #[test]
    fn internal_failures_use_the_generic_code() {
        assert_eq!(EngineError::Internal("x".into()).code(), -1000);
        let failed = EngineError::PhaseFailed {
            phase: "Rasterizing",
            reason: "boom".into(),
        };
        assert_eq!(failed.code(), -1000);
        assert!(failed.to_string().contains("Rasterizing"));
    }
}
