use super::cancel::CancellationToken;
use super::config::PackingConfig;
use super::progress::ProgressReporter;
use super::scoring::PhaseTargets;
use crate::core::models::domain::Domain;
use crate::core::models::statistics::PrimaryPhase;

/// Read-only inputs shared by every packing task.
#[derive(Clone, Copy)]
pub struct PackingContext<'a> {
    pub domain: Domain,
    pub config: &'a PackingConfig,
    pub phases: &'a [PrimaryPhase<'a>],
    pub targets: &'a [PhaseTargets<'a>],
    pub reporter: &'a ProgressReporter<'a>,
    pub cancel: &'a CancellationToken,
}

impl<'a> PackingContext<'a> {
    pub fn new(
        config: &'a PackingConfig,
        phases: &'a [PrimaryPhase<'a>],
        targets: &'a [PhaseTargets<'a>],
        reporter: &'a ProgressReporter<'a>,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            domain: config.domain(),
            config,
            phases,
            targets,
            reporter,
            cancel,
        }
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
