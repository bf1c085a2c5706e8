use crate::cli::PackArgs;
use crate::config::builder::build_config;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use grainpack::{
    core::io::{statistics::load_statistics, vtk::write_microstructure},
    engine::{cancel::CancellationToken, progress::ProgressReporter},
    workflows::pack::{self, PackingOutcome, PackingStatus},
};
use tracing::{info, warn};

pub fn run(args: PackArgs) -> Result<()> {
    info!("Merging configuration from defaults, file and CLI arguments...");
    let app = build_config(&args)?;

    info!("Loading phase statistics from {:?}", &app.statistics_path);
    let statistics =
        load_statistics(&app.statistics_path).map_err(|e| CliError::FileParsing {
            path: app.statistics_path.clone(),
            source: e.into(),
        })?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let cancel = CancellationToken::new();

    println!("Starting grain packing...");
    let outcome = pack::run(&statistics, &app.core_config, &reporter, &cancel)?;
    report_outcome(&outcome);

    if let PackingStatus::Failed { code, reason } = outcome.status {
        return Err(CliError::Packing { code, reason });
    }

    let domain = app.core_config.domain();
    write_microstructure(&app.output_path, &domain, &outcome.field)
        .map_err(grainpack::engine::error::EngineError::from)?;
    println!("✓ Microstructure written to: {}", app.output_path.display());
    Ok(())
}

fn report_outcome(outcome: &PackingOutcome) {
    let report = &outcome.report;
    info!(
        generated = report.generated_grains,
        filling_error = report.filling_error,
        moves_accepted = report.moves_accepted,
        gap_fill_passes = report.gap_fill_passes,
        "Packing finished."
    );
    match &outcome.status {
        PackingStatus::Complete => println!(
            "Packing complete: {} grain(s) from {} generated, {} voxel(s) cleaned up.",
            outcome.grains.len(),
            report.generated_grains,
            report.voxels_cleaned
        ),
        PackingStatus::Cancelled { stage } => {
            warn!(stage, "Writing a partial microstructure.");
            println!("Packing cancelled during {}; the output is incomplete.", stage);
        }
        PackingStatus::Failed { code, reason } => {
            println!("Packing failed with status {}: {}", code, reason);
        }
    }
}
