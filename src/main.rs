mod cli;
mod config;
mod default_option;
mod error;
mod local_params;
mod logging;
mod mesh;
mod orchestrator;
mod reference;
mod services;
mod state_machine;
mod timer;
mod ui;

use std::process::ExitCode;

use clap::Parser;
use cli::Cli;
use config::SurfadaptConfig;
use orchestrator::JobOrchestrator;
use reference::ReferenceBackend;
use state_machine::ResultStatus;
use timer::Timer;
use ui::JobProgress;

fn main() -> ExitCode {
    let mut timer = Timer::started();
    let cli = Cli::parse();

    let status = match run(cli) {
        Ok(status) => status,
        Err(e) => {
            eprintln!("  ## ERROR: {e:#}");
            ResultStatus::StrongFailure
        }
    };

    timer.stop();
    ui::print_elapsed(timer.formatted());
    status.into()
}

fn run(cli: Cli) -> anyhow::Result<ResultStatus> {
    let config = SurfadaptConfig::load(cli.config.as_deref())?;
    let verbosity = cli.verbosity(&config);
    logging::init(verbosity);

    std::panic::set_hook(Box::new(|info| {
        tracing::error!("  ## UNEXPECTED FAULT: {info}");
    }));

    let print_report = cli.report || config.report;
    let job_config = cli.into_job_config(&config);
    let input = job_config.mesh_in.display().to_string();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "  -- SURFADAPT");

    // the spinner only shows when logs stay out of the way
    let progress = JobProgress::start(&input, verbosity != 0);
    let report = JobOrchestrator::new(ReferenceBackend)
        .run_job_with(job_config, |stage| progress.update_stage(stage));

    progress.complete(report.status);
    if print_report {
        progress.print_report(&report);
    }
    Ok(report.status)
}
