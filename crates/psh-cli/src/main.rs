mod cli;
mod config;
mod error;
mod logging;
mod utils;

use crate::cli::Cli;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use clap::Parser;
use pshkohn::core::io::ReportDetail;
use pshkohn::engine::progress::ProgressReporter;
use pshkohn::workflows;
use std::io::{self, Write};
use tracing::{debug, error, info};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    if let Err(e) = run_app(cli) {
        error!("Run failed: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn run_app(cli: Cli) -> Result<()> {
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.clone())?;

    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default().into_hooks();
    eyre_hook.install().map_err(|e| CliError::Other(e.into()))?;
    std::panic::set_hook(Box::new(move |pi| {
        error!("{}", panic_hook.panic_report(pi));
    }));

    info!("pshkohn v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let config = config::build_config(&cli)?;
    info!(
        kappa = config.kappa,
        workers = config.execution.workers,
        threads_per_worker = ?config.execution.threads_per_worker,
        "Run configured."
    );

    let progress = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress.get_callback());
    let report = workflows::run(config.kappa, config.paths, &config.execution, &reporter)?;

    if config.echo_to_stdout {
        let mut stdout = io::stdout().lock();
        report.render(&mut stdout, ReportDetail::Summary)?;
        stdout.flush()?;
    }
    Ok(())
}
