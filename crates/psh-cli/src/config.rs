use crate::cli::Cli;
use crate::error::{CliError, Result};
use anyhow::Context;
use pshkohn::engine::config::ExecutionConfig;
use pshkohn::workflows::RunPaths;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

const DEFAULT_ECHO_TO_STDOUT: bool = true;

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct FileExecutionConfig {
    workers: Option<usize>,
    threads_per_worker: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct FileReportConfig {
    echo_to_stdout: Option<bool>,
}

/// Optional TOML run settings. Every field may be absent.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct RunSettings {
    execution: Option<FileExecutionConfig>,
    report: Option<FileReportConfig>,
}

impl RunSettings {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading run settings from file: {:?}", path);
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read run settings from '{}'", path.display()))?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}

/// Everything the binary needs once flags, file and defaults are merged.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub kappa: f64,
    pub paths: RunPaths,
    pub execution: ExecutionConfig,
    pub echo_to_stdout: bool,
}

/// Command-line flags win over the settings file, which wins over the defaults.
pub fn build_config(cli: &Cli) -> Result<AppConfig> {
    let settings = match &cli.config {
        Some(path) => RunSettings::from_file(path)?,
        None => RunSettings::default(),
    };
    merge(cli, settings)
}

fn merge(cli: &Cli, settings: RunSettings) -> Result<AppConfig> {
    let defaults = ExecutionConfig::default();
    let execution_file = settings.execution.unwrap_or_default();
    let report_file = settings.report.unwrap_or_default();

    let execution = ExecutionConfig {
        workers: cli
            .workers
            .or(execution_file.workers)
            .unwrap_or(defaults.workers),
        threads_per_worker: cli
            .threads
            .or(execution_file.threads_per_worker)
            .or(defaults.threads_per_worker),
    };
    execution
        .validate()
        .map_err(|e| CliError::Config(e.to_string()))?;

    Ok(AppConfig {
        kappa: cli.kappa,
        paths: RunPaths {
            parameter_file: cli.parameter_file.clone(),
            short_range_file: cli.short_range_file.clone(),
            output_file: cli.output_file.clone(),
        },
        execution,
        echo_to_stdout: report_file
            .echo_to_stdout
            .unwrap_or(DEFAULT_ECHO_TO_STDOUT),
    })
}
