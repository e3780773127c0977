use clap::Parser;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Kohn variational phase shifts for low-energy positronium-hydrogen scattering.",
    help_template = HELP_TEMPLATE,
)]
pub struct Cli {
    /// Positronium momentum in atomic units.
    #[arg(value_name = "KAPPA", value_parser = parse_kappa)]
    pub kappa: f64,

    /// Legacy parameter text file (quadrature sizes, shielding, cusp radii).
    #[arg(value_name = "PARAMETERFILE")]
    pub parameter_file: PathBuf,

    /// Binary short-range matrix file with its 80-byte header.
    #[arg(value_name = "SHORTRANGEFILE")]
    pub short_range_file: PathBuf,

    /// Report file, overwritten on every run.
    #[arg(value_name = "OUTFILE")]
    pub output_file: PathBuf,

    /// Write logs to this file in addition to the console output.
    #[arg(value_name = "LOGFILE")]
    pub log_file: Option<PathBuf>,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all log output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Number of ranks the basis is split across.
    #[arg(short, long, value_name = "NUM")]
    pub workers: Option<usize>,

    /// Threads in each rank's pool.
    /// Defaults to the available cores divided by the number of ranks.
    #[arg(short = 'j', long, value_name = "NUM")]
    pub threads: Option<usize>,

    /// Run settings in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

fn parse_kappa(value: &str) -> Result<f64, String> {
    let kappa: f64 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if !kappa.is_finite() || kappa <= 0.0 {
        return Err(format!("kappa must be a positive finite number, got {value}"));
    }
    Ok(kappa)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn positional_arguments_parse_in_order() {
        let cli = Cli::try_parse_from([
            "pshkohn", "0.25", "params.txt", "short.bin", "out.txt", "run.log",
        ])
        .unwrap();
        assert_eq!(cli.kappa, 0.25);
        assert_eq!(cli.parameter_file, PathBuf::from("params.txt"));
        assert_eq!(cli.short_range_file, PathBuf::from("short.bin"));
        assert_eq!(cli.output_file, PathBuf::from("out.txt"));
        assert_eq!(cli.log_file, Some(PathBuf::from("run.log")));
        assert_eq!(cli.verbose, 0);
        assert!(cli.workers.is_none());
    }

    #[test]
    fn execution_flags_are_optional_overrides() {
        let cli = Cli::try_parse_from([
            "pshkohn", "-vv", "-w", "4", "-j", "2", "-c", "run.toml", "0.1", "p", "s", "o",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.workers, Some(4));
        assert_eq!(cli.threads, Some(2));
        assert_eq!(cli.config, Some(PathBuf::from("run.toml")));
        assert!(cli.log_file.is_none());
    }

    #[test]
    fn too_few_arguments_are_rejected() {
        let err = Cli::try_parse_from(["pshkohn", "0.25", "params.txt"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert!(err.use_stderr());
    }

    #[test]
    fn non_positive_kappa_is_rejected() {
        for bad in ["0", "-0.5", "nan", "abc"] {
            let result = Cli::try_parse_from(["pshkohn", "--", bad, "p", "s", "o"]);
            assert!(result.is_err(), "kappa {bad} should be rejected");
        }
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let err = Cli::try_parse_from(["pshkohn", "-q", "-v", "0.1", "p", "s", "o"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn help_is_not_an_error_stream() {
        let err = Cli::try_parse_from(["pshkohn", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert!(!err.use_stderr());
    }
}
