//! Input and output file formats.

pub mod params;
pub mod report;
pub mod short_range;

pub use params::{ParamFileError, ParameterFile};
pub use report::{ReportDetail, ScatteringReport, Timestamp};
pub use short_range::{ShortRangeBlock, ShortRangeError, ShortRangeHeader};

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while opening or reading the files of a run, each mapped to a process exit code.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("could not open parameter file '{path}'")]
    ParamFileOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid parameter file '{path}'")]
    ParamFile {
        path: PathBuf,
        #[source]
        source: ParamFileError,
    },
    #[error("could not open output file '{path}'")]
    OutputOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unable to open file '{path}' for reading")]
    ShortRangeOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("'{path}' is not a valid Ps-H short-range file")]
    ShortRange {
        path: PathBuf,
        #[source]
        source: ShortRangeError,
    },
    #[error("failed to write report to '{path}'")]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl InputError {
    pub fn exit_code(&self) -> i32 {
        match self {
            InputError::ParamFileOpen { .. } | InputError::ParamFile { .. } => 3,
            InputError::OutputOpen { .. } | InputError::ReportWrite { .. } => 4,
            InputError::ShortRangeOpen { .. } => 2,
            InputError::ShortRange { source, .. } => match source {
                ShortRangeError::InvalidTriplet(_) => 6,
                _ => 3,
            },
        }
    }
}
