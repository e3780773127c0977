use thiserror::Error;

use super::config::ConfigError;
use crate::core::io::InputError;
use crate::core::kohn::KohnError;
use crate::core::quadrature::QuadratureError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{source}")]
    Input {
        #[from]
        source: InputError,
    },

    #[error("Quadrature rule construction failed: {source}")]
    Quadrature {
        #[from]
        source: QuadratureError,
    },

    #[error("Phase-shift extraction failed: {source}")]
    Kohn {
        #[from]
        source: KohnError,
    },

    #[error("Invalid run configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Rank {rank} lost its peer while waiting for {expected}")]
    Transport { rank: usize, expected: &'static str },

    #[error("Rank {rank} returned a {what} block of {found} entries, expected {expected}")]
    BlockShape {
        rank: usize,
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Failed to build the thread pool of rank {rank}: {message}")]
    ThreadPool { rank: usize, message: String },

    #[error("Internal logic error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Process exit code for a run that failed with this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            EngineError::Input { source } => source.exit_code(),
            EngineError::Config { .. } => 3,
            _ => 5,
        }
    }
}
