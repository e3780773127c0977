use pshkohn::engine::error::EngineError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] EngineError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Engine failures keep their own codes; everything raised by the CLI layer is an
    /// argument problem.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Core(e) => e.exit_code(),
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pshkohn::engine::config::ConfigError;

    #[test]
    fn engine_errors_keep_their_exit_codes() {
        let err = CliError::from(EngineError::from(ConfigError::MissingParameter("kappa")));
        assert_eq!(err.exit_code(), 3);

        let err = CliError::from(EngineError::Internal("solve".to_string()));
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn cli_layer_errors_exit_with_one() {
        assert_eq!(CliError::Argument("x".to_string()).exit_code(), 1);
        assert_eq!(CliError::Config("x".to_string()).exit_code(), 1);
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(CliError::from(io).exit_code(), 1);
    }
}
