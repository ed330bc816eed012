//! CLI-level errors (wraps application errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::exitcode;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => exitcode::USAGE,
            CliError::Application(e) => match e {
                ApplicationError::Domain(DomainError::MissingResourceName { .. }) => {
                    exitcode::DATAERR
                }
                ApplicationError::Domain(DomainError::Invariant(_)) => exitcode::SOFTWARE,
                ApplicationError::Config { .. } => exitcode::CONFIG,
                ApplicationError::OperationFailed { source, .. } => io_exit_code(source.as_ref()),
            },
        }
    }
}

fn io_exit_code(source: &(dyn std::error::Error + Send + Sync + 'static)) -> i32 {
    match source.downcast_ref::<std::io::Error>() {
        Some(e) if e.kind() == std::io::ErrorKind::NotFound => exitcode::NOINPUT,
        Some(e) if e.kind() == std::io::ErrorKind::InvalidData => exitcode::DATAERR,
        Some(_) => exitcode::IOERR,
        None => exitcode::SOFTWARE,
    }
}
