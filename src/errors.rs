//! Error types returned by [`run_command`](crate::run_command).
//!
//! There are exactly two kinds of failure a caller has to tell apart:
//! the executable could not be resolved ([`Error::CommandNotFound`]), or it
//! was resolved but running it did not succeed ([`Error::ExecutionFailed`]).

use std::io;

use thiserror::Error;

use crate::command::ExitCode;

#[derive(Error, Debug)]
pub enum Error {
    /// The executable was not found on the search path, or the file found
    /// there is not executable. Raised before anything is spawned.
    #[error("command not found: {name}")]
    CommandNotFound { name: String },

    /// The executable was resolved but did not run to a successful exit.
    #[error("command '{command}' failed")]
    ExecutionFailed {
        command: String,
        #[source]
        failure: ExecutionFailure,
    },
}

/// What went wrong after resolution succeeded.
#[derive(Error, Debug)]
pub enum ExecutionFailure {
    #[error("failed to start process")]
    Spawn(#[source] io::Error),

    #[error("failed to wait for process")]
    Wait(#[source] io::Error),

    #[error("failed to transfer process stream")]
    Stream(#[source] io::Error),

    /// Non-zero exit. Death by signal is reported as `128 + signal`.
    #[error("exited with status {0}")]
    Exit(ExitCode),
}

impl Error {
    pub(crate) fn not_found(name: impl Into<String>) -> Self {
        Error::CommandNotFound { name: name.into() }
    }

    pub(crate) fn failed(command: impl Into<String>, failure: ExecutionFailure) -> Self {
        Error::ExecutionFailed {
            command: command.into(),
            failure,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::CommandNotFound { .. })
    }

    /// Exit code of the child, if it ran and exited unsuccessfully.
    pub fn exit_code(&self) -> Option<ExitCode> {
        match self {
            Error::ExecutionFailed {
                failure: ExecutionFailure::Exit(code),
                ..
            } => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
