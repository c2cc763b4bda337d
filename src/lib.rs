//! A small helper for launching one external process and waiting for it.
//!
//! A command is named by its bare executable name and configured with an
//! ordered list of [`Directive`]s: where its standard streams go, extra
//! environment variables, and its arguments. The name is resolved on the
//! search path first; a missing executable is reported as
//! [`Error::CommandNotFound`] before anything is spawned, while a process that
//! starts but does not exit successfully is reported as
//! [`Error::ExecutionFailed`].
//!
//! ```no_run
//! use command_runner::{run_command, with_args, with_env, with_out_err, MemWriter};
//!
//! let (log, handle) = MemWriter::with_handle();
//! run_command(
//!     "make",
//!     [with_args(["-C", "build"]), with_env("CC", "clang"), with_out_err(log)],
//! )?;
//! print!("{}", handle.contents());
//! # Ok::<(), command_runner::Error>(())
//! ```
//!
//! The inherited environment is an explicit [`Environment`] value held by a
//! [`Runner`]; [`run_command`] simply captures the current one.

pub mod command;
pub mod descriptor;
pub mod env;
pub mod errors;
pub mod external;
mod io_adapters;
pub mod logging;
mod runner;

pub use command::{ExitCode, Sink, Source};
pub use descriptor::{
    Directive, ProcessDescriptor, with_args, with_env, with_out_err, with_stderr, with_stdin,
    with_stdout,
};
pub use env::Environment;
pub use errors::{Error, ExecutionFailure, Result};
pub use external::resolve;
pub use io_adapters::{MemHandle, MemReader, MemWriter};
pub use runner::{Runner, run_command};
