//! The not-yet-started process and the directives that configure it.
//!
//! Directives are plain values applied left to right. Each one touches only
//! its own fields, so the last directive touching a field wins. The one
//! exception is [`with_env`]: it appends to the overlay and never replaces
//! an earlier entry, even one with the same key.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::command::{Sink, Source};
use crate::env::Environment;

/// One external process, resolved and configured but not started.
///
/// Built by [`Runner::prepare`](crate::Runner::prepare) and consumed by
/// [`ProcessDescriptor::run`].
#[derive(Debug)]
pub struct ProcessDescriptor {
    pub(crate) name: String,
    pub(crate) program: PathBuf,
    pub(crate) args: Option<Vec<OsString>>,
    pub(crate) stdin: Source,
    pub(crate) stdout: Sink,
    pub(crate) stderr: Sink,
    pub(crate) env_overlay: Vec<(OsString, OsString)>,
    pub(crate) base_env: Environment,
}

impl ProcessDescriptor {
    pub(crate) fn new(name: impl Into<String>, program: PathBuf, base_env: Environment) -> Self {
        Self {
            name: name.into(),
            program,
            args: None,
            stdin: Source::default(),
            stdout: Sink::default(),
            stderr: Sink::default(),
            env_overlay: Vec::new(),
            base_env,
        }
    }

    pub(crate) fn apply_all(&mut self, directives: impl IntoIterator<Item = Directive>) {
        for directive in directives {
            directive.apply(self);
        }
    }

    /// The name the command was requested by.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved location of the executable.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments passed to the child; empty unless [`with_args`] was applied.
    pub fn args(&self) -> &[OsString] {
        self.args.as_deref().unwrap_or_default()
    }

    /// Variables appended on top of the inherited environment, in order.
    pub fn env_overlay(&self) -> &[(OsString, OsString)] {
        &self.env_overlay
    }

    pub fn stdout(&self) -> &Sink {
        &self.stdout
    }

    pub fn stderr(&self) -> &Sink {
        &self.stderr
    }

    /// The environment the child starts from, before the overlay.
    pub fn base_env(&self) -> &Environment {
        &self.base_env
    }
}

/// A deferred change to a [`ProcessDescriptor`].
#[derive(Debug)]
pub enum Directive {
    Stdin(Source),
    Stdout(Sink),
    Stderr(Sink),
    /// Stdout and stderr bound to one sink.
    OutErr(Sink),
    Env(OsString, OsString),
    Args(Vec<OsString>),
}

impl Directive {
    pub(crate) fn apply(self, desc: &mut ProcessDescriptor) {
        trace!(command = %desc.name, directive = ?self, "applying directive");
        match self {
            Directive::Stdin(source) => desc.stdin = source,
            Directive::Stdout(sink) => desc.stdout = sink,
            Directive::Stderr(sink) => desc.stderr = sink,
            Directive::OutErr(sink) => {
                desc.stdout = sink.clone();
                desc.stderr = sink;
            }
            Directive::Env(key, value) => desc.env_overlay.push((key, value)),
            Directive::Args(args) => desc.args = Some(args),
        }
    }
}

pub fn with_stdin(source: impl Into<Source>) -> Directive {
    Directive::Stdin(source.into())
}

pub fn with_stdout(sink: impl Into<Sink>) -> Directive {
    Directive::Stdout(sink.into())
}

pub fn with_stderr(sink: impl Into<Sink>) -> Directive {
    Directive::Stderr(sink.into())
}

/// Send both stdout and stderr to `sink`.
pub fn with_out_err(sink: impl Into<Sink>) -> Directive {
    Directive::OutErr(sink.into())
}

/// Append `key=value` to the child's environment.
///
/// Repeating a key keeps every entry in the overlay; when the process is
/// started, the entry appended last is the one the child sees.
pub fn with_env(key: impl Into<OsString>, value: impl Into<OsString>) -> Directive {
    Directive::Env(key.into(), value.into())
}

/// Replace the argument list.
pub fn with_args<I, S>(args: I) -> Directive
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    Directive::Args(
        args.into_iter()
            .map(|arg| arg.as_ref().to_os_string())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io_adapters::MemWriter;

    fn descriptor() -> ProcessDescriptor {
        ProcessDescriptor::new("tool", PathBuf::from("/bin/tool"), Environment::default())
    }

    #[test]
    fn test_no_directives_means_defaults() {
        let desc = descriptor();
        assert!(desc.args().is_empty());
        assert!(desc.args.is_none());
        assert!(desc.env_overlay().is_empty());
        assert!(matches!(desc.stdin, Source::Inherit));
        assert!(matches!(desc.stdout, Sink::Inherit));
        assert!(matches!(desc.stderr, Sink::Inherit));
    }

    #[test]
    fn test_args_replace_wholesale() {
        let mut desc = descriptor();
        desc.apply_all([with_args(["x", "y"]), with_args(["a", "b", "c"])]);
        assert_eq!(desc.args(), &["a", "b", "c"].map(OsString::from));
    }

    #[test]
    fn test_empty_args_directive_is_recorded() {
        let mut desc = descriptor();
        desc.apply_all([with_args(Vec::<String>::new())]);
        assert_eq!(desc.args.as_deref(), Some(&[][..]));
    }

    #[test]
    fn test_env_appends_without_dedup() {
        let mut desc = descriptor();
        desc.apply_all([with_env("X", "1"), with_env("X", "2")]);
        assert_eq!(
            desc.env_overlay(),
            &[
                (OsString::from("X"), OsString::from("1")),
                (OsString::from("X"), OsString::from("2")),
            ]
        );
    }

    #[test]
    fn test_out_err_then_stderr_overrides_stderr_only() {
        let combined = Sink::from(MemWriter::new());
        let errors = Sink::from(MemWriter::new());

        let mut desc = descriptor();
        desc.apply_all([with_out_err(combined.clone()), with_stderr(errors.clone())]);

        assert!(desc.stdout().same_destination(&combined));
        assert!(desc.stderr().same_destination(&errors));
    }

    #[test]
    fn test_stderr_then_out_err_overrides_both() {
        let combined = Sink::from(MemWriter::new());
        let errors = Sink::from(MemWriter::new());

        let mut desc = descriptor();
        desc.apply_all([with_stderr(errors), with_out_err(combined.clone())]);

        assert!(desc.stdout().same_destination(&combined));
        assert!(desc.stderr().same_destination(&combined));
    }

    #[test]
    fn test_later_stdout_wins() {
        let first = Sink::from(MemWriter::new());
        let mut desc = descriptor();
        desc.apply_all([with_stdout(first), with_stdout(Sink::null())]);
        assert!(matches!(desc.stdout(), Sink::Null));
    }
}
