use std::io::{self, Read};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::sync::PoisonError;
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::command::{ExitCode, SharedWriter, Source, Wiring};
use crate::descriptor::{Directive, ProcessDescriptor};
use crate::env::Environment;
use crate::errors::{Error, ExecutionFailure, Result};
use crate::external::resolve;

/// Launches external commands against a fixed [`Environment`].
///
/// The environment supplies both the `PATH` used for resolution and the
/// variables every child inherits. `Runner::default()` captures the current
/// process environment; tests can inject their own with [`Runner::new`].
///
/// Example
/// ```no_run
/// use command_runner::{Runner, MemWriter, with_args, with_stdout};
///
/// let (out, handle) = MemWriter::with_handle();
/// Runner::default()
///     .run("echo", [with_args(["hello", "world"]), with_stdout(out)])
///     .unwrap();
/// assert_eq!(handle.contents(), "hello world\n");
/// ```
#[derive(Debug, Clone)]
pub struct Runner {
    env: Environment,
}

impl Runner {
    pub fn new(env: Environment) -> Self {
        Self { env }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Resolve `name` and apply `directives` in order, without starting
    /// anything.
    ///
    /// Fails only with [`Error::CommandNotFound`].
    pub fn prepare<I>(&self, name: &str, directives: I) -> Result<ProcessDescriptor>
    where
        I: IntoIterator<Item = Directive>,
    {
        let program = resolve(&self.env, name)?;
        let mut desc = ProcessDescriptor::new(name, program, self.env.clone());
        desc.apply_all(directives);
        Ok(desc)
    }

    /// Run a single command by name and wait for it to exit.
    ///
    /// Returns `Ok(())` only if the process exited successfully.
    pub fn run<I>(&self, name: &str, directives: I) -> Result<()>
    where
        I: IntoIterator<Item = Directive>,
    {
        self.prepare(name, directives)?.run()
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(Environment::capture())
    }
}

/// Run `name` with the current process environment.
///
/// Shorthand for `Runner::default().run(name, directives)`.
pub fn run_command<I>(name: &str, directives: I) -> Result<()>
where
    I: IntoIterator<Item = Directive>,
{
    Runner::default().run(name, directives)
}

impl ProcessDescriptor {
    /// Start the process, wait for it to exit and report the outcome.
    ///
    /// Any output already written to the configured sinks stays there,
    /// whatever the outcome.
    pub fn run(self) -> Result<()> {
        let ProcessDescriptor {
            name,
            program,
            args,
            stdin,
            stdout,
            stderr,
            env_overlay,
            base_env,
        } = self;
        let fail = |failure| Error::failed(name.as_str(), failure);

        let mut cmd = Command::new(&program);
        if let Some(args) = &args {
            cmd.args(args);
        }
        // Later entries for a repeated key replace earlier ones here.
        cmd.env_clear()
            .envs(&base_env.vars)
            .envs(env_overlay.iter().map(|(k, v)| (k, v)));
        if let Some(dir) = &base_env.current_dir {
            cmd.current_dir(dir);
        }

        let stdin_feed = wire_input(&mut cmd, stdin);
        let stdout_wiring = stdout
            .wire()
            .map_err(|e| fail(ExecutionFailure::Spawn(e)))?;
        let stdout_sink = attach(stdout_wiring, |s| {
            cmd.stdout(s);
        });
        let stderr_wiring = stderr
            .wire()
            .map_err(|e| fail(ExecutionFailure::Spawn(e)))?;
        let stderr_sink = attach(stderr_wiring, |s| {
            cmd.stderr(s);
        });

        debug!(
            command = %name,
            program = %program.display(),
            args = ?args.as_deref().unwrap_or_default(),
            overlay = env_overlay.len(),
            "spawning process"
        );
        let mut child = cmd
            .spawn()
            .map_err(|e| fail(ExecutionFailure::Spawn(e)))?;

        let pumps = start_pumps(&mut child, stdin_feed, stdout_sink, stderr_sink);

        let status = child.wait();
        if status.is_err() {
            let _ = child.kill();
        }
        let streamed = join_pumps(pumps);

        let status = status.map_err(|e| fail(ExecutionFailure::Wait(e)))?;
        debug!(command = %name, %status, "process exited");
        if !status.success() {
            return Err(fail(ExecutionFailure::Exit(exit_code(status))));
        }
        streamed.map_err(|e| {
            warn!(command = %name, error = %e, "failed to transfer process stream");
            fail(ExecutionFailure::Stream(e))
        })
    }
}

fn wire_input(cmd: &mut Command, stdin: Source) -> Option<Box<dyn Read + Send>> {
    match stdin.wire() {
        Wiring::Direct(stdio) => {
            cmd.stdin(stdio);
            None
        }
        Wiring::Pumped(reader) => {
            cmd.stdin(Stdio::piped());
            Some(reader)
        }
    }
}

/// Hand the child-side end to `set`, keeping the writer when a pipe is
/// needed.
fn attach(wiring: Wiring<SharedWriter>, set: impl FnOnce(Stdio)) -> Option<SharedWriter> {
    match wiring {
        Wiring::Direct(stdio) => {
            set(stdio);
            None
        }
        Wiring::Pumped(writer) => {
            set(Stdio::piped());
            Some(writer)
        }
    }
}

fn start_pumps(
    child: &mut Child,
    stdin_feed: Option<Box<dyn Read + Send>>,
    stdout_sink: Option<SharedWriter>,
    stderr_sink: Option<SharedWriter>,
) -> Vec<JoinHandle<io::Result<()>>> {
    let mut pumps = Vec::new();
    if let (Some(reader), Some(pipe)) = (stdin_feed, child.stdin.take()) {
        pumps.push(thread::spawn(move || feed(reader, pipe)));
    }
    if let (Some(writer), Some(pipe)) = (stdout_sink, child.stdout.take()) {
        pumps.push(thread::spawn(move || drain(pipe, writer)));
    }
    if let (Some(writer), Some(pipe)) = (stderr_sink, child.stderr.take()) {
        pumps.push(thread::spawn(move || drain(pipe, writer)));
    }
    pumps
}

/// Copy the caller's reader into the child. The pipe closes on return.
fn feed(mut reader: Box<dyn Read + Send>, mut pipe: ChildStdin) -> io::Result<()> {
    match io::copy(&mut reader, &mut pipe) {
        Ok(_) => Ok(()),
        // The child is free to exit without reading all of its input.
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        Err(e) => Err(e),
    }
}

/// Copy one child stream into a sink until EOF.
///
/// The sink is locked per chunk so that two streams sharing it never
/// interleave inside a single write.
fn drain(mut pipe: impl Read, writer: SharedWriter) -> io::Result<()> {
    let mut buf = [0u8; 8192];
    loop {
        let n = match pipe.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        let mut sink = writer.lock().unwrap_or_else(PoisonError::into_inner);
        sink.write_all(&buf[..n])?;
    }
    writer
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .flush()
}

/// Wait for every pump and keep the first error.
fn join_pumps(pumps: Vec<JoinHandle<io::Result<()>>>) -> io::Result<()> {
    let mut first_err = None;
    for pump in pumps {
        let res = pump
            .join()
            .unwrap_or_else(|_| Err(io::Error::other("stream pump panicked")));
        if let Err(e) = res {
            if first_err.is_none() {
                first_err = Some(e);
            }
        }
    }
    first_err.map_or(Ok(()), Err)
}

fn exit_code(status: ExitStatus) -> ExitCode {
    match status.code() {
        Some(x) => x,
        None => terminated_by_signal(status),
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> ExitCode {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> ExitCode {
    -1
}
