use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use argh::{EarlyExit, FromArgs};
use command_runner::logging::init_logging;
use command_runner::{
    Error, Sink, run_command, with_args, with_env, with_out_err, with_stdin, with_stdout,
};

/// Exit code used when the command cannot be found, as shells do.
const NOT_FOUND_EXIT: u8 = 127;

/// Our options that consume the argument after them.
const VALUE_OPTIONS: &[&str] = &["--env", "-e", "--stdin-file", "--stdout-file", "--log-level"];

#[derive(FromArgs)]
/// Run one command found on PATH and wait for it to finish.
/// Everything after the command name is passed to it unchanged.
struct Args {
    /// extra environment variable as KEY=VALUE; may be repeated
    #[argh(option, short = 'e')]
    env: Vec<String>,

    /// file to read the command's standard input from
    #[argh(option)]
    stdin_file: Option<PathBuf>,

    /// file to write the command's standard output to (truncated first)
    #[argh(option)]
    stdout_file: Option<PathBuf>,

    /// send standard error to the same place as standard output
    #[argh(switch)]
    merge_stderr: bool,

    /// log level: error, warn, info, debug or trace
    #[argh(option)]
    log_level: Option<String>,

    /// name of the command to run, followed by its arguments
    #[argh(positional)]
    command: String,
}

fn main() -> ExitCode {
    let argv: Vec<String> = std::env::args().collect();
    let program = argv.first().map(String::as_str).unwrap_or("run_command");
    let (ours, child_args) = split_command_line(argv.get(1..).unwrap_or_default());
    let ours: Vec<&str> = ours.iter().map(String::as_str).collect();

    let args = match Args::from_args(&[program], &ours) {
        Ok(args) => args,
        Err(EarlyExit { output, status }) => {
            return match status {
                Ok(()) => {
                    println!("{output}");
                    ExitCode::SUCCESS
                }
                Err(()) => {
                    eprintln!("{output}\nRun {program} --help for more information.");
                    ExitCode::FAILURE
                }
            };
        }
    };

    match run(args, child_args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("run_command: {err:#}");
            exit_code_for(&err)
        }
    }
}

/// Split the command line right after the command name.
///
/// The first part is parsed as our own flags; the rest goes to the child
/// verbatim, dashes included. A `--` ends our flags early, so a command
/// whose name starts with `-` can still be run.
fn split_command_line(argv: &[String]) -> (&[String], &[String]) {
    let mut i = 0;
    while i < argv.len() {
        let arg = argv[i].as_str();
        if arg == "--" {
            i += 1;
            break;
        }
        if VALUE_OPTIONS.contains(&arg) {
            i += 2;
        } else if arg.starts_with('-') {
            i += 1;
        } else {
            break;
        }
    }
    argv.split_at((i + 1).min(argv.len()))
}

fn run(args: Args, child_args: &[String]) -> Result<()> {
    init_logging(args.log_level.as_deref())?;

    let mut directives = Vec::new();
    for pair in &args.env {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("--env expects KEY=VALUE, got '{pair}'"))?;
        directives.push(with_env(key, value));
    }

    if let Some(path) = &args.stdin_file {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        directives.push(with_stdin(file));
    }

    let stdout = match &args.stdout_file {
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("creating {}", path.display()))?;
            Sink::file(file)
        }
        None => Sink::inherit(),
    };
    if args.merge_stderr {
        directives.push(with_out_err(stdout));
    } else {
        directives.push(with_stdout(stdout));
    }

    if !child_args.is_empty() {
        directives.push(with_args(child_args));
    }

    run_command(&args.command, directives)?;
    Ok(())
}

fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<Error>() {
        Some(e) if e.is_not_found() => ExitCode::from(NOT_FOUND_EXIT),
        Some(e) => e
            .exit_code()
            .and_then(|code| u8::try_from(code).ok())
            .filter(|&code| code != 0)
            .map_or(ExitCode::FAILURE, ExitCode::from),
        None => ExitCode::FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_split_keeps_child_flags_for_child() {
        let args = argv(&["--env", "A=1", "--merge-stderr", "ls", "-d", "/", "--env", "x"]);
        let (ours, child) = split_command_line(&args);
        assert_eq!(ours, &argv(&["--env", "A=1", "--merge-stderr", "ls"])[..]);
        assert_eq!(child, &argv(&["-d", "/", "--env", "x"])[..]);
    }

    #[test]
    fn test_split_after_double_dash() {
        let args = argv(&["-e", "A=1", "--", "-weird-name", "-x"]);
        let (ours, child) = split_command_line(&args);
        assert_eq!(ours, &argv(&["-e", "A=1", "--", "-weird-name"])[..]);
        assert_eq!(child, &argv(&["-x"])[..]);
    }

    #[test]
    fn test_split_without_command() {
        let args = argv(&["--log-level", "debug"]);
        let (ours, child) = split_command_line(&args);
        assert_eq!(ours.len(), 2);
        assert!(child.is_empty());
    }

    #[test]
    fn test_parsed_args_take_only_the_command() {
        let args = argv(&["--stdout-file", "out.log", "sh", "-c", "exit 5"]);
        let (ours, child) = split_command_line(&args);
        let ours: Vec<&str> = ours.iter().map(String::as_str).collect();
        let parsed = Args::from_args(&["run_command"], &ours).unwrap();
        assert_eq!(parsed.command, "sh");
        assert_eq!(parsed.stdout_file, Some(PathBuf::from("out.log")));
        assert_eq!(child, &argv(&["-c", "exit 5"])[..]);
    }
}
