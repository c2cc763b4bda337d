#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Once;

use command_runner::{Environment, Runner};
use tempfile::TempDir;
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// Logs are captured per test and only shown for failing ones. Enable
/// levels with e.g. `RUST_LOG=debug cargo test`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// A scratch directory that is put in front of the system `PATH`.
pub struct ScriptDir {
    dir: TempDir,
}

impl ScriptDir {
    pub fn new() -> Self {
        init_tracing();
        Self {
            dir: tempfile::tempdir().expect("create script dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a `/bin/sh` script called `name` with the given body.
    pub fn script(&self, name: &str, body: &str) -> PathBuf {
        self.file(name, &format!("#!/bin/sh\n{body}\n"), 0o755)
    }

    /// Write a file with an explicit mode, executable or not.
    pub fn file(&self, name: &str, contents: &str, mode: u32) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).expect("write script");
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).expect("chmod script");
        path
    }

    /// The captured process environment with this directory searched first.
    pub fn env(&self) -> Environment {
        let mut env = Environment::capture();
        let system = env
            .search_path()
            .map(|p| p.to_os_string())
            .unwrap_or_else(|| "/bin:/usr/bin".into());
        let mut dirs = vec![self.dir.path().to_path_buf()];
        dirs.extend(std::env::split_paths(&system));
        env.set_var("PATH", std::env::join_paths(dirs).expect("join PATH"));
        env
    }

    pub fn runner(&self) -> Runner {
        Runner::new(self.env())
    }
}
