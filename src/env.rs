use std::collections::HashMap;
use std::env as stdenv;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

/// Snapshot of the environment a child process inherits.
///
/// The runner never reads the ambient process environment on its own: it is
/// captured once into an `Environment` (see [`Environment::capture`]) or
/// built by hand, which lets tests run against a controlled `PATH` and
/// variable set.
///
/// The environment contains:
/// - `vars`: variables every child starts with, before any overlay.
/// - `current_dir`: working directory for children; `None` inherits ours.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    pub vars: HashMap<OsString, OsString>,
    pub current_dir: Option<PathBuf>,
}

impl Environment {
    /// Capture the current process environment.
    ///
    /// This copies variables from `std::env::vars_os()`. The working
    /// directory is left unset so that children inherit it.
    pub fn capture() -> Self {
        Self::from_vars(stdenv::vars_os())
    }

    /// Environment with exactly the given variables.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            current_dir: None,
        }
    }

    pub fn get_var(&self, key: impl AsRef<OsStr>) -> Option<&OsStr> {
        self.vars.get(key.as_ref()).map(OsString::as_os_str)
    }

    /// Set or override a variable.
    pub fn set_var(&mut self, key: impl Into<OsString>, val: impl Into<OsString>) {
        self.vars.insert(key.into(), val.into());
    }

    pub fn remove_var(&mut self, key: impl AsRef<OsStr>) -> Option<OsString> {
        self.vars.remove(key.as_ref())
    }

    /// The directories searched for bare command names.
    pub fn search_path(&self) -> Option<&OsStr> {
        self.get_var("PATH")
    }

    pub fn with_current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use crate::env::Environment;
    use std::ffi::OsStr;

    #[test]
    fn test_env_set_and_get_var() {
        let mut env = Environment::default();

        // initially absent
        assert_eq!(env.get_var("SOME_RANDOM_ENV_VAR_12345"), None);

        env.set_var("KEY", "VALUE");
        assert_eq!(env.get_var("KEY"), Some(OsStr::new("VALUE")));

        env.set_var("KEY", "OTHER");
        assert_eq!(env.get_var("KEY"), Some(OsStr::new("OTHER")));

        assert!(env.remove_var("KEY").is_some());
        assert_eq!(env.get_var("KEY"), None);
    }

    #[test]
    fn test_env_reads_from_process_env() {
        let env = Environment::capture();
        assert!(env.search_path().is_some());
        assert!(env.current_dir.is_none());
    }

    #[test]
    fn test_env_does_not_fall_back_to_process_env() {
        let env = Environment::from_vars([("ONLY", "this")]);
        assert_eq!(env.vars.len(), 1);
        assert_eq!(env.search_path(), None);
    }

    #[test]
    fn test_with_current_dir() {
        let env = Environment::default().with_current_dir("/tmp");
        assert_eq!(env.current_dir.as_deref(), Some(std::path::Path::new("/tmp")));
    }
}
