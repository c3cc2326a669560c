// src/context.rs

//! Run-wide settings shared by the scheduler and every execution unit.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Context;

use crate::errors::Result;

/// Variable holding the task's output directory.
pub const OUTPUT_DIR_VAR: &str = "OUTPUT_DIR";
/// Variable holding the run's logical now, in epoch seconds.
pub const NOW_VAR: &str = "REPORTOR_NOW";
/// Variable holding the absolute path of the credentials file, if present.
pub const CREDENTIALS_VAR: &str = "REPORTOR_CREDS";
/// Credentials file probed in the invocation's working directory.
pub const DEFAULT_CREDENTIALS_FILE: &str = "credentials.ini";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Everything a run needs to know about its surroundings.
///
/// The environment is snapshotted once so that every task of a run sees the
/// same inherited variables.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Base directory; each task writes to `output_dir/<name>`.
    pub output_dir: PathBuf,
    /// Logical now shared by all tasks, as epoch seconds.
    pub now_epoch: u64,
    /// Absolute path of the credentials file, when it exists.
    pub credentials: Option<PathBuf>,
    /// Inherited environment for child processes.
    pub env: Vec<(OsString, OsString)>,
    /// How long the scheduler sleeps between dispatch and reap.
    pub poll_interval: Duration,
}

impl RunContext {
    /// Context with the current process environment, no credentials and the
    /// default poll interval.
    pub fn new(output_dir: impl Into<PathBuf>, now_epoch: u64) -> Self {
        Self {
            output_dir: output_dir.into(),
            now_epoch,
            credentials: None,
            env: std::env::vars_os().collect(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_credentials(mut self, credentials: Option<PathBuf>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_env(mut self, env: Vec<(OsString, OsString)>) -> Self {
        self.env = env;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Output directory of a single task.
    pub fn task_output_dir(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }
}

/// Current wall clock as epoch seconds.
pub fn epoch_now() -> Result<u64> {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is before the Unix epoch")?
        .as_secs();
    Ok(secs)
}

/// Absolute path of `file` (relative paths resolve against the current
/// directory) if it exists.
pub fn locate_credentials(file: &Path) -> Result<Option<PathBuf>> {
    let path = if file.is_absolute() {
        file.to_path_buf()
    } else {
        std::env::current_dir()
            .context("resolving current directory")?
            .join(file)
    };

    Ok(path.exists().then_some(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_output_dir_is_nested_under_base() {
        let ctx = RunContext::new("/srv/reports", 0);
        assert_eq!(ctx.task_output_dir("daily"), PathBuf::from("/srv/reports/daily"));
    }

    #[test]
    fn missing_credentials_file_is_none() {
        let dir = std::env::temp_dir().join("reportor-no-such-dir-for-creds");
        let found = locate_credentials(&dir.join("credentials.ini")).unwrap();
        assert!(found.is_none());
    }
}
