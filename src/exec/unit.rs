// src/exec/unit.rs

//! A single task instance backed by an OS process.

use std::ffi::OsString;
use std::fs::{self, File};
use std::future::Future;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;
use std::sync::Arc;

use tokio::process::{Child, Command};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::context::RunContext;
use crate::exec::backend::TaskExecution;
use crate::exec::env::task_environment;
use crate::exec::staging::{StagingReport, stage_files};
use crate::manifest::TaskSpec;
use crate::types::CommandSpec;

/// One run of one task.
///
/// stdout/stderr go straight to files under the task's output directory;
/// stdin is null.
#[derive(Debug)]
pub struct TaskRun {
    spec: Arc<TaskSpec>,
    output_dir: PathBuf,
    stdout_path: PathBuf,
    stderr_path: PathBuf,
    env: Vec<(OsString, OsString)>,

    child: Option<Child>,
    exited: bool,
    started_at: Option<Instant>,
    finished_at: Option<Instant>,
    staging: Option<StagingReport>,
}

impl TaskRun {
    pub fn new(spec: Arc<TaskSpec>, ctx: &RunContext) -> Self {
        let output_dir = ctx.task_output_dir(&spec.name);
        let env = task_environment(ctx, &output_dir);
        Self {
            stdout_path: output_dir.join(&spec.stdout),
            stderr_path: output_dir.join(&spec.stderr),
            output_dir,
            env,
            spec,
            child: None,
            exited: false,
            started_at: None,
            finished_at: None,
            staging: None,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn stdout_path(&self) -> &Path {
        &self.stdout_path
    }

    pub fn stderr_path(&self) -> &Path {
        &self.stderr_path
    }

    pub fn env(&self) -> &[(OsString, OsString)] {
        &self.env
    }

    /// Result of the last staging pass, once `wait` has run.
    pub fn staging(&self) -> Option<&StagingReport> {
        self.staging.as_ref()
    }

    fn create_dirs(&self) -> io::Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        for target in [&self.stdout_path, &self.stderr_path] {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    fn build_command(&self, command: &CommandSpec) -> Command {
        let mut cmd = match command {
            CommandSpec::Argv(args) => {
                // Validated non-empty at load time; an empty list still fails
                // to spawn instead of panicking.
                let program = args.first().map(String::as_str).unwrap_or_default();
                let mut c = Command::new(program);
                c.args(args.iter().skip(1));
                c
            }
            CommandSpec::Shell(line) => {
                if cfg!(windows) {
                    let mut c = Command::new("cmd");
                    c.arg("/C").arg(line);
                    c
                } else {
                    let mut c = Command::new("sh");
                    c.arg("-c").arg(line);
                    c
                }
            }
        };

        cmd.current_dir(&self.spec.cwd)
            .env_clear()
            .envs(self.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }

    fn launch(&mut self, command: &CommandSpec) -> io::Result<()> {
        let stdout = File::create(&self.stdout_path)?;
        let mut stderr = File::create(&self.stderr_path)?;

        let mut cmd = self.build_command(command);
        cmd.stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr.try_clone()?));

        debug!(task = %self.spec.name, command = %command, cwd = ?self.spec.cwd, "spawning");

        match cmd.spawn() {
            Ok(child) => {
                debug!(task = %self.spec.name, pid = ?child.id(), "process started");
                self.child = Some(child);
            }
            Err(e) => {
                error!(task = %self.spec.name, error = %e, "failed to start");
                // Dropping `cmd` closes the child's copies of both streams.
                drop(cmd);
                writeln!(stderr, "{e}")?;
                self.finished_at = Some(Instant::now());
            }
        }
        Ok(())
    }
}

impl TaskExecution for TaskRun {
    fn spec(&self) -> &TaskSpec {
        &self.spec
    }

    fn start(&mut self) {
        let started = Instant::now();
        self.started_at = Some(started);

        if let Err(e) = self.create_dirs() {
            error!(
                task = %self.spec.name,
                output_dir = ?self.output_dir,
                error = %e,
                "failed to create output directories"
            );
            self.finished_at = Some(Instant::now());
            return;
        }

        let Some(command) = self.spec.command.clone() else {
            // Pure staging task.
            self.finished_at = Some(started);
            return;
        };

        if let Err(e) = self.launch(&command) {
            error!(
                task = %self.spec.name,
                error = %e,
                "failed to set up task output"
            );
            self.finished_at = Some(Instant::now());
        }
    }

    fn is_alive(&mut self) -> bool {
        if self.exited {
            return false;
        }
        let Some(child) = self.child.as_mut() else {
            return false;
        };

        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                debug!(task = %self.spec.name, ?status, "process exited");
                self.exited = true;
                false
            }
            Err(e) => {
                warn!(task = %self.spec.name, error = %e, "failed to poll process; treating as exited");
                self.exited = true;
                false
            }
        }
    }

    fn wait(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            if let Some(child) = self.child.as_mut() {
                match child.wait().await {
                    Ok(status) => info!(
                        task = %self.spec.name,
                        exit_code = status.code().unwrap_or(-1),
                        success = status.success(),
                        "task process exited"
                    ),
                    Err(e) => warn!(task = %self.spec.name, error = %e, "failed waiting for process"),
                }
                self.exited = true;
                self.finished_at = Some(Instant::now());
            }

            let report = stage_files(&self.spec.cwd, &self.output_dir, &self.spec.copy_files);
            if !report.copied.is_empty() || !report.skipped.is_empty() {
                debug!(
                    task = %self.spec.name,
                    copied = report.copied.len(),
                    skipped = report.skipped.len(),
                    "staging complete"
                );
            }
            self.staging = Some(report);
        })
    }

    fn kill(&mut self) {
        if let Some(child) = self.child.as_mut() {
            if let Err(e) = child.start_kill() {
                warn!(task = %self.spec.name, error = %e, "kill failed");
            }
        }
    }

    fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    fn finished_at(&self) -> Option<Instant> {
        self.finished_at
    }
}
