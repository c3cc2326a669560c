// crates/test-utils/src/builders.rs

#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use reportor::manifest::{ManifestDocument, TaskSpec};
use reportor::types::{CommandSpec, CopyEntry};

/// Builder for `ManifestDocument` to simplify test setup.
pub struct ManifestBuilder {
    tasks: Vec<TaskSpec>,
}

impl ManifestBuilder {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    pub fn with_task(mut self, task: TaskSpec) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn build(self) -> ManifestDocument {
        ManifestDocument::from_specs(self.tasks)
    }
}

impl Default for ManifestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskSpec`. Tasks default to the `hourly` tag.
pub struct TaskSpecBuilder {
    task: TaskSpec,
}

impl TaskSpecBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            task: TaskSpec::new(name, "hourly"),
        }
    }

    pub fn when(mut self, tag: &str) -> Self {
        self.task.when = tag.to_string();
        self
    }

    pub fn argv(mut self, args: &[&str]) -> Self {
        self.task.command = Some(CommandSpec::Argv(
            args.iter().map(|a| a.to_string()).collect(),
        ));
        self
    }

    pub fn shell(mut self, line: &str) -> Self {
        self.task.command = Some(CommandSpec::Shell(line.to_string()));
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.task.cwd = dir.into();
        self
    }

    pub fn requires(mut self, dep: &str) -> Self {
        self.task.requires.insert(dep.to_string());
        self
    }

    pub fn lock(mut self, lock: &str) -> Self {
        self.task.locks.insert(lock.to_string());
        self
    }

    pub fn maxtime(mut self, maxtime: Duration) -> Self {
        self.task.maxtime = maxtime;
        self
    }

    pub fn stdout(mut self, path: &str) -> Self {
        self.task.stdout = PathBuf::from(path);
        self
    }

    pub fn stderr(mut self, path: &str) -> Self {
        self.task.stderr = PathBuf::from(path);
        self
    }

    pub fn copy(mut self, pattern: &str) -> Self {
        self.task.copy_files.push(CopyEntry::Pattern(pattern.to_string()));
        self
    }

    pub fn copy_to(mut self, pattern: &str, dest: &str) -> Self {
        self.task
            .copy_files
            .push(CopyEntry::To(pattern.to_string(), dest.to_string()));
        self
    }

    pub fn build(self) -> TaskSpec {
        self.task
    }
}
