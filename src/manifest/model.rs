// src/manifest/model.rs

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::types::{CommandSpec, CopyEntry, LockName, TaskName};

pub const DEFAULT_MAXTIME_SECS: u64 = 3600;
pub const DEFAULT_STDOUT: &str = "output.txt";
pub const DEFAULT_STDERR: &str = "logs/output.log";

/// One task entry exactly as written in the manifest.
///
/// ```yaml
/// report2:
///     when: hourly
///     command: [python, report2.py]
///     requires: [report1]
///     locks: [statusdb]
///     cwd: report2
///     copy_files:
///         - flot/
/// ```
///
/// Unknown keys are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTaskSpec {
    /// Selector tag; the task only runs when this tag is requested.
    pub when: String,

    #[serde(default)]
    pub command: Option<CommandSpec>,

    /// Working directory; defaults to the task name.
    #[serde(default)]
    pub cwd: Option<String>,

    #[serde(default)]
    pub requires: Vec<TaskName>,

    #[serde(default)]
    pub locks: Vec<LockName>,

    /// Seconds before the task is killed.
    #[serde(default = "default_maxtime")]
    pub maxtime: u64,

    #[serde(default = "default_stdout")]
    pub stdout: String,

    #[serde(default = "default_stderr")]
    pub stderr: String,

    #[serde(default)]
    pub copy_files: Vec<CopyEntry>,
}

fn default_maxtime() -> u64 {
    DEFAULT_MAXTIME_SECS
}

fn default_stdout() -> String {
    DEFAULT_STDOUT.to_string()
}

fn default_stderr() -> String {
    DEFAULT_STDERR.to_string()
}

/// Top-level manifest: task entries in document order.
///
/// A name that appears twice keeps its first position but takes the body of
/// the later entry.
#[derive(Debug, Clone, Default)]
pub struct RawManifest {
    pub entries: Vec<(TaskName, RawTaskSpec)>,
}

impl RawManifest {
    pub fn insert(&mut self, name: TaskName, spec: RawTaskSpec) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = spec,
            None => self.entries.push((name, spec)),
        }
    }
}

impl<'de> Deserialize<'de> for RawManifest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ManifestVisitor;

        impl<'de> Visitor<'de> for ManifestVisitor {
            type Value = RawManifest;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of task name to task definition")
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(RawManifest::default())
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut manifest = RawManifest::default();
                while let Some((name, spec)) = map.next_entry::<TaskName, RawTaskSpec>()? {
                    manifest.insert(name, spec);
                }
                Ok(manifest)
            }
        }

        deserializer.deserialize_map(ManifestVisitor)
    }
}

/// Immutable, fully-defaulted description of one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    pub name: TaskName,
    pub when: String,
    pub command: Option<CommandSpec>,
    pub cwd: PathBuf,
    pub requires: BTreeSet<TaskName>,
    pub locks: BTreeSet<LockName>,
    pub maxtime: Duration,
    /// Relative to the task's output directory.
    pub stdout: PathBuf,
    /// Relative to the task's output directory.
    pub stderr: PathBuf,
    pub copy_files: Vec<CopyEntry>,
}

impl TaskSpec {
    /// A task with every optional field at its default.
    pub fn new(name: impl Into<TaskName>, when: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            cwd: PathBuf::from(&name),
            name,
            when: when.into(),
            command: None,
            requires: BTreeSet::new(),
            locks: BTreeSet::new(),
            maxtime: Duration::from_secs(DEFAULT_MAXTIME_SECS),
            stdout: PathBuf::from(DEFAULT_STDOUT),
            stderr: PathBuf::from(DEFAULT_STDERR),
            copy_files: Vec::new(),
        }
    }

    pub fn from_raw(name: TaskName, raw: RawTaskSpec) -> Self {
        let cwd = raw.cwd.unwrap_or_else(|| name.clone());
        Self {
            name,
            when: raw.when,
            command: raw.command,
            cwd: PathBuf::from(cwd),
            requires: raw.requires.into_iter().collect(),
            locks: raw.locks.into_iter().collect(),
            maxtime: Duration::from_secs(raw.maxtime),
            stdout: PathBuf::from(raw.stdout),
            stderr: PathBuf::from(raw.stderr),
            copy_files: raw.copy_files,
        }
    }
}

/// The filtered manifest handed to the scheduler. Read-only; iteration is in
/// document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestDocument {
    tasks: Vec<TaskSpec>,
}

impl ManifestDocument {
    /// Build from specs in order. Later specs replace earlier ones with the
    /// same name.
    pub fn from_specs(specs: impl IntoIterator<Item = TaskSpec>) -> Self {
        let mut tasks: Vec<TaskSpec> = Vec::new();
        for spec in specs {
            match tasks.iter_mut().find(|t| t.name == spec.name) {
                Some(slot) => *slot = spec,
                None => tasks.push(spec),
            }
        }
        Self { tasks }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&TaskSpec> {
        self.tasks.iter().find(|t| t.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|t| t.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskSpec> {
        self.tasks.iter()
    }

    pub fn into_specs(self) -> Vec<TaskSpec> {
        self.tasks
    }
}
