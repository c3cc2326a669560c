// src/types.rs

use std::fmt;

use serde::Deserialize;

/// Public type alias for task names throughout the crate.
pub type TaskName = String;

/// Name of a cooperative lock token.
pub type LockName = String;

/// How a task's program is launched.
///
/// ```yaml
/// command: [python, report1.py]   # Argv: executed directly
/// command: python report2.py      # Shell: handed to `sh -c`
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CommandSpec {
    Argv(Vec<String>),
    Shell(String),
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandSpec::Argv(args) => write!(f, "{:?}", args),
            CommandSpec::Shell(line) => write!(f, "{line}"),
        }
    }
}

/// One `copy_files` entry: a bare glob, or a `[glob, destination]` pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CopyEntry {
    Pattern(String),
    To(String, String),
}

impl CopyEntry {
    /// The glob pattern, relative to the task's working directory.
    pub fn pattern(&self) -> &str {
        match self {
            CopyEntry::Pattern(p) | CopyEntry::To(p, _) => p,
        }
    }

    /// Explicit destination, if one was given.
    pub fn destination(&self) -> Option<&str> {
        match self {
            CopyEntry::Pattern(_) => None,
            CopyEntry::To(_, dst) => Some(dst),
        }
    }
}
