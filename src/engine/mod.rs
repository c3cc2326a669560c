// src/engine/mod.rs

//! Orchestration engine for reportor.
//!
//! The runtime owns the scheduler state and drives execution units created
//! by an `ExecutorBackend`, polling them at a fixed interval until every
//! task has finished.

use std::collections::BTreeSet;
use std::time::Duration;

use crate::context::DEFAULT_POLL_INTERVAL;
use crate::types::TaskName;

pub mod runtime;

pub use runtime::Runtime;

/// Runtime options.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// Idle time between the dispatch and reap phases of each pass.
    pub poll_interval: Duration,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// One finished task.
///
/// Carries no exit status. Normal exit, a `maxtime` kill and a spawn failure
/// all produce the same report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub name: TaskName,
    pub elapsed: Duration,
}

/// Finished tasks in completion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub tasks: Vec<TaskReport>,
}

impl RunSummary {
    pub fn finished_names(&self) -> BTreeSet<TaskName> {
        self.tasks.iter().map(|t| t.name.clone()).collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.name == name)
    }
}
