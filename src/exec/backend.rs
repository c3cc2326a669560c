// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The scheduler runtime never spawns processes itself. It asks an
//! `ExecutorBackend` for one `TaskExecution` per dispatched task and then
//! drives it through `start` / `is_alive` / `wait` / `kill`.
//!
//! - `ProcessBackend` is the production implementation; its executions are
//!   [`TaskRun`]s that launch real OS processes.
//! - Tests provide their own backend whose executions stay "alive" for a
//!   scripted number of polls.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::time::Instant;

use crate::context::RunContext;
use crate::exec::unit::TaskRun;
use crate::manifest::TaskSpec;

/// One dispatched task instance, as seen by the scheduler.
pub trait TaskExecution: Send {
    fn spec(&self) -> &TaskSpec;

    /// Launch the task. Launch problems are absorbed: the execution simply
    /// reports "not alive" afterwards.
    fn start(&mut self);

    /// `true` while a launched process has not yet reported exit.
    fn is_alive(&mut self) -> bool;

    /// Wait for the process (if any), record the end time, then stage files.
    fn wait(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;

    /// Forcibly terminate the process, if there is one.
    fn kill(&mut self);

    fn started_at(&self) -> Option<Instant>;

    fn finished_at(&self) -> Option<Instant>;
}

/// Factory for executions.
pub trait ExecutorBackend {
    fn create(&mut self, spec: Arc<TaskSpec>) -> Box<dyn TaskExecution>;
}

/// Production backend: every task becomes a real child process.
#[derive(Debug, Clone)]
pub struct ProcessBackend {
    ctx: Arc<RunContext>,
}

impl ProcessBackend {
    pub fn new(ctx: Arc<RunContext>) -> Self {
        Self { ctx }
    }
}

impl ExecutorBackend for ProcessBackend {
    fn create(&mut self, spec: Arc<TaskSpec>) -> Box<dyn TaskExecution> {
        Box::new(TaskRun::new(spec, &self.ctx))
    }
}
