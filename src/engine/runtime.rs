// src/engine/runtime.rs

use std::fmt;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::dag::SchedulerState;
use crate::errors::Result;
use crate::exec::{ExecutorBackend, TaskExecution};
use crate::manifest::ManifestDocument;
use crate::types::TaskName;

use super::{RunSummary, RuntimeOptions, TaskReport};

/// A dispatched task that has not been swept to `finished` yet.
struct RunningTask {
    execution: Box<dyn TaskExecution>,
    /// Kills sent since the task overran `maxtime`.
    kills: u32,
}

/// The scheduler's control loop.
///
/// Owns all run state and mutates it from a single flow. Each pass:
///
/// 1. dispatch every pending task that is ready, in document order
/// 2. sleep for the poll interval
/// 3. sweep executions that are no longer alive into `finished`, and kill
///    the ones that have overrun their `maxtime`
///
/// The loop ends when nothing is pending or running. A task that can never
/// become ready keeps the loop alive forever.
pub struct Runtime<E: ExecutorBackend> {
    state: SchedulerState,
    running: Vec<RunningTask>,
    executor: E,
    options: RuntimeOptions,
    summary: RunSummary,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("state", &self.state)
            .field("running", &self.running_names())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(manifest: ManifestDocument, executor: E, options: RuntimeOptions) -> Self {
        Self {
            state: SchedulerState::from_manifest(manifest),
            running: Vec::new(),
            executor,
            options,
            summary: RunSummary::default(),
        }
    }

    pub fn running_names(&self) -> Vec<TaskName> {
        self.running
            .iter()
            .map(|r| r.execution.spec().name.clone())
            .collect()
    }

    /// Run until every task has finished.
    pub async fn run(mut self) -> Result<RunSummary> {
        info!(
            pending = self.state.pending().count(),
            poll_ms = self.options.poll_interval.as_millis() as u64,
            "reportor runtime started"
        );

        while self.state.has_pending() || !self.running.is_empty() {
            self.dispatch();
            tokio::time::sleep(self.options.poll_interval).await;
            self.reap().await;
        }

        info!(finished = self.summary.tasks.len(), "all tasks finished");
        Ok(self.summary)
    }

    /// Start every ready task.
    fn dispatch(&mut self) {
        for spec in self.state.take_ready() {
            info!(task = %spec.name, locks = ?spec.locks, "starting");
            let mut execution = self.executor.create(spec);
            execution.start();
            self.running.push(RunningTask {
                execution,
                kills: 0,
            });
        }
    }

    /// Sweep finished executions and enforce `maxtime` on the others.
    async fn reap(&mut self) {
        let mut still_running = Vec::with_capacity(self.running.len());

        for mut task in std::mem::take(&mut self.running) {
            if !task.execution.is_alive() {
                task.execution.wait().await;
                self.finish(task);
                continue;
            }

            let elapsed = elapsed_since_start(task.execution.as_ref());
            let maxtime = task.execution.spec().maxtime;
            // Overdue tasks are killed again on every pass until they exit.
            if elapsed > maxtime {
                if task.kills == 0 {
                    warn!(
                        task = %task.execution.spec().name,
                        elapsed_secs = elapsed.as_secs(),
                        maxtime_secs = maxtime.as_secs(),
                        "killing task; it's taking too long"
                    );
                } else {
                    debug!(
                        task = %task.execution.spec().name,
                        kills = task.kills,
                        "task still alive after kill; killing again"
                    );
                }
                task.execution.kill();
                task.kills += 1;
            }
            still_running.push(task);
        }

        self.running = still_running;
    }

    fn finish(&mut self, task: RunningTask) {
        let execution = task.execution;
        let spec = execution.spec();
        let elapsed = match (execution.started_at(), execution.finished_at()) {
            (Some(start), Some(end)) => end.saturating_duration_since(start),
            _ => Duration::ZERO,
        };

        if self.state.mark_finished(spec) {
            info!(
                task = %spec.name,
                elapsed_secs = elapsed.as_secs(),
                "finished"
            );
            self.summary.tasks.push(TaskReport {
                name: spec.name.clone(),
                elapsed,
            });
        } else {
            debug!(task = %spec.name, "task already marked finished");
        }
    }
}

fn elapsed_since_start(execution: &dyn TaskExecution) -> Duration {
    execution
        .started_at()
        .map(|start| start.elapsed())
        .unwrap_or_default()
}
