// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`backend`] defines the `TaskExecution` / `ExecutorBackend` seam used by
//!   the scheduler runtime, plus the production `ProcessBackend`.
//! - [`unit`] is the process-backed execution unit (`TaskRun`).
//! - [`env`] builds a task's child environment.
//! - [`staging`] copies `copy_files` matches into place after a task ends.

pub mod backend;
pub mod env;
pub mod staging;
pub mod unit;

pub use backend::{ExecutorBackend, ProcessBackend, TaskExecution};
pub use staging::{StagingReport, copy_if_newer, stage_files};
pub use unit::TaskRun;
