// src/dag/mod.rs

//! Task readiness and dependency analysis.
//!
//! - [`state`] holds the pending list, finished set and held locks, and
//!   decides which pending tasks may start.
//! - [`plan`] is a read-only graph analysis of `requires`, used by
//!   `--dry-run`.

pub mod plan;
pub mod state;

pub use plan::{ExecutionPlan, Unreachable};
pub use state::{Blocked, SchedulerState};
