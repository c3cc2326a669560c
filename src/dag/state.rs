// src/dag/state.rs

//! Readiness and lock bookkeeping for the scheduler.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::manifest::{ManifestDocument, TaskSpec};
use crate::types::{LockName, TaskName};

/// Why a pending task cannot start yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Blocked {
    /// Requirements that have not finished.
    Requires(Vec<TaskName>),
    /// Locks currently held by a running task.
    Locks(Vec<LockName>),
}

/// Pending tasks, finished names and held locks.
///
/// Running executions are owned by the runtime; this type only tracks which
/// locks they hold. A lock is in `held_locks` exactly while the one running
/// task that acquired it has not been marked finished.
#[derive(Debug, Clone, Default)]
pub struct SchedulerState {
    pending: Vec<Arc<TaskSpec>>,
    finished: BTreeSet<TaskName>,
    held_locks: BTreeSet<LockName>,
}

impl SchedulerState {
    pub fn from_manifest(manifest: ManifestDocument) -> Self {
        Self {
            pending: manifest.into_specs().into_iter().map(Arc::new).collect(),
            finished: BTreeSet::new(),
            held_locks: BTreeSet::new(),
        }
    }

    pub fn pending(&self) -> impl Iterator<Item = &TaskSpec> {
        self.pending.iter().map(|s| s.as_ref())
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn finished(&self) -> &BTreeSet<TaskName> {
        &self.finished
    }

    pub fn held_locks(&self) -> &BTreeSet<LockName> {
        &self.held_locks
    }

    /// `Ok(())` if `spec` may start now.
    ///
    /// Requirements are checked before locks, so a task waiting on both
    /// reports its requirements.
    pub fn check_ready(&self, spec: &TaskSpec) -> Result<(), Blocked> {
        let waiting: Vec<TaskName> = spec
            .requires
            .iter()
            .filter(|r| !self.finished.contains(*r))
            .cloned()
            .collect();
        if !waiting.is_empty() {
            return Err(Blocked::Requires(waiting));
        }

        let contended: Vec<LockName> = spec
            .locks
            .intersection(&self.held_locks)
            .cloned()
            .collect();
        if !contended.is_empty() {
            return Err(Blocked::Locks(contended));
        }

        Ok(())
    }

    /// Scan pending tasks in document order and take every one that is ready,
    /// acquiring its locks as it is taken.
    ///
    /// A blocked task does not stop the scan. Locks taken earlier in the scan
    /// block later tasks in the same scan.
    pub fn take_ready(&mut self) -> Vec<Arc<TaskSpec>> {
        let mut ready = Vec::new();
        let mut still_pending = Vec::with_capacity(self.pending.len());

        for spec in std::mem::take(&mut self.pending) {
            match self.check_ready(&spec) {
                Ok(()) => {
                    self.held_locks.extend(spec.locks.iter().cloned());
                    ready.push(spec);
                }
                Err(Blocked::Requires(waiting)) => {
                    debug!(task = %spec.name, ?waiting, "still waiting for tasks");
                    still_pending.push(spec);
                }
                Err(Blocked::Locks(waiting)) => {
                    debug!(task = %spec.name, ?waiting, "still waiting for locks");
                    still_pending.push(spec);
                }
            }
        }

        self.pending = still_pending;
        ready
    }

    /// Record that a started task is done and release its locks.
    ///
    /// Returns `false` if the task was already finished.
    pub fn mark_finished(&mut self, spec: &TaskSpec) -> bool {
        for lock in &spec.locks {
            self.held_locks.remove(lock);
        }
        self.finished.insert(spec.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, requires: &[&str], locks: &[&str]) -> TaskSpec {
        let mut s = TaskSpec::new(name, "hourly");
        s.requires = requires.iter().map(|r| r.to_string()).collect();
        s.locks = locks.iter().map(|l| l.to_string()).collect();
        s
    }

    fn state(specs: Vec<TaskSpec>) -> SchedulerState {
        SchedulerState::from_manifest(ManifestDocument::from_specs(specs))
    }

    fn names(specs: &[Arc<TaskSpec>]) -> Vec<&str> {
        specs.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn scan_skips_blocked_task_and_continues() {
        let mut st = state(vec![
            spec("A", &[], &[]),
            spec("B", &["A"], &["L"]),
            spec("C", &[], &["L"]),
        ]);

        let first = st.take_ready();
        assert_eq!(names(&first), vec!["A", "C"]);
        assert!(st.held_locks().contains("L"));

        // A done, but C still holds L.
        st.mark_finished(&first[0]);
        assert!(st.take_ready().is_empty());
        assert_eq!(
            st.check_ready(&spec("B", &["A"], &["L"])),
            Err(Blocked::Locks(vec!["L".into()]))
        );

        st.mark_finished(&first[1]);
        assert_eq!(names(&st.take_ready()), vec!["B"]);
        assert!(!st.has_pending());

        let done: Vec<&str> = st.finished().iter().map(String::as_str).collect();
        assert_eq!(done, vec!["A", "C"]);
    }

    #[test]
    fn lock_taken_earlier_in_scan_blocks_later_tasks() {
        let mut st = state(vec![spec("X", &[], &["db"]), spec("Y", &[], &["db"])]);

        assert_eq!(names(&st.take_ready()), vec!["X"]);
        assert_eq!(st.pending().map(|s| s.name.as_str()).collect::<Vec<_>>(), vec!["Y"]);
    }

    #[test]
    fn missing_requirement_never_becomes_ready() {
        let mut st = state(vec![spec("orphan", &["ghost"], &[])]);

        for _ in 0..3 {
            assert!(st.take_ready().is_empty());
        }
        assert_eq!(
            st.check_ready(&spec("orphan", &["ghost"], &[])),
            Err(Blocked::Requires(vec!["ghost".into()]))
        );
    }

    #[test]
    fn cycle_stays_pending() {
        let mut st = state(vec![spec("P", &["Q"], &[]), spec("Q", &["P"], &[])]);
        assert!(st.take_ready().is_empty());
        assert_eq!(st.pending().count(), 2);
    }

    #[test]
    fn mark_finished_reports_duplicates() {
        let mut st = state(vec![spec("A", &[], &["L"])]);
        let ready = st.take_ready();

        assert!(st.mark_finished(&ready[0]));
        assert!(st.held_locks().is_empty());
        assert!(!st.mark_finished(&ready[0]));
    }
}
