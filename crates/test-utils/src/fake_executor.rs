// crates/test-utils/src/fake_executor.rs

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use reportor::exec::{ExecutorBackend, TaskExecution};
use reportor::manifest::TaskSpec;
use reportor::types::{LockName, TaskName};
use tokio::time::Instant;

/// How a fake execution behaves once started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeBehaviour {
    /// Reports alive for this many liveness checks, then exits.
    Polls(u32),
    /// Stays alive until killed.
    Hang,
    /// Ignores this many kills, then dies on the next one.
    SurvivesKills(u32),
}

impl Default for FakeBehaviour {
    fn default() -> Self {
        FakeBehaviour::Polls(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEvent {
    Started(TaskName),
    Killed(TaskName),
    Finished(TaskName),
}

/// Shared record of what the fake executions did.
///
/// Every start is checked against the executions that are active at that
/// moment: overlapping locks or unfinished requirements are recorded in
/// `violations`.
#[derive(Debug, Default)]
pub struct Ledger {
    pub events: Vec<LedgerEvent>,
    pub violations: Vec<String>,
    active: BTreeMap<TaskName, BTreeSet<LockName>>,
    finished: BTreeSet<TaskName>,
}

impl Ledger {
    fn on_start(&mut self, spec: &TaskSpec) {
        for req in &spec.requires {
            if !self.finished.contains(req) {
                self.violations
                    .push(format!("{} started before requirement {} finished", spec.name, req));
            }
        }
        for (other, locks) in &self.active {
            for lock in spec.locks.intersection(locks) {
                self.violations.push(format!(
                    "{} started while {} holds lock {}",
                    spec.name, other, lock
                ));
            }
        }
        self.active.insert(spec.name.clone(), spec.locks.clone());
        self.events.push(LedgerEvent::Started(spec.name.clone()));
    }

    fn on_finish(&mut self, name: &str) {
        self.active.remove(name);
        self.finished.insert(name.to_string());
        self.events.push(LedgerEvent::Finished(name.to_string()));
    }

    pub fn started(&self) -> Vec<TaskName> {
        self.events
            .iter()
            .filter_map(|e| match e {
                LedgerEvent::Started(n) => Some(n.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, event: &LedgerEvent) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }

    pub fn position(&self, event: &LedgerEvent) -> Option<usize> {
        self.events.iter().position(|e| e == event)
    }
}

/// A fake backend whose executions never spawn processes.
pub struct FakeBackend {
    behaviours: HashMap<TaskName, FakeBehaviour>,
    ledger: Arc<Mutex<Ledger>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            behaviours: HashMap::new(),
            ledger: Arc::new(Mutex::new(Ledger::default())),
        }
    }

    pub fn with_behaviour(mut self, task: &str, behaviour: FakeBehaviour) -> Self {
        self.behaviours.insert(task.to_string(), behaviour);
        self
    }

    pub fn ledger(&self) -> Arc<Mutex<Ledger>> {
        Arc::clone(&self.ledger)
    }
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutorBackend for FakeBackend {
    fn create(&mut self, spec: Arc<TaskSpec>) -> Box<dyn TaskExecution> {
        let behaviour = self
            .behaviours
            .get(&spec.name)
            .copied()
            .unwrap_or_default();
        Box::new(FakeExecution {
            spec,
            behaviour,
            polls: 0,
            kills: 0,
            started_at: None,
            finished_at: None,
            ledger: Arc::clone(&self.ledger),
        })
    }
}

pub struct FakeExecution {
    spec: Arc<TaskSpec>,
    behaviour: FakeBehaviour,
    polls: u32,
    kills: u32,
    started_at: Option<Instant>,
    finished_at: Option<Instant>,
    ledger: Arc<Mutex<Ledger>>,
}

impl TaskExecution for FakeExecution {
    fn spec(&self) -> &TaskSpec {
        &self.spec
    }

    fn start(&mut self) {
        self.started_at = Some(Instant::now());
        self.ledger.lock().unwrap().on_start(&self.spec);
    }

    fn is_alive(&mut self) -> bool {
        match self.behaviour {
            FakeBehaviour::Hang => self.kills == 0,
            FakeBehaviour::SurvivesKills(n) => self.kills <= n,
            FakeBehaviour::Polls(n) => {
                if self.kills > 0 || self.polls >= n {
                    false
                } else {
                    self.polls += 1;
                    true
                }
            }
        }
    }

    fn wait(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            self.finished_at = Some(Instant::now());
            self.ledger.lock().unwrap().on_finish(&self.spec.name);
        })
    }

    fn kill(&mut self) {
        self.kills += 1;
        self.ledger
            .lock()
            .unwrap()
            .events
            .push(LedgerEvent::Killed(self.spec.name.clone()));
    }

    fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    fn finished_at(&self) -> Option<Instant> {
        self.finished_at
    }
}
