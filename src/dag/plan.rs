// src/dag/plan.rs

//! Static view of a manifest's `requires` graph, used for dry runs.
//!
//! The scheduler never consults this: unreachable tasks are still handed to
//! it and stay pending. The plan only tells the operator in advance.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;

use crate::manifest::ManifestDocument;
use crate::types::TaskName;

/// Why a task can never become ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unreachable {
    /// Requires a task that is not in the (filtered) manifest.
    MissingRequirement(TaskName),
    /// Part of a `requires` cycle.
    Cycle,
    /// Requires a task that is itself unreachable.
    Upstream(TaskName),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionPlan {
    /// Reachable tasks grouped by dependency depth, document order inside a
    /// stage. Stage 0 has no requirements.
    pub stages: Vec<Vec<TaskName>>,
    pub unreachable: BTreeMap<TaskName, Unreachable>,
}

impl ExecutionPlan {
    pub fn from_manifest(manifest: &ManifestDocument) -> Self {
        // Edge direction: requirement -> task.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for name in manifest.names() {
            graph.add_node(name);
        }
        let mut unreachable: BTreeMap<TaskName, Unreachable> = BTreeMap::new();

        for spec in manifest.iter() {
            for req in &spec.requires {
                if manifest.contains(req) {
                    graph.add_edge(req.as_str(), spec.name.as_str(), ());
                } else {
                    unreachable
                        .entry(spec.name.clone())
                        .or_insert_with(|| Unreachable::MissingRequirement(req.clone()));
                }
            }
        }

        for component in tarjan_scc(&graph) {
            let cyclic = component.len() > 1
                || component
                    .first()
                    .is_some_and(|&n| graph.contains_edge(n, n));
            if cyclic {
                for name in component {
                    unreachable.insert(name.to_string(), Unreachable::Cycle);
                }
            }
        }

        // Propagate to dependents until nothing changes.
        loop {
            let mut added = Vec::new();
            for spec in manifest.iter() {
                if unreachable.contains_key(&spec.name) {
                    continue;
                }
                if let Some(up) = spec.requires.iter().find(|r| unreachable.contains_key(*r)) {
                    added.push((spec.name.clone(), Unreachable::Upstream(up.clone())));
                }
            }
            if added.is_empty() {
                break;
            }
            unreachable.extend(added);
        }

        // Depth = 1 + deepest requirement; reachable tasks have finite depth.
        let mut depth: BTreeMap<&str, usize> = BTreeMap::new();
        let mut remaining: BTreeSet<&str> = manifest
            .names()
            .filter(|n| !unreachable.contains_key(*n))
            .collect();
        while !remaining.is_empty() {
            let mut progressed = false;
            for spec in manifest.iter() {
                let name = spec.name.as_str();
                if !remaining.contains(name) {
                    continue;
                }
                let deps: Option<Vec<usize>> = spec
                    .requires
                    .iter()
                    .map(|r| depth.get(r.as_str()).copied())
                    .collect();
                if let Some(deps) = deps {
                    depth.insert(name, deps.into_iter().max().map_or(0, |d| d + 1));
                    remaining.remove(name);
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }

        let mut stages: Vec<Vec<TaskName>> = Vec::new();
        for name in manifest.names() {
            if let Some(&d) = depth.get(name) {
                if stages.len() <= d {
                    stages.resize_with(d + 1, Vec::new);
                }
                stages[d].push(name.to_string());
            }
        }

        Self {
            stages,
            unreachable,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.unreachable.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::TaskSpec;

    fn spec(name: &str, requires: &[&str]) -> TaskSpec {
        let mut s = TaskSpec::new(name, "daily");
        s.requires = requires.iter().map(|r| r.to_string()).collect();
        s
    }

    #[test]
    fn stages_follow_requirement_depth() {
        let manifest = ManifestDocument::from_specs(vec![
            spec("report", &["extract", "lookup"]),
            spec("extract", &[]),
            spec("lookup", &["extract"]),
            spec("standalone", &[]),
        ]);

        let plan = ExecutionPlan::from_manifest(&manifest);

        assert!(plan.is_complete());
        assert_eq!(
            plan.stages,
            vec![
                vec!["extract".to_string(), "standalone".to_string()],
                vec!["lookup".to_string()],
                vec!["report".to_string()],
            ]
        );
    }

    #[test]
    fn missing_and_cyclic_requirements_are_reported() {
        let manifest = ManifestDocument::from_specs(vec![
            spec("a", &["b"]),
            spec("b", &["a"]),
            spec("c", &["gone"]),
            spec("d", &["c"]),
            spec("e", &[]),
        ]);

        let plan = ExecutionPlan::from_manifest(&manifest);

        assert_eq!(plan.unreachable.get("a"), Some(&Unreachable::Cycle));
        assert_eq!(plan.unreachable.get("b"), Some(&Unreachable::Cycle));
        assert_eq!(
            plan.unreachable.get("c"),
            Some(&Unreachable::MissingRequirement("gone".into()))
        );
        assert_eq!(
            plan.unreachable.get("d"),
            Some(&Unreachable::Upstream("c".into()))
        );
        assert_eq!(plan.stages, vec![vec!["e".to_string()]]);
    }

    #[test]
    fn self_requirement_is_a_cycle() {
        let manifest = ManifestDocument::from_specs(vec![spec("loop", &["loop"])]);
        let plan = ExecutionPlan::from_manifest(&manifest);
        assert_eq!(plan.unreachable.get("loop"), Some(&Unreachable::Cycle));
    }
}
