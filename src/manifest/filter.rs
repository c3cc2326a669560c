// src/manifest/filter.rs

use std::collections::BTreeSet;

use tracing::debug;

use crate::manifest::model::{RawManifest, RawTaskSpec};
use crate::types::TaskName;

/// Keep only the entries whose `when` tag is one of `requested`.
///
/// Membership is exact string equality; kept entries are returned untouched
/// and in document order.
pub fn select_by_when(
    raw: RawManifest,
    requested: &BTreeSet<String>,
) -> Vec<(TaskName, RawTaskSpec)> {
    raw.entries
        .into_iter()
        .filter(|(name, spec)| {
            let keep = requested.contains(&spec.when);
            if !keep {
                debug!(task = %name, when = %spec.when, "dropping task not selected by tag");
            }
            keep
        })
        .collect()
}
