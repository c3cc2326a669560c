// src/manifest/loader.rs

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::Context;
use tracing::debug;

use crate::errors::Result;
use crate::manifest::filter::select_by_when;
use crate::manifest::model::{ManifestDocument, RawManifest, TaskSpec};
use crate::manifest::validate::validate_tasks;

/// Textual syntax of a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Yaml,
    Toml,
}

impl ManifestFormat {
    /// `.toml` files are TOML; everything else is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ManifestFormat::Toml,
            _ => ManifestFormat::Yaml,
        }
    }
}

/// Parse a manifest document and keep only the tasks whose `when` tag is in
/// `requested`.
///
/// Fails if the document is malformed or a selected task does not pass
/// [`validate_tasks`].
pub fn parse(
    document: &str,
    format: ManifestFormat,
    requested: &BTreeSet<String>,
) -> Result<ManifestDocument> {
    let raw: RawManifest = match format {
        ManifestFormat::Yaml => serde_yaml::from_str(document)?,
        ManifestFormat::Toml => toml::from_str(document)?,
    };
    let total = raw.entries.len();

    let selected = select_by_when(raw, requested);
    validate_tasks(&selected)?;

    debug!(
        total,
        selected = selected.len(),
        ?requested,
        "manifest parsed and filtered"
    );

    Ok(ManifestDocument::from_specs(
        selected
            .into_iter()
            .map(|(name, spec)| TaskSpec::from_raw(name, spec)),
    ))
}

/// Read a manifest file from disk, then [`parse`] it.
pub fn load_from_path(
    path: impl AsRef<Path>,
    requested: &BTreeSet<String>,
) -> Result<ManifestDocument> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading manifest at {:?}", path))?;

    parse(&contents, ManifestFormat::from_path(path), requested)
}
