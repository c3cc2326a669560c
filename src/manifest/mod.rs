// src/manifest/mod.rs

//! Manifest loading and tag filtering.
//!
//! Responsibilities:
//! - Define the serde-backed task model (`model.rs`).
//! - Drop tasks whose `when` tag was not requested (`filter.rs`).
//! - Reject selected tasks with unusable fields (`validate.rs`).
//! - Read a YAML or TOML file from disk (`loader.rs`).

pub mod filter;
pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{ManifestFormat, load_from_path, parse};
pub use model::{ManifestDocument, RawManifest, RawTaskSpec, TaskSpec};
