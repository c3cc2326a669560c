// src/exec/staging.rs

//! Post-run file staging (`copy_files`).
//!
//! Each entry is a glob relative to the task's working directory. Matched
//! directories are mirrored file by file under the destination, keeping
//! their path relative to the working directory; matched files are copied
//! into the destination directory. Copies only happen when the destination is
//! missing or strictly older than the source.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use filetime::FileTime;
use glob::Pattern;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::types::CopyEntry;

/// What a staging pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagingReport {
    /// Destination paths that were written.
    pub copied: Vec<PathBuf>,
    /// Matches that could not be staged (misconfiguration or I/O error).
    pub skipped: Vec<PathBuf>,
}

/// Stage every `copy_files` entry of a task.
///
/// Never fails: problems are logged and recorded in `skipped`.
pub fn stage_files(cwd: &Path, output_dir: &Path, entries: &[CopyEntry]) -> StagingReport {
    let mut report = StagingReport::default();

    for entry in entries {
        let destination = entry
            .destination()
            .map(PathBuf::from)
            .unwrap_or_else(|| output_dir.to_path_buf());

        for matched in expand(cwd, entry.pattern()) {
            if matched.is_dir() {
                mirror_dir(cwd, &matched, &destination, &mut report);
            } else if destination.is_dir() {
                let Some(file_name) = matched.file_name() else {
                    continue;
                };
                let dst = destination.join(file_name);
                copy_recording(&matched, &dst, &mut report);
            } else {
                warn!(
                    src = ?matched,
                    dst = ?destination,
                    "copy_files destination is not a directory; skipping"
                );
                report.skipped.push(matched);
            }
        }
    }

    report
}

/// Expand `pattern` against `cwd`. Invalid patterns and unreadable matches
/// are logged and dropped.
fn expand(cwd: &Path, pattern: &str) -> Vec<PathBuf> {
    let pattern = pattern.trim_end_matches('/');
    let base = Pattern::escape(&cwd.to_string_lossy());
    let full = if base.is_empty() {
        pattern.to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), pattern)
    };

    let paths = match glob::glob(&full) {
        Ok(paths) => paths,
        Err(e) => {
            warn!(pattern = %full, error = %e, "invalid copy_files pattern; skipping");
            return Vec::new();
        }
    };

    let mut matches = Vec::new();
    for path in paths {
        match path {
            Ok(p) => matches.push(p),
            Err(e) => warn!(error = %e, "unreadable copy_files match; skipping"),
        }
    }

    if matches.is_empty() {
        debug!(pattern = %full, "copy_files pattern matched nothing");
    }
    matches
}

fn mirror_dir(cwd: &Path, dir: &Path, destination: &Path, report: &mut StagingReport) {
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(dir = ?dir, error = %e, "failed to walk copy_files directory");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let src = entry.path();
        let Some(rel) = relative_to_cwd(cwd, src) else {
            warn!(src = ?src, cwd = ?cwd, "copy_files match is outside the working directory; skipping");
            report.skipped.push(src.to_path_buf());
            continue;
        };
        copy_recording(src, &destination.join(rel), report);
    }
}

/// `path` relative to `cwd`. `.` components are ignored on both sides, since
/// glob drops a leading `./` from its matches.
fn relative_to_cwd(cwd: &Path, path: &Path) -> Option<PathBuf> {
    let base = without_cur_dir(cwd);
    without_cur_dir(path)
        .strip_prefix(&base)
        .ok()
        .map(Path::to_path_buf)
}

fn without_cur_dir(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn copy_recording(src: &Path, dst: &Path, report: &mut StagingReport) {
    match copy_if_newer(src, dst) {
        Ok(true) => report.copied.push(dst.to_path_buf()),
        Ok(false) => {}
        Err(e) => {
            warn!(src = ?src, dst = ?dst, error = %e, "failed to stage file");
            report.skipped.push(src.to_path_buf());
        }
    }
}

/// Copy `src` to `dst` if `dst` is missing or strictly older than `src`.
///
/// Permissions and access/modification times are carried over, and missing
/// parent directories of `dst` are created. Returns whether a copy happened.
pub fn copy_if_newer(src: &Path, dst: &Path) -> io::Result<bool> {
    let src_meta = fs::metadata(src)?;
    let src_mtime = FileTime::from_last_modification_time(&src_meta);

    if let Ok(dst_meta) = fs::metadata(dst) {
        if FileTime::from_last_modification_time(&dst_meta) >= src_mtime {
            debug!(src = ?src, dst = ?dst, "destination is up to date");
            return Ok(false);
        }
    }

    info!(src = ?src, dst = ?dst, "copying");
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    // fs::copy also copies the permission bits.
    fs::copy(src, dst)?;
    filetime::set_file_times(
        dst,
        FileTime::from_last_access_time(&src_meta),
        src_mtime,
    )?;

    Ok(true)
}
