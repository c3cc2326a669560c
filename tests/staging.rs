// tests/staging.rs

use std::error::Error;
use std::fs;

use filetime::FileTime;
use reportor::exec::{copy_if_newer, stage_files};
use reportor::types::CopyEntry;
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn Error>>;

fn mtime(path: &std::path::Path) -> std::io::Result<FileTime> {
    Ok(FileTime::from_last_modification_time(&fs::metadata(path)?))
}

#[test]
fn copy_creates_missing_destination_with_source_times() -> TestResult {
    let tmp = TempDir::new()?;
    let src = tmp.path().join("src.txt");
    let dst = tmp.path().join("nested/deeper/dst.txt");
    fs::write(&src, "payload")?;
    filetime::set_file_mtime(&src, FileTime::from_unix_time(1_600_000_000, 0))?;

    assert!(copy_if_newer(&src, &dst)?);
    assert_eq!(fs::read_to_string(&dst)?, "payload");
    assert_eq!(mtime(&dst)?, mtime(&src)?);

    // Equal mtimes: nothing to do.
    assert!(!copy_if_newer(&src, &dst)?);
    Ok(())
}

#[test]
fn newer_source_overwrites() -> TestResult {
    let tmp = TempDir::new()?;
    let src = tmp.path().join("src.txt");
    let dst = tmp.path().join("dst.txt");
    fs::write(&src, "new")?;
    fs::write(&dst, "old")?;
    filetime::set_file_mtime(&dst, FileTime::from_unix_time(1_000_000_000, 0))?;
    filetime::set_file_mtime(&src, FileTime::from_unix_time(1_000_000_100, 0))?;

    assert!(copy_if_newer(&src, &dst)?);
    assert_eq!(fs::read_to_string(&dst)?, "new");
    Ok(())
}

#[test]
fn older_source_leaves_destination_alone() -> TestResult {
    let tmp = TempDir::new()?;
    let src = tmp.path().join("src.txt");
    let dst = tmp.path().join("dst.txt");
    fs::write(&src, "stale")?;
    fs::write(&dst, "keep")?;
    filetime::set_file_mtime(&src, FileTime::from_unix_time(1_000_000_000, 0))?;
    filetime::set_file_mtime(&dst, FileTime::from_unix_time(1_000_000_100, 0))?;

    assert!(!copy_if_newer(&src, &dst)?);
    assert_eq!(fs::read_to_string(&dst)?, "keep");
    Ok(())
}

#[cfg(unix)]
#[test]
fn copy_preserves_permission_bits() -> TestResult {
    use std::os::unix::fs::PermissionsExt;

    let tmp = TempDir::new()?;
    let src = tmp.path().join("run.sh");
    let dst = tmp.path().join("out/run.sh");
    fs::write(&src, "#!/bin/sh\n")?;
    fs::set_permissions(&src, fs::Permissions::from_mode(0o750))?;

    copy_if_newer(&src, &dst)?;

    let mode = fs::metadata(&dst)?.permissions().mode() & 0o777;
    assert_eq!(mode, 0o750);
    Ok(())
}

#[test]
fn directory_match_is_mirrored_relative_to_cwd() -> TestResult {
    let tmp = TempDir::new()?;
    let cwd = tmp.path().join("report2");
    let out = tmp.path().join("out");
    fs::create_dir_all(cwd.join("flot/plugins"))?;
    fs::create_dir_all(&out)?;
    fs::write(cwd.join("flot/jquery.flot.js"), "flot")?;
    fs::write(cwd.join("flot/plugins/pie.js"), "pie")?;

    let report = stage_files(&cwd, &out, &[CopyEntry::Pattern("flot/".into())]);

    assert_eq!(fs::read_to_string(out.join("flot/jquery.flot.js"))?, "flot");
    assert_eq!(fs::read_to_string(out.join("flot/plugins/pie.js"))?, "pie");
    assert_eq!(report.copied.len(), 2);
    assert!(report.skipped.is_empty());
    Ok(())
}

#[test]
fn glob_matches_are_copied_into_explicit_destination() -> TestResult {
    let tmp = TempDir::new()?;
    let cwd = tmp.path().join("task");
    let public = tmp.path().join("public");
    fs::create_dir_all(&cwd)?;
    fs::create_dir_all(&public)?;
    fs::write(cwd.join("a.json"), "{}")?;
    fs::write(cwd.join("b.json"), "[]")?;
    fs::write(cwd.join("notes.txt"), "ignored")?;

    let entry = CopyEntry::To("*.json".into(), public.display().to_string());
    let report = stage_files(&cwd, &tmp.path().join("unused"), &[entry]);

    assert_eq!(fs::read_to_string(public.join("a.json"))?, "{}");
    assert_eq!(fs::read_to_string(public.join("b.json"))?, "[]");
    assert!(!public.join("notes.txt").exists());
    assert_eq!(report.copied.len(), 2);
    Ok(())
}

#[test]
fn file_into_non_directory_destination_is_skipped() -> TestResult {
    let tmp = TempDir::new()?;
    let cwd = tmp.path().join("task");
    fs::create_dir_all(&cwd)?;
    fs::write(cwd.join("report.csv"), "a,b")?;
    let missing = tmp.path().join("no-such-dir");

    let entry = CopyEntry::To("report.csv".into(), missing.display().to_string());
    let report = stage_files(&cwd, &tmp.path().join("out"), &[entry]);

    assert!(report.copied.is_empty());
    assert_eq!(report.skipped, vec![cwd.join("report.csv")]);
    assert!(!missing.exists());
    Ok(())
}

#[test]
fn unmatched_pattern_is_not_an_error() -> TestResult {
    let tmp = TempDir::new()?;
    let report = stage_files(
        tmp.path(),
        &tmp.path().join("out"),
        &[CopyEntry::Pattern("*.nothing".into())],
    );
    assert_eq!(report, Default::default());
    Ok(())
}
