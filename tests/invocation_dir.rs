// tests/invocation_dir.rs
//
// Behaviour that depends on the process working directory. Each test moves
// into its own temp dir while holding CWD_LOCK.

use std::env;
use std::error::Error;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use reportor::context::{CREDENTIALS_VAR, DEFAULT_CREDENTIALS_FILE, RunContext, locate_credentials};
use reportor::exec::env::task_environment;
use reportor::exec::stage_files;
use reportor::types::CopyEntry;
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn Error>>;

static CWD_LOCK: Mutex<()> = Mutex::new(());

/// Restores the previous working directory on drop.
struct InDir {
    previous: PathBuf,
}

impl InDir {
    fn enter(dir: &Path) -> std::io::Result<Self> {
        let previous = env::current_dir()?;
        env::set_current_dir(dir)?;
        Ok(Self { previous })
    }
}

impl Drop for InDir {
    fn drop(&mut self) {
        let _ = env::set_current_dir(&self.previous);
    }
}

#[test]
fn nested_directory_is_mirrored_relative_to_dot_cwd() -> TestResult {
    let _guard = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let tmp = TempDir::new()?;
    fs::create_dir_all(tmp.path().join("sub/flot/plugins"))?;
    fs::write(tmp.path().join("sub/flot/x.js"), "x")?;
    fs::write(tmp.path().join("sub/flot/plugins/y.js"), "y")?;
    let out = tmp.path().join("out");
    fs::create_dir_all(&out)?;

    let _cwd = InDir::enter(tmp.path())?;

    let report = stage_files(Path::new("."), &out, &[CopyEntry::Pattern("sub/flot/".into())]);
    assert_eq!(fs::read_to_string(out.join("sub/flot/x.js"))?, "x");
    assert_eq!(fs::read_to_string(out.join("sub/flot/plugins/y.js"))?, "y");
    assert!(!out.join("flot").exists());
    assert_eq!(report.copied.len(), 2);

    let nested_out = tmp.path().join("nested-out");
    fs::create_dir_all(&nested_out)?;
    let report = stage_files(Path::new("./sub"), &nested_out, &[CopyEntry::Pattern("flot/".into())]);
    assert_eq!(fs::read_to_string(nested_out.join("flot/x.js"))?, "x");
    assert_eq!(fs::read_to_string(nested_out.join("flot/plugins/y.js"))?, "y");
    assert!(report.skipped.is_empty());

    Ok(())
}

#[test]
fn credentials_in_invocation_dir_reach_the_task_environment() -> TestResult {
    let _guard = CWD_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let tmp = TempDir::new()?;
    fs::write(tmp.path().join(DEFAULT_CREDENTIALS_FILE), "[db]\nuser = r\n")?;

    let _cwd = InDir::enter(tmp.path())?;

    let found = locate_credentials(Path::new(DEFAULT_CREDENTIALS_FILE))?
        .ok_or("credentials.ini not found")?;
    assert!(found.is_absolute());
    assert_eq!(found, env::current_dir()?.join(DEFAULT_CREDENTIALS_FILE));

    let ctx = RunContext::new(tmp.path().join("out"), 0).with_credentials(Some(found.clone()));
    let vars = task_environment(&ctx, &ctx.task_output_dir("report1"));
    let exported = vars
        .iter()
        .find(|(k, _)| k == CREDENTIALS_VAR)
        .map(|(_, v)| v.clone());
    assert_eq!(exported, Some(OsString::from(found)));

    Ok(())
}
