// src/exec/env.rs

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::Path;

use crate::context::{CREDENTIALS_VAR, NOW_VAR, OUTPUT_DIR_VAR, RunContext};

/// Environment for one task: the context's snapshot plus the reportor
/// variables. The added variables win over inherited ones.
pub fn task_environment(ctx: &RunContext, output_dir: &Path) -> Vec<(OsString, OsString)> {
    let mut env: BTreeMap<OsString, OsString> = ctx.env.iter().cloned().collect();

    env.insert(OUTPUT_DIR_VAR.into(), output_dir.as_os_str().to_owned());
    env.insert(NOW_VAR.into(), ctx.now_epoch.to_string().into());
    if let Some(ref creds) = ctx.credentials {
        env.insert(CREDENTIALS_VAR.into(), creds.as_os_str().to_owned());
    }

    env.into_iter().collect()
}
