// src/manifest/validate.rs

use std::path::Path;

use crate::errors::{ReportorError, Result};
use crate::manifest::model::RawTaskSpec;
use crate::types::{CommandSpec, TaskName};

/// Basic semantic checks on the selected tasks.
///
/// This checks:
/// - `stdout` / `stderr` are relative paths (they live under the output dir)
/// - an argument-list `command` is not empty
///
/// It does **not** check `requires` references: a task whose requirement
/// never finishes simply stays pending.
pub fn validate_tasks(tasks: &[(TaskName, RawTaskSpec)]) -> Result<()> {
    for (name, spec) in tasks {
        validate_output_path(name, "stdout", &spec.stdout)?;
        validate_output_path(name, "stderr", &spec.stderr)?;
        validate_command(name, spec.command.as_ref())?;
    }
    Ok(())
}

fn validate_output_path(name: &str, field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ReportorError::ManifestError(format!(
            "task '{}' has an empty `{}` path",
            name, field
        )));
    }
    if Path::new(value).is_absolute() {
        return Err(ReportorError::ManifestError(format!(
            "task '{}' has absolute `{}` path '{}'; it must be relative to the output directory",
            name, field, value
        )));
    }
    Ok(())
}

fn validate_command(name: &str, command: Option<&CommandSpec>) -> Result<()> {
    if let Some(CommandSpec::Argv(args)) = command {
        if args.is_empty() {
            return Err(ReportorError::ManifestError(format!(
                "task '{}' has an empty `command` list",
                name
            )));
        }
    }
    Ok(())
}
