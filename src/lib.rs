// src/lib.rs

pub mod cli;
pub mod context;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod manifest;
pub mod types;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::context::{RunContext, epoch_now, locate_credentials};
use crate::dag::{ExecutionPlan, Unreachable};
use crate::engine::{RunSummary, Runtime, RuntimeOptions};
use crate::exec::ProcessBackend;
use crate::manifest::{ManifestDocument, load_from_path};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - manifest loading and tag filtering
/// - the run context (output dir, logical now, credentials, environment)
/// - the process backend and the scheduler runtime
pub async fn run(args: CliArgs) -> Result<()> {
    let requested: BTreeSet<String> = args.when.iter().cloned().collect();
    let manifest = load_from_path(&args.manifest, &requested)?;
    debug!(?manifest, "manifest");

    if args.dry_run {
        print_dry_run(&manifest, &requested);
        return Ok(());
    }

    if manifest.is_empty() {
        warn!(?requested, "no tasks selected; nothing to do");
        return Ok(());
    }

    let ctx = context_from_args(&args)?;
    info!(
        output_dir = ?ctx.output_dir,
        now = ctx.now_epoch,
        credentials = ?ctx.credentials,
        "run context ready"
    );

    let summary = run_manifest(manifest, Arc::new(ctx)).await?;
    info!(finished = summary.tasks.len(), "run complete");
    Ok(())
}

/// Run every task of an already-filtered manifest as real processes.
pub async fn run_manifest(manifest: ManifestDocument, ctx: Arc<RunContext>) -> Result<RunSummary> {
    let options = RuntimeOptions {
        poll_interval: ctx.poll_interval,
    };
    let backend = ProcessBackend::new(ctx);
    let runtime = Runtime::new(manifest, backend, options);
    Ok(runtime.run().await?)
}

fn context_from_args(args: &CliArgs) -> Result<RunContext> {
    let now = match args.now {
        Some(now) => now,
        None => epoch_now()?,
    };
    let credentials = locate_credentials(&args.credentials)?;

    Ok(RunContext::new(&args.output_dir, now)
        .with_credentials(credentials)
        .with_poll_interval(Duration::from_millis(args.poll_interval_ms)))
}

/// Simple dry-run output: print selected tasks and the order they can run in.
fn print_dry_run(manifest: &ManifestDocument, requested: &BTreeSet<String>) {
    println!("reportor dry-run");
    println!("  when = {:?}", requested);
    println!();

    println!("tasks ({}):", manifest.len());
    for task in manifest.iter() {
        println!("  - {}", task.name);
        match task.command {
            Some(ref cmd) => println!("      command: {cmd}"),
            None => println!("      command: (none, staging only)"),
        }
        println!("      cwd: {}", task.cwd.display());
        if !task.requires.is_empty() {
            println!("      requires: {:?}", task.requires);
        }
        if !task.locks.is_empty() {
            println!("      locks: {:?}", task.locks);
        }
        println!("      maxtime: {}s", task.maxtime.as_secs());
        if !task.copy_files.is_empty() {
            println!("      copy_files: {:?}", task.copy_files);
        }
    }

    let plan = ExecutionPlan::from_manifest(manifest);
    println!();
    println!("stages:");
    for (i, stage) in plan.stages.iter().enumerate() {
        println!("  {i}: {}", stage.join(", "));
    }

    if !plan.is_complete() {
        println!();
        println!("never ready (a run would not terminate):");
        for (name, reason) in &plan.unreachable {
            let why = match reason {
                Unreachable::MissingRequirement(req) => format!("requires '{req}', which is not selected"),
                Unreachable::Cycle => "part of a requires cycle".to_string(),
                Unreachable::Upstream(req) => format!("requires '{req}', which is never ready"),
            };
            println!("  - {name}: {why}");
        }
    }

    debug!("dry-run complete (no execution)");
}
