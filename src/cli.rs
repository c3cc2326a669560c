// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::context::DEFAULT_CREDENTIALS_FILE;

/// Command-line arguments for `reportor`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "reportor",
    version,
    about = "Run the reports of a manifest, honoring dependencies, locks and timeouts.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the manifest (YAML, or TOML with a `.toml` extension).
    #[arg(short = 'm', long, value_name = "PATH")]
    pub manifest: PathBuf,

    /// Base output directory; each report writes to `<DIR>/<name>/`.
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Only run reports whose `when` tag is one of these.
    #[arg(value_name = "WHEN", required = true, num_args = 1..)]
    pub when: Vec<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `-v`/`-q`, then `REPORTOR_LOG`, then `info` is used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Shorthand for `--log-level debug`.
    #[arg(short, long, conflicts_with_all = ["quiet", "log_level"])]
    pub verbose: bool,

    /// Shorthand for `--log-level warn`.
    #[arg(short, long, conflicts_with = "log_level")]
    pub quiet: bool,

    /// Logical "now" exported to every report as `REPORTOR_NOW`.
    ///
    /// Default: the wall clock when the run starts.
    #[arg(long, value_name = "EPOCH_SECS")]
    pub now: Option<u64>,

    /// Credentials file exported as `REPORTOR_CREDS` when it exists.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CREDENTIALS_FILE)]
    pub credentials: PathBuf,

    /// Idle time between scheduler passes, in milliseconds.
    #[arg(
        long,
        value_name = "MS",
        default_value_t = 100,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub poll_interval_ms: u64,

    /// Parse and filter the manifest, print the plan, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// Level requested on the command line, if any.
    pub fn requested_log_level(&self) -> Option<LogLevel> {
        if let Some(level) = self.log_level {
            Some(level)
        } else if self.verbose {
            Some(LogLevel::Debug)
        } else if self.quiet {
            Some(LogLevel::Warn)
        } else {
            None
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_typical_invocation() {
        let args = CliArgs::try_parse_from([
            "reportor", "-v", "-o", "/srv/out", "-m", "reports.yml", "hourly", "daily",
        ])
        .unwrap();

        assert_eq!(args.output_dir, PathBuf::from("/srv/out"));
        assert_eq!(args.manifest, PathBuf::from("reports.yml"));
        assert_eq!(args.when, vec!["hourly", "daily"]);
        assert_eq!(args.requested_log_level(), Some(LogLevel::Debug));
        assert_eq!(args.poll_interval_ms, 100);
        assert_eq!(args.credentials, PathBuf::from("credentials.ini"));
    }

    #[test]
    fn requires_at_least_one_tag() {
        assert!(CliArgs::try_parse_from(["reportor", "-o", "out", "-m", "m.yml"]).is_err());
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        let res = CliArgs::try_parse_from([
            "reportor", "-v", "-q", "-o", "out", "-m", "m.yml", "hourly",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let res = CliArgs::try_parse_from([
            "reportor",
            "--poll-interval-ms",
            "0",
            "-o",
            "out",
            "-m",
            "m.yml",
            "hourly",
        ]);
        assert!(res.is_err());
    }
}
