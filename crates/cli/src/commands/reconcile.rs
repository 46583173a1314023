//! `rbacsync reconcile`.
//!
//! ```text
//! rbacsync reconcile --roster staff.json --directory accounts.json
//! rbacsync reconcile --roster staff.csv --directory accounts.json --json
//! rbacsync reconcile --policy policy.toml --roster staff.json \
//!     --directory accounts.json --remediate --report run.json
//! ```
//!
//! The directory is a JSON snapshot (`{"identity": ["Group", ...]}`);
//! remediation applies to the in-memory copy, which `--snapshot-out` saves.
//!
//! Exit codes: 0 clean, 1 drift left with `--fail-on-drift`, 2 identity
//! errors or failed mutations.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use rbacsync_reconcile::{
    InMemoryDirectory, JsonFileSink, ReconciliationResult, Reconciler, ReconcilerConfig, ReportSink, RetryPolicy, Retrying,
    RunReport, TextSink, load_roster,
};

use super::policy_or_reference;

#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Policy file (.toml or .json); defaults to the built-in matrix
    #[arg(long, env = "RBACSYNC_POLICY")]
    pub policy: Option<PathBuf>,

    /// Roster file (.json array or .csv with a header row)
    #[arg(long, env = "RBACSYNC_ROSTER")]
    pub roster: PathBuf,

    /// Directory snapshot JSON
    #[arg(long, env = "RBACSYNC_DIRECTORY")]
    pub directory: PathBuf,

    /// Apply corrections instead of only reporting drift
    #[arg(long, env = "RBACSYNC_REMEDIATE", default_value_t = false)]
    pub remediate: bool,

    /// Write the JSON report to this file
    #[arg(long, env = "RBACSYNC_REPORT")]
    pub report: Option<PathBuf>,

    /// Save the directory state after the run
    #[arg(long, env = "RBACSYNC_SNAPSHOT_OUT")]
    pub snapshot_out: Option<PathBuf>,

    /// Worker threads
    #[arg(long, env = "RBACSYNC_CONCURRENCY", default_value_t = 1)]
    pub concurrency: usize,

    /// Attempts per directory call when throttled
    #[arg(long, env = "RBACSYNC_MAX_ATTEMPTS", default_value_t = 3)]
    pub max_attempts: u32,

    /// Run name used in logs and reports
    #[arg(long, env = "RBACSYNC_NAME", default_value = "rbacsync")]
    pub name: String,

    /// Print the JSON report to stdout instead of the text summary
    #[arg(long, env = "RBACSYNC_JSON", default_value_t = false)]
    pub json: bool,

    /// Exit 1 when any identity is left with drift
    #[arg(long, env = "RBACSYNC_FAIL_ON_DRIFT", default_value_t = false)]
    pub fail_on_drift: bool,
}

pub fn run(args: &ReconcileArgs) -> Result<ExitCode> {
    let policy = policy_or_reference(args.policy.as_deref())?;
    let roster = load_roster(&args.roster).with_context(|| format!("loading roster {}", args.roster.display()))?;
    let directory = InMemoryDirectory::load_snapshot(&args.directory)
        .with_context(|| format!("loading directory snapshot {}", args.directory.display()))?;

    let retry = RetryPolicy {
        max_attempts: args.max_attempts.max(1),
        ..RetryPolicy::default()
    };
    let adapter = Retrying::new(&directory, retry);

    let config = ReconcilerConfig::default()
        .with_name(args.name.clone())
        .with_auto_remediate(args.remediate)
        .with_max_concurrent(args.concurrency);
    let reconciler = Reconciler::new(policy, &adapter, &adapter).with_config(config);

    let report = reconciler.run(roster);

    if let Some(path) = &args.report {
        JsonFileSink::new(path).publish(&report)?;
    }
    if let Some(path) = &args.snapshot_out {
        write_snapshot(&directory, path)?;
    }

    if args.json {
        println!("{}", report.to_json()?);
    } else {
        TextSink::new(io::stdout().lock()).publish(&report)?;
    }

    Ok(exit_code(&report, args.fail_on_drift))
}

fn write_snapshot(directory: &InMemoryDirectory, path: &Path) -> Result<()> {
    let snapshot: BTreeMap<String, Vec<String>> = directory
        .snapshot()
        .into_iter()
        .map(|(key, set)| (key.to_string(), set.names()))
        .collect();
    let json = serde_json::to_string_pretty(&snapshot)?;
    std::fs::write(path, json).with_context(|| format!("writing snapshot {}", path.display()))
}

/// Map a finished run onto the process exit code.
pub fn exit_code(report: &RunReport, fail_on_drift: bool) -> ExitCode {
    let s = &report.summary;
    if s.error_count > 0 || s.remediation_failures > 0 {
        ExitCode::from(2)
    } else if fail_on_drift && report.results.iter().any(has_open_drift) {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

/// Drift that was not (successfully) corrected during this run.
fn has_open_drift(result: &ReconciliationResult) -> bool {
    !result.is_compliant() && result.successful_remediations() < result.missing.len() + result.excess.len()
}
