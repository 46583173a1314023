//! `rbacsync resolve`: explain a single lookup.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use super::policy_or_reference;

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Policy file (.toml or .json); defaults to the built-in matrix
    #[arg(long, env = "RBACSYNC_POLICY")]
    pub policy: Option<PathBuf>,

    #[arg(long, short = 'd')]
    pub department: String,

    #[arg(long, short = 't')]
    pub title: String,
}

pub fn run(args: &ResolveArgs) -> Result<ExitCode> {
    let policy = policy_or_reference(args.policy.as_deref())?;
    let resolution = policy.table.explain(&args.department, &args.title);
    println!("{}", serde_json::to_string_pretty(&resolution)?);
    Ok(ExitCode::SUCCESS)
}
