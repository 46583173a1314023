//! rbacsync command-line interface.

pub mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use rbacsync_observability::LogFormat;

/// rbacsync - reconcile directory group memberships against an RBAC matrix
#[derive(Parser, Debug)]
#[command(name = "rbacsync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log output format (json or pretty)
    #[arg(long, global = true, env = "RBACSYNC_LOG_FORMAT", default_value = "json")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reconcile a roster against a directory snapshot
    Reconcile(commands::reconcile::ReconcileArgs),
    /// Show which rule answers a department/title pair
    Resolve(commands::resolve::ResolveArgs),
    /// Validate a policy file
    CheckPolicy(commands::check_policy::CheckPolicyArgs),
}

impl Cli {
    /// Run the selected command.
    pub fn run(self) -> anyhow::Result<ExitCode> {
        match self.command {
            Commands::Reconcile(args) => commands::reconcile::run(&args),
            Commands::Resolve(args) => commands::resolve::run(&args),
            Commands::CheckPolicy(args) => commands::check_policy::run(&args),
        }
    }
}
