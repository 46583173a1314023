//! `rbacsync check-policy`: load and validate a policy file.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use rbacsync_policy::PolicyDocument;

use super::policy_or_reference;

#[derive(Args, Debug)]
pub struct CheckPolicyArgs {
    /// Policy file (.toml or .json)
    #[arg(long, env = "RBACSYNC_POLICY")]
    pub policy: PathBuf,

    /// Print the normalized policy as JSON
    #[arg(long, default_value_t = false)]
    pub dump: bool,
}

pub fn run(args: &CheckPolicyArgs) -> Result<ExitCode> {
    let config = policy_or_reference(Some(&args.policy))?;

    if args.dump {
        let document = PolicyDocument::from_config(&config);
        println!("{}", serde_json::to_string_pretty(&document)?);
    } else {
        println!(
            "policy ok: {} rules, {} distinct entitlements, {} protected",
            config.table.len(),
            config.table.all_entitlements().len(),
            config.protected.len()
        );
    }
    Ok(ExitCode::SUCCESS)
}
