//! Subcommand implementations.

pub mod check_policy;
pub mod reconcile;
pub mod resolve;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use rbacsync_policy::{PolicyConfig, load_policy, reference};

/// Load a policy file, or fall back to the built-in reference matrix.
pub fn policy_or_reference(path: Option<&Path>) -> Result<PolicyConfig> {
    match path {
        Some(path) => load_policy(path).with_context(|| format!("loading policy {}", path.display())),
        None => {
            info!("no policy file given; using built-in reference matrix");
            Ok(reference::reference_config())
        }
    }
}
