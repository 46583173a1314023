//! Drift computation between required and current entitlements.

use serde::Serialize;

use rbacsync_policy::{EntitlementSet, ProtectedSet};

/// Result of diffing one identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Discrepancies {
    /// Required but not held, in `required` order.
    pub missing: EntitlementSet,
    /// Held, not required and not protected, in `current` order.
    pub excess: EntitlementSet,
}

impl Discrepancies {
    pub fn is_compliant(&self) -> bool {
        self.missing.is_empty() && self.excess.is_empty()
    }
}

/// `missing = required − current`, `excess = current − required − protected`.
///
/// Pure; set membership is the contract, order follows the source sets.
pub fn compute_discrepancies(
    required: &EntitlementSet,
    current: &EntitlementSet,
    protected: &ProtectedSet,
) -> Discrepancies {
    let missing = required.difference(current).collect();
    let excess = current
        .difference(required)
        .filter(|e| !protected.contains(e))
        .collect();

    Discrepancies { missing, excess }
}
