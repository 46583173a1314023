use serde::{Deserialize, Serialize};

use crate::{Entitlement, EntitlementSet};

/// Entitlements that automatic reconciliation never removes.
///
/// A protected entitlement may still be *added* when policy requires it; it is
/// only exempt from excess classification. Typical members are break-glass
/// admin groups granted by hand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtectedSet(EntitlementSet);

impl ProtectedSet {
    pub fn new<I, E>(entitlements: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Entitlement>,
    {
        Self(entitlements.into_iter().map(Into::<Entitlement>::into).collect())
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn contains(&self, entitlement: &Entitlement) -> bool {
        self.0.contains(entitlement)
    }

    pub fn as_set(&self) -> &EntitlementSet {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<EntitlementSet> for ProtectedSet {
    fn from(value: EntitlementSet) -> Self {
        Self(value)
    }
}
