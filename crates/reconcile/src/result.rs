//! Per-identity reconciliation output.

use serde::Serialize;

use rbacsync_core::IdentityKey;
use rbacsync_policy::{Entitlement, EntitlementSet};

use crate::diff::Discrepancies;

/// Which way a corrective action moves an entitlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Add,
    Remove,
}

impl core::fmt::Display for Direction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Direction::Add => f.write_str("add"),
            Direction::Remove => f.write_str("remove"),
        }
    }
}

/// One mutation attempt and how it went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemediationOutcome {
    pub entitlement: Entitlement,
    pub direction: Direction,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl RemediationOutcome {
    pub fn success(entitlement: Entitlement, direction: Direction) -> Self {
        Self {
            entitlement,
            direction,
            succeeded: true,
            detail: None,
        }
    }

    pub fn failure(entitlement: Entitlement, direction: Direction, detail: impl Into<String>) -> Self {
        Self {
            entitlement,
            direction,
            succeeded: false,
            detail: Some(detail.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The directory read failed; no diff was computed.
    DirectoryRead,
    /// The record itself is unusable (invalid, duplicate).
    InputRecord,
}

/// Why an identity could not be reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorDetail {
    pub fn directory_read(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::DirectoryRead,
            message: message.into(),
        }
    }

    pub fn input_record(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::InputRecord,
            message: message.into(),
        }
    }
}

impl core::fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let kind = match self.kind {
            ErrorKind::DirectoryRead => "directory read failed",
            ErrorKind::InputRecord => "invalid input record",
        };
        write!(f, "{kind}: {}", self.message)
    }
}

/// Everything known about one identity after a run.
///
/// Built once by the reconciler and not modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationResult {
    pub identifier_key: IdentityKey,
    pub missing: EntitlementSet,
    pub excess: EntitlementSet,
    pub remediated: Vec<RemediationOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

impl ReconciliationResult {
    pub(crate) fn errored(identifier_key: IdentityKey, error: ErrorDetail) -> Self {
        Self {
            identifier_key,
            missing: EntitlementSet::new(),
            excess: EntitlementSet::new(),
            remediated: Vec::new(),
            error: Some(error),
        }
    }

    pub(crate) fn diffed(
        identifier_key: IdentityKey,
        discrepancies: Discrepancies,
        remediated: Vec<RemediationOutcome>,
    ) -> Self {
        Self {
            identifier_key,
            missing: discrepancies.missing,
            excess: discrepancies.excess,
            remediated,
            error: None,
        }
    }

    /// No drift and no error.
    pub fn is_compliant(&self) -> bool {
        self.error.is_none() && self.missing.is_empty() && self.excess.is_empty()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn successful_remediations(&self) -> usize {
        self.remediated.iter().filter(|o| o.succeeded).count()
    }

    pub fn failed_remediations(&self) -> usize {
        self.remediated.iter().filter(|o| !o.succeeded).count()
    }
}
