use serde::{Deserialize, Serialize};

use crate::PolicyError;

/// Pattern literal for "any department" / "any title" in policy documents.
///
/// Only the loader and the `(department, title)` pattern constructor know about
/// it; inside the table a wildcard is a [`PolicyKey`] variant, never a string, so a
/// department literally named `*` in a roster cannot collide with it.
pub const WILDCARD: &str = "*";

/// Key of one rule in the policy matrix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyKey {
    /// `(department, title)`
    Exact { department: String, title: String },
    /// `(department, *)`
    DepartmentWildcard { department: String },
    /// `(*, *)`
    GlobalDefault,
}

impl PolicyKey {
    pub fn exact(department: impl Into<String>, title: impl Into<String>) -> Self {
        Self::Exact {
            department: department.into(),
            title: title.into(),
        }
    }

    pub fn department(department: impl Into<String>) -> Self {
        Self::DepartmentWildcard {
            department: department.into(),
        }
    }

    /// Interpret a `(department, title)` pattern pair from policy data.
    ///
    /// `(*, title)` is rejected: title-only rules have no lookup tier.
    pub fn from_pattern(department: &str, title: &str) -> Result<Self, PolicyError> {
        match (department, title) {
            (WILDCARD, WILDCARD) => Ok(Self::GlobalDefault),
            (WILDCARD, _) => Err(PolicyError::InvalidKey {
                department: department.to_string(),
                title: title.to_string(),
                reason: "a title rule needs a concrete department".to_string(),
            }),
            ("", _) | (_, "") => Err(PolicyError::InvalidKey {
                department: department.to_string(),
                title: title.to_string(),
                reason: "department and title must be non-empty".to_string(),
            }),
            (d, WILDCARD) => Ok(Self::department(d)),
            (d, t) => Ok(Self::exact(d, t)),
        }
    }

    /// Pattern pair as written in policy documents.
    pub fn as_pattern(&self) -> (&str, &str) {
        match self {
            Self::Exact { department, title } => (department, title),
            Self::DepartmentWildcard { department } => (department, WILDCARD),
            Self::GlobalDefault => (WILDCARD, WILDCARD),
        }
    }
}

impl core::fmt::Display for PolicyKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let (d, t) = self.as_pattern();
        write!(f, "({d}, {t})")
    }
}
