//! Identity records fed into a run.

use serde::{Deserialize, Serialize};

use rbacsync_core::{DomainError, DomainResult, Entity, IdentityKey};

pub const MIN_IDENTIFIER_LEN: usize = 3;
pub const MAX_IDENTIFIER_LEN: usize = 64;

/// One subject to reconcile, as exported by an HR roster or directory listing.
///
/// Only `identifier_key`, `department` and `title` drive reconciliation; the
/// remaining fields ride along for reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub identifier_key: IdentityKey,
    pub department: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<String>,
    /// Set when the source entry could not be read; such a record never validates.
    #[serde(skip)]
    rejection: Option<String>,
}

impl IdentityRecord {
    pub fn new(
        identifier_key: impl Into<IdentityKey>,
        department: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            identifier_key: identifier_key.into(),
            department: department.into(),
            title: title.into(),
            email: None,
            display_name: None,
            manager: None,
            rejection: None,
        }
    }

    /// Placeholder for a source entry that could not be read.
    ///
    /// It keeps the entry's place in the run and fails as an input-record
    /// error instead of aborting the whole roster.
    pub fn malformed(identifier_key: impl Into<IdentityKey>, reason: impl Into<String>) -> Self {
        Self {
            rejection: Some(reason.into()),
            ..Self::new(identifier_key, "", "")
        }
    }

    pub fn rejection(&self) -> Option<&str> {
        self.rejection.as_deref()
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_manager(mut self, manager: impl Into<String>) -> Self {
        self.manager = Some(manager.into());
        self
    }

    /// Reject records that cannot name a real account.
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(reason) = &self.rejection {
            return Err(DomainError::validation(format!("malformed roster entry: {reason}")));
        }
        let len = self.identifier_key.as_str().chars().count();
        if !(MIN_IDENTIFIER_LEN..=MAX_IDENTIFIER_LEN).contains(&len) {
            return Err(DomainError::validation(format!(
                "identifier '{}' must be {MIN_IDENTIFIER_LEN}-{MAX_IDENTIFIER_LEN} characters",
                self.identifier_key
            )));
        }
        if self.department.is_empty() {
            return Err(DomainError::validation("department is empty"));
        }
        if self.title.is_empty() {
            return Err(DomainError::validation("title is empty"));
        }
        if let Some(email) = &self.email {
            if !email.contains('@') {
                return Err(DomainError::validation(format!("email '{email}' has no '@'")));
            }
        }
        Ok(())
    }
}

impl Entity for IdentityRecord {
    type Id = IdentityKey;

    fn id(&self) -> &Self::Id {
        &self.identifier_key
    }
}
