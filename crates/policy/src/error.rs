use thiserror::Error;

/// Configuration error: the policy data cannot back a reconciliation run.
///
/// Every variant is fatal to a run; nothing here is recoverable per identity.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("policy has no global default rule (*, *)")]
    MissingGlobalDefault,

    #[error("invalid policy key ({department}, {title}): {reason}")]
    InvalidKey {
        department: String,
        title: String,
        reason: String,
    },

    #[error("duplicate policy rule {0}")]
    DuplicateKey(String),

    #[error("invalid entitlement: {0}")]
    InvalidEntitlement(String),

    #[error("failed to parse {format} policy document: {message}")]
    Parse { format: &'static str, message: String },

    #[error("unsupported policy document '{0}' (expected .toml or .json)")]
    UnsupportedFormat(String),

    #[error("failed to read policy document '{path}': {message}")]
    Io { path: String, message: String },
}
