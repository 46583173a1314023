//! Tracing/logging setup shared by the binaries.

/// Install JSON logging for the process.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init_with(LogFormat::Json);
}

/// Subscriber configuration (filters, formats).
pub mod tracing;

pub use tracing::{AUDIT_TARGET, LogFormat, init_with};
