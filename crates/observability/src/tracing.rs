//! Subscriber setup.
//!
//! Output is filtered through `RUST_LOG` (default `info`). Mutation audit
//! events are emitted under the `rbacsync::audit` target, so
//! `RUST_LOG=rbacsync::audit=info` isolates the audit trail.

use core::str::FromStr;

use tracing_subscriber::EnvFilter;

/// Target carried by every entitlement mutation event.
pub const AUDIT_TARGET: &str = "rbacsync::audit";

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event
    #[default]
    Json,
    /// Human-readable, for terminals
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => Err(format!("unknown log format '{other}' (expected json or pretty)")),
        }
    }
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Later calls are no-ops.
///
/// Logs go to stderr so stdout stays free for reports.
pub fn init_with(format: LogFormat) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::SystemTime);

    let _ = match format {
        LogFormat::Json => builder.json().with_target(true).try_init(),
        LogFormat::Pretty => builder.with_target(true).try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn audit_target_is_filterable_by_directive() {
        let directive: tracing_subscriber::filter::Directive = format!("{AUDIT_TARGET}=info").parse().unwrap();
        assert_eq!(directive.to_string(), "rbacsync::audit=info");
    }

    #[test]
    fn init_is_idempotent() {
        crate::init();
        init_with(LogFormat::Pretty);
        init_with(LogFormat::Json);
        tracing::info!(target: AUDIT_TARGET, "still fine");
    }
}
