//! Run reports and where they go.

use std::fmt::Write as _;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use rbacsync_core::RunId;

use crate::result::ReconciliationResult;
use crate::summary::RunSummary;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report to {path}: {message}")]
    Io { path: String, message: String },

    #[error("failed to serialize report: {0}")]
    Serialize(String),
}

/// Everything one run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub auto_remediate: bool,
    pub summary: RunSummary,
    pub results: Vec<ReconciliationResult>,
}

impl RunReport {
    pub fn errors(&self) -> impl Iterator<Item = &ReconciliationResult> {
        self.results.iter().filter(|r| r.is_error())
    }

    /// Identities with drift, errors excluded.
    pub fn drifted(&self) -> impl Iterator<Item = &ReconciliationResult> {
        self.results.iter().filter(|r| !r.is_error() && !r.is_compliant())
    }

    pub fn to_json(&self) -> Result<String, ReportError> {
        serde_json::to_string_pretty(self).map_err(|e| ReportError::Serialize(e.to_string()))
    }

    /// Human-readable summary for terminals.
    pub fn render_text(&self) -> String {
        let rule = "=".repeat(60);
        let s = &self.summary;
        let mut out = String::new();

        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "RBAC RECONCILIATION REPORT ({})", self.name);
        let _ = writeln!(out, "run {} at {}", self.run_id, self.started_at.to_rfc3339());
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "Identities analyzed:    {}", s.analyzed);
        let _ = writeln!(out, "Compliant:              {}", s.compliant);
        let _ = writeln!(out, "Non-compliant:          {}", s.non_compliant());
        let _ = writeln!(out, "Errors:                 {}", s.error_count);
        let _ = writeln!(out, "Missing entitlements:   {}", s.missing_count);
        let _ = writeln!(out, "Excess entitlements:    {}", s.excess_count);
        if self.auto_remediate {
            let _ = writeln!(out, "Remediated:             {}", s.remediated_count);
            let _ = writeln!(out, "Remediation failures:   {}", s.remediation_failures);
        }
        let _ = writeln!(out, "Compliance rate:        {}", s.compliance_percent());

        let drifted: Vec<_> = self.drifted().collect();
        if !drifted.is_empty() {
            let _ = writeln!(out, "\nNon-compliant identities:");
            for r in drifted {
                let _ = writeln!(out, "  {}", r.identifier_key);
                if !r.missing.is_empty() {
                    let _ = writeln!(out, "    missing: {}", r.missing.names().join(", "));
                }
                if !r.excess.is_empty() {
                    let _ = writeln!(out, "    excess:  {}", r.excess.names().join(", "));
                }
                for o in r.remediated.iter().filter(|o| !o.succeeded) {
                    let _ = writeln!(
                        out,
                        "    failed {} {}: {}",
                        o.direction,
                        o.entitlement,
                        o.detail.as_deref().unwrap_or("unknown error")
                    );
                }
            }
        }

        let errors: Vec<_> = self.errors().collect();
        if !errors.is_empty() {
            let _ = writeln!(out, "\nErrors:");
            for r in errors {
                if let Some(e) = &r.error {
                    let _ = writeln!(out, "  {}: {e}", r.identifier_key);
                }
            }
        }

        let _ = write!(out, "{rule}");
        out
    }
}

/// Destination for a finished report.
pub trait ReportSink {
    fn publish(&mut self, report: &RunReport) -> Result<(), ReportError>;
}

/// Writes the report as pretty JSON to a file.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportSink for JsonFileSink {
    fn publish(&mut self, report: &RunReport) -> Result<(), ReportError> {
        let json = report.to_json()?;
        std::fs::write(&self.path, json).map_err(|e| ReportError::Io {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;
        info!(run_id = %report.run_id, path = %self.path.display(), "report exported");
        Ok(())
    }
}

/// Writes [`RunReport::render_text`] to any writer.
#[derive(Debug)]
pub struct TextSink<W> {
    writer: W,
}

impl<W: Write> TextSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for TextSink<W> {
    fn publish(&mut self, report: &RunReport) -> Result<(), ReportError> {
        writeln!(self.writer, "{}", report.render_text()).map_err(|e| ReportError::Io {
            path: "<writer>".to_string(),
            message: e.to_string(),
        })
    }
}
