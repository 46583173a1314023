//! Roster loading.
//!
//! A roster is either a JSON array of identity objects or a CSV export with a
//! header row; [`load_roster`] picks the format by file extension. Field names
//! from common HR exports are accepted as aliases (`username`, `Role`,
//! `FirstName`, ...).
//!
//! Entries are read one at a time. An entry that cannot be read becomes an
//! [`IdentityRecord::malformed`] placeholder, so it fails alone during the run
//! while the rest of the roster is reconciled. Only a roster that is not an
//! array (JSON) or cannot be read at all is rejected as a whole.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use rbacsync_core::IdentityKey;

use crate::identity::IdentityRecord;

/// Title assumed when a roster entry carries none.
pub const DEFAULT_TITLE: &str = "Employee";

/// Fields that may carry the identifier, in lookup order.
const KEY_FIELDS: &[&str] = &["identifier_key", "username", "Username", "user_id"];

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("failed to read roster {path}: {message}")]
    Io { path: String, message: String },

    #[error("invalid roster: {0}")]
    Parse(String),

    #[error("unsupported roster '{0}' (expected .json or .csv)")]
    UnsupportedFormat(String),
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

#[derive(Debug, Deserialize)]
struct RosterEntry {
    #[serde(default, alias = "username", alias = "Username", alias = "user_id")]
    identifier_key: String,
    #[serde(default, alias = "Department", alias = "dept")]
    department: String,
    #[serde(default = "default_title", alias = "role", alias = "Role", alias = "job_title")]
    title: String,
    #[serde(default, alias = "Email")]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default, alias = "FirstName")]
    first_name: Option<String>,
    #[serde(default, alias = "LastName")]
    last_name: Option<String>,
    #[serde(default, alias = "Manager")]
    manager: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl From<RosterEntry> for IdentityRecord {
    fn from(entry: RosterEntry) -> Self {
        let display_name = non_blank(entry.display_name).or_else(|| {
            match (non_blank(entry.first_name), non_blank(entry.last_name)) {
                (Some(first), Some(last)) => Some(format!("{first} {last}")),
                (Some(one), None) | (None, Some(one)) => Some(one),
                (None, None) => None,
            }
        });

        // CSV exports carry an empty cell rather than no column.
        let title = match entry.title.trim() {
            "" => DEFAULT_TITLE,
            t => t,
        };

        let mut record = IdentityRecord::new(
            IdentityKey::new(entry.identifier_key.trim()),
            entry.department.trim(),
            title,
        );
        record.email = non_blank(entry.email);
        record.display_name = display_name;
        record.manager = non_blank(entry.manager);
        record
    }
}

/// Key used for an entry that could not be read: its identifier when one is
/// recoverable, otherwise its position.
fn fallback_key(found: Option<&str>, position: usize) -> IdentityKey {
    match found.map(str::trim).filter(|k| !k.is_empty()) {
        Some(key) => IdentityKey::new(key),
        None => IdentityKey::new(format!("roster entry #{position}")),
    }
}

fn malformed(key: IdentityKey, position: usize, reason: String) -> IdentityRecord {
    warn!(identity = %key, position, error = %reason, "unreadable roster entry");
    IdentityRecord::malformed(key, reason)
}

/// Parse a JSON array roster.
pub fn parse_roster(json: &str) -> Result<Vec<IdentityRecord>, RosterError> {
    let entries: Vec<Value> = serde_json::from_str(json).map_err(|e| RosterError::Parse(e.to_string()))?;

    Ok(entries
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            let position = i + 1;
            match RosterEntry::deserialize(&value) {
                Ok(entry) => IdentityRecord::from(entry),
                Err(e) => {
                    let found = KEY_FIELDS.iter().find_map(|f| value.get(*f).and_then(Value::as_str));
                    malformed(fallback_key(found, position), position, e.to_string())
                }
            }
        })
        .collect())
}

/// Parse a CSV roster with a header row.
pub fn parse_roster_csv(csv: &str) -> Result<Vec<IdentityRecord>, RosterError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(csv.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| RosterError::Parse(e.to_string()))?
        .clone();
    let key_column = KEY_FIELDS
        .iter()
        .find_map(|f| headers.iter().position(|h| h == *f));

    Ok(reader
        .records()
        .enumerate()
        .map(|(i, row)| {
            let position = i + 1;
            let mut row = match row {
                Ok(row) => row,
                Err(e) => return malformed(fallback_key(None, position), position, e.to_string()),
            };
            // Trailing empty cells are often dropped by exports.
            while row.len() < headers.len() {
                row.push_field("");
            }
            match row.deserialize::<RosterEntry>(Some(&headers)) {
                Ok(entry) => IdentityRecord::from(entry),
                Err(e) => {
                    let found = key_column.and_then(|c| row.get(c));
                    malformed(fallback_key(found, position), position, e.to_string())
                }
            }
        })
        .collect())
}

/// Load a roster, choosing the format by extension (`.json` or `.csv`).
pub fn load_roster(path: impl AsRef<Path>) -> Result<Vec<IdentityRecord>, RosterError> {
    let path = path.as_ref();
    let shown = path.display().to_string();

    let raw = std::fs::read_to_string(path).map_err(|e| RosterError::Io {
        path: shown.clone(),
        message: e.to_string(),
    })?;

    let records = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => parse_roster(&raw)?,
        Some("csv") => parse_roster_csv(&raw)?,
        _ => return Err(RosterError::UnsupportedFormat(shown)),
    };

    let malformed = records.iter().filter(|r| r.rejection().is_some()).count();
    info!(path = %path.display(), records = records.len(), malformed, "roster loaded");
    Ok(records)
}
