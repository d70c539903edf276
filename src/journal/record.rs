//! Journal record definitions
//!
//! Defines the persisted shape of one rename operation and the run-level
//! status. Records only ever move forward; rollback adds a terminal
//! `rolled_back` marker instead of rewriting history.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Status of a single rename operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpStatus {
    /// Durably journaled, rename not (yet) confirmed
    Planned,

    /// Rename confirmed on disk
    Completed,

    /// Rename refused or failed; source file untouched
    Error,

    /// Undone by a rollback pass
    RolledBack,
}

/// Status of the whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    InProgress,
    Completed,
    RolledBack,
    RolledBackWithWarnings,
}

/// One attempted rename, as persisted in the journal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRecord {
    /// ISO-8601 creation time of the record
    pub timestamp: String,

    /// Name the file had when it was discovered
    pub old_name: String,

    /// Canonical name derived from the page header
    pub new_name: String,

    /// Content fingerprint taken at plan time
    pub fingerprint: String,

    /// Current state of the operation
    pub status: OpStatus,

    /// Error-kind label or rollback note, when status is error/rolled_back
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl OperationRecord {
    /// Create a fresh record in `planned` state.
    pub fn planned(old_name: &str, new_name: &str, fingerprint: &str) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            old_name: old_name.to_string(),
            new_name: new_name.to_string(),
            fingerprint: fingerprint.to_string(),
            status: OpStatus::Planned,
            reason: None,
        }
    }
}
