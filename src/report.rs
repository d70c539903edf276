//! Run reports
//!
//! A report is a derived, read-only aggregate: counters over a finished run
//! (or over a stored journal, for later audits). It is written once per run
//! under the state directory and never consulted as a source of truth.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::engine::RunCounters;
use crate::error::{Result, WalmendError};
use crate::journal::{Journal, OpStatus};

/// Aggregate summary of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// ISO-8601 generation time
    pub generated_at: String,

    /// "dry-run" or "execute"
    pub mode: String,

    /// Candidate files examined
    pub scanned: u64,

    /// Renames confirmed on disk
    pub renamed: u64,

    /// Renames previewed under dry-run
    pub would_rename: u64,

    /// Files already carrying their canonical name
    pub already_canonical: u64,

    /// Failures partitioned by error kind
    pub errors: BTreeMap<String, u64>,
}

impl Report {
    /// Build a report from run counters and persist it to
    /// `<dir>/.rename_state/report_<timestamp>.json`.
    pub fn generate(config: &Config, counters: &RunCounters) -> Result<Self> {
        let report = Self {
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            mode: if config.dry_run { "dry-run" } else { "execute" }.to_string(),
            scanned: counters.scanned,
            renamed: counters.renamed,
            would_rename: counters.would_rename,
            already_canonical: counters.already_canonical,
            errors: counters.errors.clone(),
        };
        report.persist(config)?;
        Ok(report)
    }

    /// Rebuild rename/error counts from a stored journal, for later audit.
    /// Validation failures were never journaled, so those counts are absent.
    pub fn from_journal(journal: &Journal) -> Self {
        let mut renamed = 0;
        let mut would_rename = 0;
        let mut errors: BTreeMap<String, u64> = BTreeMap::new();

        for op in journal.records() {
            match op.status {
                OpStatus::Completed => renamed += 1,
                OpStatus::Planned if journal.dry_run() => would_rename += 1,
                OpStatus::Planned | OpStatus::RolledBack => {}
                OpStatus::Error => {
                    let kind = op.reason.clone().unwrap_or_else(|| "FilesystemError".into());
                    *errors.entry(kind).or_insert(0) += 1;
                }
            }
        }

        Self {
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            mode: if journal.dry_run() { "dry-run" } else { "execute" }.to_string(),
            scanned: journal.records().len() as u64,
            renamed,
            would_rename,
            already_canonical: 0,
            errors,
        }
    }

    /// Total failures across all kinds.
    pub fn total_errors(&self) -> u64 {
        self.errors.values().sum()
    }

    /// Human summary block for the console.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        out.push_str("============================================================\n");
        out.push_str("WAL segment rename - run summary\n");
        out.push_str("============================================================\n");
        out.push_str(&format!("mode:              {}\n", self.mode));
        out.push_str(&format!("scanned:           {}\n", self.scanned));
        out.push_str(&format!("renamed:           {}\n", self.renamed));
        if self.mode == "dry-run" {
            out.push_str(&format!("would rename:      {}\n", self.would_rename));
        }
        out.push_str(&format!("already canonical: {}\n", self.already_canonical));
        out.push_str(&format!("errors:            {}\n", self.total_errors()));
        for (kind, count) in &self.errors {
            out.push_str(&format!("  {kind}: {count}\n"));
        }
        out.push_str("============================================================");
        out
    }

    fn persist(&self, config: &Config) -> Result<PathBuf> {
        let filename = format!("report_{}.json", Utc::now().format("%Y%m%d_%H%M%S"));
        let path = config.state_dir().join(filename);

        let bytes = serde_json::to_vec_pretty(self)
            .map_err(|e| WalmendError::JournalCorrupt(format!("serialize report: {e}")))?;
        fs::write(&path, bytes)?;

        Ok(path)
    }
}
