//! Journal persistence
//!
//! Owns the `in_progress.json` document: append/update of operation records
//! and durable persistence. Every persist is atomic (write to a temp file,
//! fsync, rename over the journal path, fsync the directory) so a crash never
//! leaves a half-written journal, and the write-ahead ordering contract holds:
//! the caller persists the `planned` record before issuing the rename.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WalmendError};
use crate::journal::record::{OpStatus, OperationRecord, RunStatus};

/// State directory name under the WAL directory
pub const STATE_DIR: &str = ".rename_state";

/// Journal file name inside the state directory
pub const JOURNAL_FILE: &str = "in_progress.json";

const JOURNAL_TMP: &str = ".in_progress.json.tmp";

/// Persisted journal document
#[derive(Debug, Clone, Serialize, Deserialize)]
struct JournalDoc {
    status: RunStatus,
    started_at: String,
    segment_size: u64,
    dry_run: bool,
    operations: Vec<OperationRecord>,
}

/// The durable journal for one run
#[derive(Debug)]
pub struct Journal {
    state_dir: PathBuf,
    doc: JournalDoc,
}

impl Journal {
    /// Start a fresh journal for a new run. Creates the state directory and
    /// flushes the empty document immediately.
    pub fn create(state_dir: &Path, segment_size: u64, dry_run: bool) -> Result<Self> {
        fs::create_dir_all(state_dir)?;

        let mut journal = Self {
            state_dir: state_dir.to_path_buf(),
            doc: JournalDoc {
                status: RunStatus::InProgress,
                started_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                segment_size,
                dry_run,
                operations: Vec::new(),
            },
        };
        journal.persist()?;
        Ok(journal)
    }

    /// Load an existing journal, if any. A present-but-unreadable journal is
    /// `JournalCorrupt`: the tool must not guess at rename history.
    pub fn load(state_dir: &Path) -> Result<Option<Self>> {
        let path = state_dir.join(JOURNAL_FILE);
        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&path)?;
        let doc: JournalDoc = serde_json::from_slice(&bytes).map_err(|e| {
            WalmendError::JournalCorrupt(format!("{}: {}", path.display(), e))
        })?;

        Ok(Some(Self {
            state_dir: state_dir.to_path_buf(),
            doc,
        }))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn run_status(&self) -> RunStatus {
        self.doc.status
    }

    pub fn dry_run(&self) -> bool {
        self.doc.dry_run
    }

    pub fn segment_size(&self) -> u64 {
        self.doc.segment_size
    }

    pub fn records(&self) -> &[OperationRecord] {
        &self.doc.operations
    }

    /// Whether any record already references `name` as source or destination.
    pub fn knows_name(&self, name: &str) -> bool {
        self.doc
            .operations
            .iter()
            .any(|op| op.old_name == name || (op.new_name == name && op.status != OpStatus::Error))
    }

    // =========================================================================
    // Mutation (each call persists durably before returning)
    // =========================================================================

    /// Append a `planned` record and flush. The caller may only issue the
    /// rename after this returns Ok.
    pub fn append_planned(&mut self, record: OperationRecord) -> Result<()> {
        self.doc.operations.push(record);
        self.persist()
    }

    /// Update the status of the record for `old_name` and flush.
    pub fn mark(&mut self, old_name: &str, status: OpStatus, reason: Option<String>) -> Result<()> {
        let record = self
            .doc
            .operations
            .iter_mut()
            .rev()
            .find(|op| op.old_name == old_name)
            .ok_or_else(|| {
                WalmendError::JournalCorrupt(format!("no record for source {old_name}"))
            })?;
        record.status = status;
        record.reason = reason;
        self.persist()
    }

    /// Update the record at `index` (used by rollback, where duplicate source
    /// names across runs would make name lookup ambiguous).
    pub fn mark_at(&mut self, index: usize, status: OpStatus, reason: Option<String>) -> Result<()> {
        let record = self.doc.operations.get_mut(index).ok_or_else(|| {
            WalmendError::JournalCorrupt(format!("no record at index {index}"))
        })?;
        record.status = status;
        record.reason = reason;
        self.persist()
    }

    /// Set the run-level status and flush.
    pub fn set_run_status(&mut self, status: RunStatus) -> Result<()> {
        self.doc.status = status;
        self.persist()
    }

    /// Atomically write the document to disk and fsync it down.
    fn persist(&mut self) -> Result<()> {
        let tmp_path = self.state_dir.join(JOURNAL_TMP);
        let final_path = self.state_dir.join(JOURNAL_FILE);

        let bytes = serde_json::to_vec_pretty(&self.doc).map_err(|e| {
            WalmendError::JournalCorrupt(format!("serialize journal: {e}"))
        })?;

        let mut tmp = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;
        tmp.write_all(&bytes)?;
        tmp.sync_all()?;
        drop(tmp);

        fs::rename(&tmp_path, &final_path)?;

        // Durable only once the directory entry itself is synced.
        #[cfg(unix)]
        File::open(&self.state_dir)?.sync_all()?;

        Ok(())
    }
}
