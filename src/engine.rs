//! Rename Engine
//!
//! The orchestrator that coordinates all components.
//!
//! ## Responsibilities
//! - Scan the WAL directory for candidate files
//! - Drive the per-file state machine:
//!   `Discovered → {Invalid→Error, AlreadyCanonical→Skip, Valid→Planned → Applied | ApplyError}`
//! - Enforce write-ahead ordering: journal entry flushed before any rename
//! - Resume an interrupted run from its journal
//!
//! This is the only component that mutates the filesystem, and it does so
//! strictly sequentially: renames must stay ordered with journal writes for
//! the crash-safety contract to hold.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{Result, WalmendError};
use crate::journal::{Journal, OpStatus, OperationRecord, RunStatus};
use crate::report::Report;
use crate::segment::{
    derive_canonical_name, file_fingerprint, parse_header, validate, Verdict,
};

/// Per-run counters, aggregated into the final report
#[derive(Debug, Default, Clone)]
pub struct RunCounters {
    /// Candidate files examined (including ones settled during resume)
    pub scanned: u64,

    /// Renames confirmed on disk
    pub renamed: u64,

    /// Renames planned but not applied (dry-run)
    pub would_rename: u64,

    /// Files whose name already matched their canonical name
    pub already_canonical: u64,

    /// Per-file failures, partitioned by error kind
    pub errors: BTreeMap<String, u64>,
}

impl RunCounters {
    fn count_error(&mut self, kind: &str) {
        *self.errors.entry(kind.to_string()).or_insert(0) += 1;
    }

    pub fn total_errors(&self) -> u64 {
        self.errors.values().sum()
    }
}

/// The rename orchestrator
pub struct RenameEngine {
    config: Config,
    journal: Journal,
    counters: RunCounters,
}

impl RenameEngine {
    /// Open an engine for a run: create the state directory, then either
    /// resume the journal an interrupted run left behind or start a fresh one.
    ///
    /// A leftover dry-run journal is replaced rather than resumed: a dry run
    /// never mutated anything, so there is nothing to converge on.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let state_dir = config.state_dir();
        fs::create_dir_all(&state_dir)?;

        let mut counters = RunCounters::default();

        let journal = match Journal::load(&state_dir)? {
            Some(existing)
                if existing.run_status() == RunStatus::InProgress && !existing.dry_run() =>
            {
                // Resuming means re-issuing renames; a dry-run invocation
                // must not do that, and silently replacing the journal would
                // discard the rollback record of the interrupted run.
                if config.dry_run {
                    return Err(WalmendError::JournalCorrupt(
                        "an interrupted run is pending; resume without --dry-run or roll back first"
                            .to_string(),
                    ));
                }
                info!(
                    records = existing.records().len(),
                    "resuming interrupted run from journal"
                );
                let mut journal = existing;
                Self::resume(&mut journal, &config, &mut counters)?;
                journal
            }
            _ => Journal::create(&state_dir, config.segment_size, config.dry_run)?,
        };

        Ok(Self {
            config,
            journal,
            counters,
        })
    }

    /// Process the directory and return the final report.
    pub fn run(mut self) -> Result<Report> {
        info!(
            dir = %self.config.wal_dir.display(),
            segment_size = self.config.segment_size,
            dry_run = self.config.dry_run,
            "scan started"
        );

        for path in self.candidate_files()? {
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(n) => n.to_string(),
                None => continue, // non-UTF-8 names cannot be canonical
            };

            // Settled during resume (either as source or destination).
            if self.journal.knows_name(&name) {
                debug!(file = %name, "already journaled, skipping");
                continue;
            }

            self.counters.scanned += 1;
            self.process_file(&path, &name)?;
        }

        self.journal.set_run_status(RunStatus::Completed)?;

        let report = Report::generate(&self.config, &self.counters)?;
        info!(
            scanned = self.counters.scanned,
            renamed = self.counters.renamed,
            would_rename = self.counters.would_rename,
            already_canonical = self.counters.already_canonical,
            errors = self.counters.total_errors(),
            "run complete"
        );
        Ok(report)
    }

    /// Counters accumulated so far (for tests and callers that skip `run`).
    pub fn counters(&self) -> &RunCounters {
        &self.counters
    }

    // =========================================================================
    // Per-file state machine
    // =========================================================================

    fn process_file(&mut self, path: &Path, name: &str) -> Result<()> {
        // Step 1: parse the page header (read-only).
        let header = match parse_header(path) {
            Ok(h) => h,
            Err(e) => {
                error!(file = %name, error = %e, "header parse failed");
                self.counters.count_error(e.kind());
                return Ok(());
            }
        };

        // Step 2: validate (physical, header, consistency).
        let file_size = match fs::metadata(path) {
            Ok(m) => m.len(),
            Err(e) => {
                let e = WalmendError::Filesystem {
                    path: path.display().to_string(),
                    source: e,
                };
                error!(file = %name, error = %e, "cannot stat file");
                self.counters.count_error(e.kind());
                return Ok(());
            }
        };
        let verdict = validate(
            &header,
            file_size,
            self.config.segment_size,
            self.config.allow_unsupported_version,
        );
        match verdict {
            Verdict::Invalid { issues } => {
                for issue in &issues {
                    error!(file = %name, kind = issue.kind, detail = %issue.detail, "validation failed");
                }
                if let Some(first_fatal) = issues.iter().find(|i| i.fatal) {
                    self.counters.count_error(first_fatal.kind);
                }
                return Ok(());
            }
            Verdict::Valid { warnings } => {
                for w in &warnings {
                    warn!(file = %name, kind = w.kind, detail = %w.detail, "validation warning");
                }
            }
        }

        // Step 3: derive the canonical name.
        let canonical = match derive_canonical_name(
            header.timeline_id,
            header.page_address,
            self.config.segment_size,
        ) {
            Ok(n) => n,
            Err(e) => {
                error!(file = %name, error = %e, "name derivation failed");
                self.counters.count_error(e.kind());
                return Ok(());
            }
        };

        // Step 4: already canonical? Counted no-op, no journal entry.
        if name == canonical {
            debug!(file = %name, "already canonical");
            self.counters.already_canonical += 1;
            return Ok(());
        }

        // Step 5: plan. The journal write is flushed before any rename
        // syscall; a crash after this point is recovered by resume.
        let fingerprint = match file_fingerprint(path) {
            Ok(fp) => fp,
            Err(e) => {
                error!(file = %name, error = %e, "fingerprint failed");
                self.counters.count_error(e.kind());
                return Ok(());
            }
        };
        self.journal
            .append_planned(OperationRecord::planned(name, &canonical, &fingerprint))?;

        // Step 6: apply (or keep planned under dry-run).
        if self.config.dry_run {
            info!(old = %name, new = %canonical, "would rename (dry-run)");
            self.counters.would_rename += 1;
            return Ok(());
        }

        self.apply_rename(name, &canonical)
    }

    /// Issue the rename for an already-journaled plan and record the outcome.
    fn apply_rename(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        let old_path = self.config.wal_dir.join(old_name);
        let new_path = self.config.wal_dir.join(new_name);

        // Precondition: destination must be absent. Two sources deriving the
        // same canonical name must never merge.
        if new_path.exists() {
            let e = WalmendError::RenameCollision(new_name.to_string());
            error!(old = %old_name, new = %new_name, "rename refused: destination exists");
            self.journal
                .mark(old_name, OpStatus::Error, Some(e.kind().to_string()))?;
            self.counters.count_error(e.kind());
            return Ok(());
        }

        match fs::rename(&old_path, &new_path) {
            Ok(()) => {
                self.journal.mark(old_name, OpStatus::Completed, None)?;
                info!(old = %old_name, new = %new_name, "renamed");
                self.counters.renamed += 1;
            }
            Err(e) => {
                let e = WalmendError::Filesystem {
                    path: old_path.display().to_string(),
                    source: e,
                };
                error!(old = %old_name, new = %new_name, error = %e, "rename failed");
                self.journal
                    .mark(old_name, OpStatus::Error, Some(e.kind().to_string()))?;
                self.counters.count_error(e.kind());
            }
        }
        Ok(())
    }

    // =========================================================================
    // Resume
    // =========================================================================

    /// Re-settle every record of an interrupted run so the final counts
    /// converge on what a single uninterrupted run would have produced.
    ///
    /// A `planned` record means the rename may or may not have happened:
    /// if the destination exists and the source does not, the rename landed
    /// and the record is reclassified `completed`; if the source still
    /// exists, the rename is re-attempted after confirming the file is still
    /// the one that was planned (fingerprint check).
    fn resume(journal: &mut Journal, config: &Config, counters: &mut RunCounters) -> Result<()> {
        let pending: Vec<OperationRecord> = journal.records().to_vec();

        for record in pending {
            match record.status {
                OpStatus::Completed => {
                    counters.scanned += 1;
                    counters.renamed += 1;
                }
                OpStatus::Error => {
                    counters.scanned += 1;
                    let kind = record.reason.as_deref().unwrap_or("FilesystemError");
                    counters.count_error(kind);
                }
                OpStatus::RolledBack => {}
                OpStatus::Planned => {
                    counters.scanned += 1;
                    Self::resume_planned(journal, config, counters, &record)?;
                }
            }
        }
        Ok(())
    }

    fn resume_planned(
        journal: &mut Journal,
        config: &Config,
        counters: &mut RunCounters,
        record: &OperationRecord,
    ) -> Result<()> {
        let old_path = config.wal_dir.join(&record.old_name);
        let new_path = config.wal_dir.join(&record.new_name);

        let old_exists = old_path.exists();
        let new_exists = new_path.exists();

        if new_exists && !old_exists {
            // The rename landed before the crash.
            info!(old = %record.old_name, new = %record.new_name, "resume: rename already applied");
            journal.mark(&record.old_name, OpStatus::Completed, None)?;
            counters.renamed += 1;
            return Ok(());
        }

        if !old_exists {
            // Neither name present: the file is gone, nothing safe to do.
            warn!(old = %record.old_name, "resume: source vanished, marking error");
            journal.mark(
                &record.old_name,
                OpStatus::Error,
                Some("FilesystemError".to_string()),
            )?;
            counters.count_error("FilesystemError");
            return Ok(());
        }

        if new_exists {
            // Source and a distinct destination both present: collision.
            warn!(old = %record.old_name, new = %record.new_name, "resume: destination occupied");
            journal.mark(
                &record.old_name,
                OpStatus::Error,
                Some("RenameCollision".to_string()),
            )?;
            counters.count_error("RenameCollision");
            return Ok(());
        }

        // Tamper check: only redo the rename if the source is still the file
        // that was planned.
        match file_fingerprint(&old_path) {
            Ok(fp) if fp == record.fingerprint => {}
            Ok(_) => {
                warn!(old = %record.old_name, "resume: source changed since plan, marking error");
                journal.mark(
                    &record.old_name,
                    OpStatus::Error,
                    Some("FilesystemError".to_string()),
                )?;
                counters.count_error("FilesystemError");
                return Ok(());
            }
            Err(e) => {
                warn!(old = %record.old_name, error = %e, "resume: cannot fingerprint source");
                journal.mark(&record.old_name, OpStatus::Error, Some(e.kind().to_string()))?;
                counters.count_error(e.kind());
                return Ok(());
            }
        }

        match fs::rename(&old_path, &new_path) {
            Ok(()) => {
                info!(old = %record.old_name, new = %record.new_name, "resume: rename re-applied");
                journal.mark(&record.old_name, OpStatus::Completed, None)?;
                counters.renamed += 1;
            }
            Err(e) => {
                error!(old = %record.old_name, error = %e, "resume: rename failed");
                journal.mark(
                    &record.old_name,
                    OpStatus::Error,
                    Some("FilesystemError".to_string()),
                )?;
                counters.count_error("FilesystemError");
            }
        }
        Ok(())
    }

    // =========================================================================
    // Discovery
    // =========================================================================

    /// Candidate files: regular files directly in the WAL directory, sorted
    /// by name. Dot-prefixed entries (state dir, logs) are never candidates.
    fn candidate_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in fs::read_dir(&self.config.wal_dir)? {
            let entry = entry?;
            let path = entry.path();

            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with('.') {
                    continue;
                }
            }
            files.push(path);
        }

        files.sort();
        Ok(files)
    }
}

/// Roll back a previously completed (or interrupted) run in `config.wal_dir`.
///
/// Returns the run-level status the journal was left with, or an error if no
/// journal exists or it cannot be read.
pub fn rollback(config: &Config) -> Result<RunStatus> {
    let state_dir = config.state_dir();
    let mut journal = Journal::load(&state_dir)?.ok_or_else(|| {
        WalmendError::JournalCorrupt(format!(
            "no journal found under {}",
            state_dir.display()
        ))
    })?;

    let outcome = crate::journal::rollback_run(&mut journal, &config.wal_dir)?;
    info!(
        rolled_back = outcome.rolled_back,
        skipped = outcome.skipped,
        warnings = outcome.warnings,
        "rollback complete"
    );

    Ok(journal.run_status())
}
