//! Rollback: reverse replay of the journal
//!
//! Walks the journal newest-first and renames each `completed` operation back
//! to its original name, verifying the content fingerprint before and after
//! the move. Per-entry problems are warnings, not aborts; a missing source is
//! an idempotent skip. The journal file is kept as an audit trail.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::error::Result;
use crate::journal::manager::Journal;
use crate::journal::record::{OpStatus, RunStatus};
use crate::segment::file_fingerprint;

/// Counters produced by a rollback pass
#[derive(Debug, Default, Clone, Copy)]
pub struct RollbackOutcome {
    /// Renames undone
    pub rolled_back: u64,

    /// Entries whose destination was already gone (nothing to undo)
    pub skipped: u64,

    /// Entries that could not be undone cleanly
    pub warnings: u64,
}

/// Undo every `completed` operation in `journal`, newest first.
pub fn rollback_run(journal: &mut Journal, wal_dir: &Path) -> Result<RollbackOutcome> {
    let mut outcome = RollbackOutcome::default();

    // Collect targets first; mark_at below needs &mut journal.
    let targets: Vec<(usize, String, String, String)> = journal
        .records()
        .iter()
        .enumerate()
        .rev()
        .filter(|(_, op)| op.status == OpStatus::Completed)
        .map(|(i, op)| {
            (
                i,
                op.old_name.clone(),
                op.new_name.clone(),
                op.fingerprint.clone(),
            )
        })
        .collect();

    for (index, old_name, new_name, expected_fp) in targets {
        let new_path = wal_dir.join(&new_name);
        let old_path = wal_dir.join(&old_name);

        // Already rolled back (or removed externally): idempotent skip.
        if !new_path.exists() {
            info!(file = %new_name, "rollback target absent, skipping");
            outcome.skipped += 1;
            continue;
        }

        if old_path.exists() {
            warn!(
                from = %new_name,
                to = %old_name,
                "original name is occupied, refusing to overwrite"
            );
            outcome.warnings += 1;
            continue;
        }

        // Verify we are about to move the file the journal remembers.
        match file_fingerprint(&new_path) {
            Ok(fp) if fp == expected_fp => {}
            Ok(fp) => {
                warn!(
                    file = %new_name,
                    expected = %expected_fp,
                    found = %fp,
                    "fingerprint changed since rename, leaving file in place"
                );
                outcome.warnings += 1;
                continue;
            }
            Err(e) => {
                warn!(file = %new_name, error = %e, "cannot fingerprint rollback target");
                outcome.warnings += 1;
                continue;
            }
        }

        if let Err(e) = fs::rename(&new_path, &old_path) {
            warn!(from = %new_name, to = %old_name, error = %e, "rollback rename failed");
            outcome.warnings += 1;
            continue;
        }

        // Re-verify after the move; a mismatch here means something raced us.
        match file_fingerprint(&old_path) {
            Ok(fp) if fp == expected_fp => {
                journal.mark_at(index, OpStatus::RolledBack, None)?;
                info!(from = %new_name, to = %old_name, "rolled back");
                outcome.rolled_back += 1;
            }
            Ok(_) | Err(_) => {
                journal.mark_at(
                    index,
                    OpStatus::RolledBack,
                    Some("fingerprint mismatch after rollback".to_string()),
                )?;
                warn!(file = %old_name, "fingerprint mismatch after rollback rename");
                outcome.rolled_back += 1;
                outcome.warnings += 1;
            }
        }
    }

    let status = if outcome.warnings == 0 {
        RunStatus::RolledBack
    } else {
        RunStatus::RolledBackWithWarnings
    };
    journal.set_run_status(status)?;

    Ok(outcome)
}
