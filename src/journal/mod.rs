//! Durable rename journal
//!
//! The journal is the single source of truth for resumability and rollback.
//! Every planned rename is flushed to disk before the rename syscall is
//! issued; resume and rollback are expressed purely as journal replay.
//!
//! ## On-disk layout
//! ```text
//! {wal_dir}/.rename_state/
//!   └── in_progress.json
//!       {
//!         "status": "in_progress",
//!         "started_at": "...",
//!         "segment_size": 16777216,
//!         "dry_run": false,
//!         "operations": [ { old_name, new_name, fingerprint, status, ... } ]
//!       }
//! ```

mod manager;
mod record;
mod rollback;

pub use manager::{Journal, JOURNAL_FILE, STATE_DIR};
pub use record::{OpStatus, OperationRecord, RunStatus};
pub use rollback::{rollback_run, RollbackOutcome};
