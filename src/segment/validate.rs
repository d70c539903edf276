//! Multi-layer segment validation
//!
//! Three independent checks over a parsed header: physical (file size),
//! header (magic, version range) and cross-field consistency (derivation
//! overflow, timeline). Issues accumulate where safe; fatal issues stop
//! further layers for that file.

use serde::Serialize;

use crate::error::WalmendError;
use crate::segment::header::{PageHeader, HEADER_LEN, WAL_MAGIC};
use crate::segment::name::segment_position;

/// Inclusive range of format versions the tool understands
pub const MIN_VERSION: u16 = 3;
pub const MAX_VERSION: u16 = 15;

/// A single validation finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    /// Stable error-kind label (matches the report partitioning)
    pub kind: &'static str,

    /// Human-readable detail
    pub detail: String,

    /// Whether this issue alone blocks the rename
    pub fatal: bool,
}

/// Validation verdict for one segment file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Rename may proceed; warnings (non-blocking issues) may still be present
    Valid { warnings: Vec<Issue> },

    /// File is skipped; at least one issue blocks the rename
    Invalid { issues: Vec<Issue> },
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid { .. })
    }
}

impl Issue {
    fn fatal(error: &WalmendError) -> Self {
        Self {
            kind: error.kind(),
            detail: error.to_string(),
            fatal: true,
        }
    }

    fn soft(error: &WalmendError) -> Self {
        Self {
            kind: error.kind(),
            detail: error.to_string(),
            fatal: false,
        }
    }
}

/// Validate a parsed header against the file's physical size and the
/// configured segment size. Pure: no filesystem access.
pub fn validate(
    header: &PageHeader,
    file_size: u64,
    segment_size: u64,
    allow_unsupported_version: bool,
) -> Verdict {
    let mut issues: Vec<Issue> = Vec::new();
    let mut warnings: Vec<Issue> = Vec::new();

    // Layer 1: physical. Too small to hold a header is fatal and makes the
    // remaining layers meaningless for this file.
    if file_size < HEADER_LEN {
        issues.push(Issue::fatal(&WalmendError::TooSmall {
            size: file_size,
            min: HEADER_LEN,
        }));
        return Verdict::Invalid { issues };
    }

    // Layer 2: header fields.
    if header.magic != WAL_MAGIC {
        issues.push(Issue::fatal(&WalmendError::MagicMismatch {
            expected: WAL_MAGIC,
            found: header.magic,
        }));
    }

    let version = header.version();
    if !(MIN_VERSION..=MAX_VERSION).contains(&version) {
        let error = WalmendError::UnsupportedVersion(version);
        if allow_unsupported_version {
            warnings.push(Issue::soft(&error));
        } else {
            issues.push(Issue::fatal(&error));
        }
    }

    // Layer 3: cross-field consistency.
    if let Err(e) = segment_position(header.page_address, segment_size) {
        issues.push(Issue::fatal(&e));
    }

    if header.timeline_id == 0 {
        issues.push(Issue::fatal(&WalmendError::InvalidTimeline(
            header.timeline_id,
        )));
    }

    if issues.is_empty() {
        Verdict::Valid { warnings }
    } else {
        Verdict::Invalid { issues }
    }
}
