//! Error types for walmend
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using WalmendError
pub type Result<T> = std::result::Result<T, WalmendError>;

/// Unified error type for walmend operations
#[derive(Debug, Error)]
pub enum WalmendError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("filesystem error on {path}: {source}")]
    Filesystem {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Header Parser Errors
    // -------------------------------------------------------------------------
    #[error("file too small for a page header: {size} bytes (need {min})")]
    TooSmall { size: u64, min: u64 },

    #[error("truncated read: wanted {wanted} header bytes, got {got}")]
    TruncatedRead { wanted: usize, got: usize },

    // -------------------------------------------------------------------------
    // Validation Errors
    // -------------------------------------------------------------------------
    #[error("magic mismatch: expected {expected:#06X}, found {found:#06X}")]
    MagicMismatch { expected: u16, found: u16 },

    #[error("unsupported WAL format version: {0}")]
    UnsupportedVersion(u16),

    #[error("invalid timeline id: {0} (timeline 0 is reserved)")]
    InvalidTimeline(u32),

    // -------------------------------------------------------------------------
    // Name Derivation Errors
    // -------------------------------------------------------------------------
    #[error("page address {page_address:#X} overflows the log id field")]
    AddressOverflow { page_address: u64 },

    #[error("unsupported segment size: {0} (must be a power of two in 1 MiB..=1 GiB)")]
    UnsupportedSegmentSize(u64),

    // -------------------------------------------------------------------------
    // Rename Errors
    // -------------------------------------------------------------------------
    #[error("rename collision: destination {0} already exists as a distinct file")]
    RenameCollision(String),

    // -------------------------------------------------------------------------
    // Journal Errors
    // -------------------------------------------------------------------------
    #[error("journal corrupt: {0}")]
    JournalCorrupt(String),
}

impl WalmendError {
    /// Short, stable label used to partition error counts in the report.
    pub fn kind(&self) -> &'static str {
        match self {
            WalmendError::Io(_) | WalmendError::Filesystem { .. } => "FilesystemError",
            WalmendError::TooSmall { .. } => "TooSmall",
            WalmendError::TruncatedRead { .. } => "TruncatedRead",
            WalmendError::MagicMismatch { .. } => "MagicMismatch",
            WalmendError::UnsupportedVersion(_) => "UnsupportedVersion",
            WalmendError::InvalidTimeline(_) => "InvalidTimeline",
            WalmendError::AddressOverflow { .. } => "AddressOverflow",
            WalmendError::UnsupportedSegmentSize(_) => "UnsupportedSegmentSize",
            WalmendError::RenameCollision(_) => "RenameCollision",
            WalmendError::JournalCorrupt(_) => "JournalCorrupt",
        }
    }
}
