//! Configuration for walmend
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{Result, WalmendError};

/// Default WAL segment size: 16 MiB
pub const DEFAULT_SEGMENT_SIZE: u64 = 16 * 1024 * 1024;

/// Smallest supported segment size: 1 MiB
pub const MIN_SEGMENT_SIZE: u64 = 1024 * 1024;

/// Largest supported segment size: 1 GiB
pub const MAX_SEGMENT_SIZE: u64 = 1024 * 1024 * 1024;

/// Main configuration for a walmend run
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Target Configuration
    // -------------------------------------------------------------------------
    /// Directory containing candidate segment files.
    /// Internal structure created on first run:
    ///   {wal_dir}/
    ///     └── .rename_state/
    ///         ├── in_progress.json      (journal)
    ///         ├── report_<ts>.json      (one per run)
    ///         ├── walmend.log           (event log)
    ///         └── walmend_error.log     (error-only log)
    pub wal_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Segment Configuration
    // -------------------------------------------------------------------------
    /// WAL segment size in bytes; must be a power of two in 1 MiB..=1 GiB
    pub segment_size: u64,

    // -------------------------------------------------------------------------
    // Run Configuration
    // -------------------------------------------------------------------------
    /// Preview mode: plan and journal everything, never touch the filesystem
    pub dry_run: bool,

    /// Treat an out-of-range format version as a warning instead of blocking
    /// the rename
    pub allow_unsupported_version: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wal_dir: PathBuf::from("."),
            segment_size: DEFAULT_SEGMENT_SIZE,
            dry_run: false,
            allow_unsupported_version: false,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that the segment size is a supported power of two.
    pub fn validate(&self) -> Result<()> {
        let size = self.segment_size;
        if !size.is_power_of_two() || !(MIN_SEGMENT_SIZE..=MAX_SEGMENT_SIZE).contains(&size) {
            return Err(WalmendError::UnsupportedSegmentSize(size));
        }
        Ok(())
    }

    /// Path of the state directory under the WAL directory.
    pub fn state_dir(&self) -> PathBuf {
        self.wal_dir.join(crate::journal::STATE_DIR)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the WAL directory to scan
    pub fn wal_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.wal_dir = path.into();
        self
    }

    /// Set the segment size (in bytes)
    pub fn segment_size(mut self, size: u64) -> Self {
        self.config.segment_size = size;
        self
    }

    /// Enable or disable dry-run mode
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.config.dry_run = dry_run;
        self
    }

    /// Downgrade out-of-range format versions to warnings
    pub fn allow_unsupported_version(mut self, allow: bool) -> Self {
        self.config.allow_unsupported_version = allow;
        self
    }

    /// Finish the builder, rejecting unsupported segment sizes.
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
