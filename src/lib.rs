//! # walmend
//!
//! A rename-and-recovery engine for WAL segment files whose on-disk names no
//! longer match the canonical name implied by their binary contents:
//! - Fixed-offset page-header parsing (magic, version, timeline, page address)
//! - Canonical 24-hex-character name derivation
//! - Multi-layer validation (physical, header, cross-field)
//! - Durable journal with write-ahead ordering, resume and rollback
//! - Dry-run preview with identical journaling
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Rename Engine                           │
//! │        (scan → parse → validate → plan → apply)              │
//! └───────┬───────────────┬───────────────────┬─────────────────┘
//!         │               │                   │
//!         ▼               ▼                   ▼
//!  ┌─────────────┐ ┌─────────────┐    ┌─────────────┐
//!  │   Segment   │ │   Journal   │    │   Report    │
//!  │ parse/derive│ │ (durable,   │    │ (derived,   │
//!  │ /validate   │ │  resumable) │    │  read-only) │
//!  └─────────────┘ └──────┬──────┘    └─────────────┘
//!                         │
//!                         ▼
//!                  ┌─────────────┐
//!                  │  Rollback   │
//!                  │ (reverse    │
//!                  │  replay)    │
//!                  └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod segment;
pub mod journal;
pub mod engine;
pub mod report;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use engine::{rollback, RenameEngine};
pub use error::{Result, WalmendError};
pub use report::Report;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of walmend
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
