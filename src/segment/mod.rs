//! Segment-level leaf components
//!
//! Everything here is read-only with respect to the filesystem: the header
//! parser, the canonical name deriver, the validator and the content
//! fingerprint. Mutation is the engine's job alone.
//!
//! ## Page Header Layout (little-endian, fixed offsets)
//! ```text
//! ┌──────────┬─────────────┬─────────────┬──────────────────┐
//! │ magic (2)│ version (2) │ timeline (4)│ page_address (8) │
//! └──────────┴─────────────┴─────────────┴──────────────────┘
//! offset 0     2             4             8            ...16
//! ```

mod fingerprint;
mod header;
mod name;
mod validate;

pub use fingerprint::file_fingerprint;
pub use header::{parse_header, PageHeader, HEADER_LEN, WAL_MAGIC};
pub use name::{derive_canonical_name, segment_position, SegmentPosition};
pub use validate::{validate, Issue, Verdict};
