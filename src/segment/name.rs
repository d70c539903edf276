//! Canonical name derivation
//!
//! A segment's canonical name is a pure function of
//! `(timeline_id, page_address, segment_size)`:
//!
//! ```text
//! segment_number   = page_address / segment_size
//! segments_per_log = 0x1_0000_0000 / segment_size
//! log_id           = segment_number / segments_per_log
//! segment_id       = segment_number % segments_per_log
//! name             = {timeline:08X}{log_id:08X}{segment_id:08X}
//! ```

use crate::config::{MAX_SEGMENT_SIZE, MIN_SEGMENT_SIZE};
use crate::error::{Result, WalmendError};

/// Logical position of a segment within the WAL stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentPosition {
    /// Sequence number of the segment in the infinite stream
    pub segment_number: u64,

    /// High half of the canonical name body
    pub log_id: u32,

    /// Low half of the canonical name body
    pub segment_id: u32,
}

/// Compute the logical position of the segment holding `page_address`.
pub fn segment_position(page_address: u64, segment_size: u64) -> Result<SegmentPosition> {
    check_segment_size(segment_size)?;

    let segment_number = page_address / segment_size;
    let segments_per_log = 0x1_0000_0000u64 / segment_size;
    let log_id = segment_number / segments_per_log;
    let segment_id = segment_number % segments_per_log;

    // log_id must fit its 8-hex-digit field; segment_id always does since
    // segments_per_log <= 0x1_0000_0000.
    let log_id = u32::try_from(log_id)
        .map_err(|_| WalmendError::AddressOverflow { page_address })?;

    Ok(SegmentPosition {
        segment_number,
        log_id,
        segment_id: segment_id as u32,
    })
}

/// Derive the 24-hex-character canonical filename.
pub fn derive_canonical_name(
    timeline_id: u32,
    page_address: u64,
    segment_size: u64,
) -> Result<String> {
    let pos = segment_position(page_address, segment_size)?;
    Ok(format!(
        "{:08X}{:08X}{:08X}",
        timeline_id, pos.log_id, pos.segment_id
    ))
}

fn check_segment_size(segment_size: u64) -> Result<()> {
    if !segment_size.is_power_of_two()
        || !(MIN_SEGMENT_SIZE..=MAX_SEGMENT_SIZE).contains(&segment_size)
    {
        return Err(WalmendError::UnsupportedSegmentSize(segment_size));
    }
    Ok(())
}
