//! Page header parser
//!
//! Reads the fixed-offset fields at the start of a segment file. The parser
//! never holds the file open beyond the single header read and never writes.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Result, WalmendError};

/// Magic number identifying the WAL format family
pub const WAL_MAGIC: u16 = 0xD061;

/// Size of the header region the parser reads (and the minimum file size)
pub const HEADER_LEN: u64 = 24;

/// Fields parsed from the first bytes of a segment file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    /// WAL format family magic
    pub magic: u16,

    /// Format version in the low bits, flag bits above
    pub version_flags: u16,

    /// Timeline the segment belongs to
    pub timeline_id: u32,

    /// Byte offset of this page into the logical WAL stream
    pub page_address: u64,

    /// Header bytes actually observed on disk
    pub bytes_read: usize,
}

impl PageHeader {
    /// The format version component of `version_flags`.
    pub fn version(&self) -> u16 {
        self.version_flags
    }
}

/// Parse the page header of the segment file at `path`.
///
/// Fails with `TooSmall` if the file cannot hold a full header (checked via
/// metadata, the file content is left untouched) and with `TruncatedRead` if
/// the read comes up short despite the size check.
pub fn parse_header(path: &Path) -> Result<PageHeader> {
    let mut file = File::open(path)?;

    let size = file.metadata()?.len();
    if size < HEADER_LEN {
        return Err(WalmendError::TooSmall {
            size,
            min: HEADER_LEN,
        });
    }

    let mut buf = [0u8; HEADER_LEN as usize];
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(WalmendError::TruncatedRead {
                    wanted: buf.len(),
                    got: filled,
                })
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(PageHeader {
        magic: u16::from_le_bytes([buf[0], buf[1]]),
        version_flags: u16::from_le_bytes([buf[2], buf[3]]),
        timeline_id: u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
        page_address: u64::from_le_bytes([
            buf[8], buf[9], buf[10], buf[11], buf[12], buf[13], buf[14], buf[15],
        ]),
        bytes_read: filled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_segment(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(bytes).unwrap();
        path
    }

    fn header_bytes(magic: u16, version: u16, tli: u32, pageaddr: u64) -> Vec<u8> {
        let mut buf = vec![0u8; HEADER_LEN as usize];
        buf[0..2].copy_from_slice(&magic.to_le_bytes());
        buf[2..4].copy_from_slice(&version.to_le_bytes());
        buf[4..8].copy_from_slice(&tli.to_le_bytes());
        buf[8..16].copy_from_slice(&pageaddr.to_le_bytes());
        buf
    }

    #[test]
    fn parses_all_fields() {
        let dir = TempDir::new().unwrap();
        let path = write_segment(&dir, "seg", &header_bytes(WAL_MAGIC, 15, 5, 0x0100_0000));

        let header = parse_header(&path).unwrap();

        assert_eq!(header.magic, WAL_MAGIC);
        assert_eq!(header.version(), 15);
        assert_eq!(header.timeline_id, 5);
        assert_eq!(header.page_address, 0x0100_0000);
        assert_eq!(header.bytes_read, HEADER_LEN as usize);
    }

    #[test]
    fn empty_file_is_too_small() {
        let dir = TempDir::new().unwrap();
        let path = write_segment(&dir, "empty", &[]);

        let err = parse_header(&path).unwrap_err();
        assert!(matches!(err, WalmendError::TooSmall { size: 0, .. }));
    }

    #[test]
    fn short_file_is_too_small() {
        let dir = TempDir::new().unwrap();
        let path = write_segment(&dir, "short", &[0u8; 23]);

        let err = parse_header(&path).unwrap_err();
        assert!(matches!(err, WalmendError::TooSmall { size: 23, .. }));
    }

    #[test]
    fn parse_is_read_only() {
        let dir = TempDir::new().unwrap();
        let bytes = header_bytes(WAL_MAGIC, 15, 1, 0);
        let path = write_segment(&dir, "seg", &bytes);

        parse_header(&path).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), bytes);
    }
}
