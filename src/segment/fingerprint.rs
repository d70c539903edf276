//! Content fingerprints
//!
//! A streamed CRC32 over the whole file, rendered as 8 hex chars. Used to
//! detect external modification between plan and apply, and to verify that
//! rollback is undoing the file it thinks it is.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::Result;

/// Compute the content fingerprint of the file at `path`.
pub fn file_fingerprint(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = crc32fast::Hasher::new();
    let mut buf = [0u8; 64 * 1024];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(format!("{:08x}", hasher.finalize()))
}
