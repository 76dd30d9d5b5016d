use std::fmt;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::time::UNIX_EPOCH;

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

use crate::TransferError;

/// Bytes hashed from each end of the file.
const BLOCK_SIZE: u64 = 64 * 1024;

/// Stable identity of a local file, used as the resume key.
///
/// Rendered as `size:<len>--md5:<hex>`. Two runs against the same
/// unmodified file yield the same value; changing content, length or
/// modification time yields a different one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wraps an already-rendered fingerprint (e.g. one typed by a user).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Computes the fingerprint of the file at `path`.
///
/// The digest covers the length, the modification time (when the platform
/// reports one), the first 64 KiB and the last 64 KiB, so the cost is
/// bounded regardless of file size. The path itself is not part of the
/// identity.
pub fn compute_fingerprint(path: &Path) -> Result<Fingerprint, TransferError> {
    let mut file = File::open(path)?;
    let metadata = file.metadata()?;
    let size = metadata.len();

    let mut hasher = Md5::new();
    hasher.update(size.to_le_bytes());
    if let Ok(since_epoch) = metadata
        .modified()
        .map(|m| m.duration_since(UNIX_EPOCH).unwrap_or_default())
    {
        hasher.update(since_epoch.as_nanos().to_le_bytes());
    }

    hash_range(&mut file, &mut hasher, 0, size.min(BLOCK_SIZE))?;
    if size > BLOCK_SIZE {
        // Never re-hash bytes already covered by the head block.
        let tail_start = (size - BLOCK_SIZE).max(BLOCK_SIZE);
        hash_range(&mut file, &mut hasher, tail_start, size - tail_start)?;
    }

    let digest = hex::encode(hasher.finalize());
    Ok(Fingerprint(format!("size:{size}--md5:{digest}")))
}

fn hash_range(file: &mut File, hasher: &mut Md5, start: u64, len: u64) -> Result<(), TransferError> {
    file.seek(SeekFrom::Start(start))?;
    let mut limited = file.take(len);
    let mut buf = [0u8; 8192];
    loop {
        let n = limited.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(())
}
