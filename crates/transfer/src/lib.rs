//! Local-side building blocks for resumable uploads.
//!
//! Everything here touches only the local machine: deriving a stable
//! [`Fingerprint`] for a file, reading it back in positional chunks,
//! persisting [`ResumeRecord`]s between runs and the [`ProgressSink`]
//! contract for reporting acknowledged bytes.

mod chunked;
mod fingerprint;
mod progress;
mod resume;
#[cfg(any(test, feature = "test-util"))]
pub mod test_util;

pub use chunked::{Chunk, ChunkReader};
pub use fingerprint::{Fingerprint, compute_fingerprint};
pub use progress::{NoopSink, ProgressSink};
pub use resume::{ResumeRecord, ResumeStore, StorageError};

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file changed during upload: expected {expected} bytes, found {actual}")]
    FileChanged { expected: u64, actual: u64 },

    #[error("read past end of file at offset {0}")]
    OutOfRange(u64),
}
