//! Upload error types.

use std::path::PathBuf;

use gxupload_transfer::{Fingerprint, StorageError, TransferError};

use crate::resolve::ResolveError;
use crate::transport::TransportError;

/// Errors produced while uploading a file.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("local file error: {0}")]
    Transfer(#[from] TransferError),

    #[error("resume store error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(
        "unable to resume, previous upload may have been removed from server \
         (hint: remove {fingerprint} from {} or change storage to reupload from the start): {source}",
        .store.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "the resume store".into())
    )]
    Unresumable {
        fingerprint: Fingerprint,
        session_handle: String,
        store: Option<PathBuf>,
        source: TransportError,
    },

    #[error("{operation} failed: {source}")]
    Transport {
        operation: &'static str,
        source: TransportError,
    },

    #[error("{operation} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        operation: &'static str,
        attempts: u32,
        source: TransportError,
    },

    #[error("server protocol violation: {0}")]
    Protocol(String),

    #[error("finalizing upload {session_handle} failed (data is kept, finalize can be retried): {source}")]
    Finalize {
        session_handle: String,
        source: TransportError,
    },

    #[error("upload {session_handle} abandoned")]
    Abandoned { session_handle: String },

    #[error("upload cancelled before a remote session was created")]
    Cancelled,

    #[error("invalid session state: {0}")]
    InvalidState(String),

    #[error("--file-name cannot be used with multiple paths")]
    FileNameWithMultiplePaths,
}

impl UploadError {
    /// True for failures that leave a stale resume record behind.
    pub fn is_unresumable(&self) -> bool {
        matches!(self, Self::Unresumable { .. })
    }
}
