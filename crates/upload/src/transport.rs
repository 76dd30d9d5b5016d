//! Transport contract the engine depends on.
//!
//! The Galaxy crate implements [`Transport`] over HTTP (TUS); tests use
//! in-memory mocks.

use std::future::Future;
use std::pin::Pin;

use gxupload_protocol::UploadMetadata;

use crate::types::DestinationId;

/// Boxed future returned by transport operations.
pub type TransportFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, TransportError>> + Send + 'a>>;

/// Closed set of transport failures.
///
/// Produced by the transport layer from status codes and I/O errors and
/// consumed by [`classify`](crate::classify()) with an exhaustive match.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("upload session no longer exists on the server (HTTP {status})")]
    Gone { status: u16 },

    #[error("not authorized (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("request rejected (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("server unavailable (HTTP {status})")]
    Unavailable { status: u16 },

    #[error("unexpected HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("protocol error: {0}")]
    Protocol(String),
}

impl TransportError {
    /// Maps a non-success HTTP status to its error kind.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            404 | 410 => Self::Gone { status },
            401 | 403 => Self::Unauthorized { status },
            400 | 422 => Self::Rejected { status, body },
            408 | 429 | 500..=599 => Self::Unavailable { status },
            _ => Self::Status { status, body },
        }
    }
}

/// Remote session API.
///
/// Session handles are opaque strings owned by the implementation (for TUS,
/// the absolute upload URL).
pub trait Transport: Send + Sync {
    /// Creates a remote upload session for `total_size` bytes.
    fn create_session<'a>(
        &'a self,
        total_size: u64,
        metadata: &'a UploadMetadata,
    ) -> TransportFuture<'a, String>;

    /// Returns the number of bytes the server holds for the session.
    fn query_offset<'a>(&'a self, handle: &'a str) -> TransportFuture<'a, u64>;

    /// Sends `data` at `offset` and returns the offset the server acknowledged.
    fn send_chunk<'a>(
        &'a self,
        handle: &'a str,
        offset: u64,
        data: &'a [u8],
    ) -> TransportFuture<'a, u64>;

    /// Attaches the completed upload to `destination`.
    fn finalize<'a>(
        &'a self,
        handle: &'a str,
        destination: &'a DestinationId,
        metadata: &'a UploadMetadata,
    ) -> TransportFuture<'a, ()>;
}
