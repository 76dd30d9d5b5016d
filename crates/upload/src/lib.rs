//! Resumable upload engine.
//!
//! This crate implements the **business logic** of pushing local files to
//! a remote data-management server over a chunked, offset-based protocol.
//! It has no HTTP dependency: the caller provides a [`Transport`] and a
//! [`DestinationResolver`] implementation.
//!
//! # Pipeline (per file)
//!
//! 1. **Resolve**: turn a history id or name pattern into a destination
//! 2. **Fingerprint**: derive the resume key for the local file
//! 3. **Open**: continue the stored remote session or create a new one
//! 4. **Transfer**: send chunks from the server-confirmed offset
//! 5. **Finalize**: attach the uploaded bytes to the destination

pub mod batch;
pub mod classify;
pub mod error;
pub mod resolve;
pub mod session;
pub mod transport;
pub mod types;
pub mod uploader;

// Re-export primary types for convenience.
pub use batch::{BatchReport, BatchUploader, FileOutcome};
pub use classify::{Disposition, classify};
pub use error::UploadError;
pub use resolve::{
    DestinationResolver, DestinationSelector, NameFilter, ResolveError, resolve_destination,
};
pub use session::{FailureKind, SessionState, UploadSession};
pub use transport::{Transport, TransportError, TransportFuture};
pub use types::{
    DatasetOptions, Destination, DestinationId, RetryPolicy, SessionOptions, UploadSummary,
};
pub use uploader::Uploader;
