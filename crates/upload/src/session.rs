//! Upload session state machine.
//!
//! One session drives one file through one remote upload. The server is
//! the source of truth for how many bytes it holds: the loop always sends
//! from the last offset the server confirmed, never from a local guess.

use std::path::{Path, PathBuf};

use gxupload_protocol::UploadMetadata;
use gxupload_transfer::{ChunkReader, Fingerprint, ProgressSink, ResumeRecord};
use tracing::{debug, info, warn};

use crate::classify::{Disposition, classify};
use crate::error::UploadError;
use crate::transport::{Transport, TransportError};
use crate::types::{DestinationId, SessionOptions};

/// Lifecycle state of an [`UploadSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Transferring,
    Completed,
    Failed(FailureKind),
    Abandoned,
}

/// Why a session failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The server no longer has the partial upload a resume record points to.
    Unresumable,
    Other,
}

/// The resume record backing a session, if any.
#[derive(Debug, Clone)]
struct ResumeContext {
    fingerprint: Fingerprint,
    store: Option<PathBuf>,
}

/// An upload of one local file into one remote session.
pub struct UploadSession<'t> {
    transport: &'t dyn Transport,
    reader: ChunkReader,
    handle: String,
    destination: DestinationId,
    metadata: UploadMetadata,
    total_size: u64,
    /// Bytes the server has acknowledged. Only ever grows.
    offset: u64,
    /// Offset confirmed by the server when `run` started.
    resumed_from: u64,
    /// Bytes acknowledged during this process's runs.
    bytes_sent: u64,
    state: SessionState,
    resumed: bool,
    resume: Option<ResumeContext>,
    options: SessionOptions,
}

impl<'t> UploadSession<'t> {
    /// Opens a session for `file`.
    ///
    /// With a valid `resume_record` the stored remote session is reused
    /// without any network call; its offset is queried when [`run`](Self::run)
    /// starts. Otherwise a new remote session is created.
    pub async fn open(
        transport: &'t dyn Transport,
        file: &Path,
        destination: DestinationId,
        metadata: UploadMetadata,
        resume_record: Option<&ResumeRecord>,
        options: SessionOptions,
    ) -> Result<Self, UploadError> {
        if options.chunk_size == 0 {
            return Err(UploadError::InvalidState(
                "chunk size must be at least one byte".into(),
            ));
        }
        let reader = ChunkReader::open(file)?;
        let total_size = reader.file_size();

        let mut session = Self {
            transport,
            reader,
            handle: String::new(),
            destination,
            metadata,
            total_size,
            offset: 0,
            resumed_from: 0,
            bytes_sent: 0,
            state: SessionState::Created,
            resumed: false,
            resume: None,
            options,
        };

        match resume_record {
            Some(record) if record.total_size == total_size && !record.session_handle.is_empty() => {
                info!(
                    file = %file.display(),
                    fingerprint = %record.fingerprint,
                    handle = %record.session_handle,
                    "resuming previous upload"
                );
                if record.destination != session.destination.as_str() {
                    debug!(
                        stored = %record.destination,
                        requested = %session.destination,
                        "resume record was created for another destination"
                    );
                }
                session.handle = record.session_handle.clone();
                session.resumed = true;
                session.resume = Some(ResumeContext {
                    fingerprint: record.fingerprint.clone(),
                    store: None,
                });
            }
            other => {
                if let Some(record) = other {
                    warn!(
                        file = %file.display(),
                        stored_size = record.total_size,
                        actual_size = total_size,
                        "ignoring resume record that does not match the file"
                    );
                }
                session.handle = session.create_remote().await?;
                debug!(file = %file.display(), handle = %session.handle, total_size, "created upload session");
            }
        }

        Ok(session)
    }

    async fn create_remote(&mut self) -> Result<String, UploadError> {
        let mut attempts = 0;
        loop {
            if self.options.cancel.is_cancelled() {
                return Err(UploadError::Cancelled);
            }
            match self
                .transport
                .create_session(self.total_size, &self.metadata)
                .await
            {
                Ok(handle) => return Ok(handle),
                Err(e) => self.on_transport_error(e, &mut attempts, "session creation").await?,
            }
        }
    }

    /// Records that a resume record for this session is stored at `store`.
    ///
    /// From here on a vanished remote session is reported as unresumable,
    /// naming the record to clear.
    pub fn mark_persisted(&mut self, fingerprint: Fingerprint, store: PathBuf) {
        self.resume = Some(ResumeContext {
            fingerprint,
            store: Some(store),
        });
    }

    /// Runs the transfer loop until the upload is finalized or fails.
    pub async fn run(&mut self, sink: &mut dyn ProgressSink) -> Result<(), UploadError> {
        match self.state {
            SessionState::Created | SessionState::Transferring => {}
            other => {
                return Err(UploadError::InvalidState(format!(
                    "cannot run a session in state {other:?}"
                )));
            }
        }
        self.state = SessionState::Transferring;

        let mut confirmed: Option<u64> = None;
        let mut attempts = 0;
        let mut started = false;

        loop {
            if self.options.cancel.is_cancelled() {
                self.abandon()?;
                return Err(UploadError::Abandoned {
                    session_handle: self.handle.clone(),
                });
            }

            let offset = match confirmed {
                Some(offset) => offset,
                None => match self.transport.query_offset(&self.handle).await {
                    Ok(offset) => {
                        self.confirm(offset)?;
                        offset
                    }
                    Err(e) => {
                        self.on_transport_error(e, &mut attempts, "offset query")
                            .await?;
                        continue;
                    }
                },
            };

            if !started {
                started = true;
                self.resumed_from = offset;
                sink.on_start(&self.metadata.name, self.total_size, offset);
            }

            if offset == self.total_size {
                self.finalize().await?;
                sink.on_finish();
                return Ok(());
            }

            let chunk = match self.reader.read_at(offset, self.options.chunk_size) {
                Ok(chunk) => chunk,
                Err(e) => {
                    self.state = SessionState::Failed(FailureKind::Other);
                    return Err(e.into());
                }
            };

            match self
                .transport
                .send_chunk(&self.handle, offset, &chunk.data)
                .await
            {
                Ok(ack) => {
                    if ack <= offset || ack > chunk.end() {
                        return Err(self.violation(format!(
                            "chunk [{offset}, {}) acknowledged at offset {ack}",
                            chunk.end()
                        )));
                    }
                    self.confirm(ack)?;
                    let delta = ack - offset;
                    self.bytes_sent += delta;
                    sink.on_advance(delta);
                    confirmed = Some(ack);
                    attempts = 0;
                }
                Err(e) => {
                    self.on_transport_error(e, &mut attempts, "chunk upload")
                        .await?;
                    // Whatever reached the server before the failure is
                    // only known after asking again.
                    confirmed = None;
                }
            }
        }
    }

    /// Attaches the uploaded bytes to the destination.
    ///
    /// Only valid once the server confirmed the full size. A failure keeps
    /// the session in `Transferring` so finalize alone can be retried; it is
    /// never retried automatically because the server may already have
    /// created the dataset.
    pub async fn finalize(&mut self) -> Result<(), UploadError> {
        if self.state != SessionState::Transferring || self.offset != self.total_size {
            return Err(UploadError::InvalidState(format!(
                "finalize requires a fully confirmed upload (state {:?}, offset {}/{})",
                self.state, self.offset, self.total_size
            )));
        }

        self.transport
            .finalize(&self.handle, &self.destination, &self.metadata)
            .await
            .map_err(|source| UploadError::Finalize {
                session_handle: self.handle.clone(),
                source,
            })?;

        self.state = SessionState::Completed;
        info!(
            handle = %self.handle,
            destination = %self.destination,
            bytes = self.total_size,
            "upload finalized"
        );
        Ok(())
    }

    /// Stops the session, leaving the remote session and any resume record
    /// in place for a later run.
    pub fn abandon(&mut self) -> Result<(), UploadError> {
        if self.state != SessionState::Transferring {
            return Err(UploadError::InvalidState(format!(
                "cannot abandon a session in state {:?}",
                self.state
            )));
        }
        self.state = SessionState::Abandoned;
        info!(handle = %self.handle, offset = self.offset, "upload abandoned");
        Ok(())
    }

    /// Accepts a server-reported offset, enforcing monotonicity and bounds.
    fn confirm(&mut self, offset: u64) -> Result<(), UploadError> {
        if offset > self.total_size {
            return Err(self.violation(format!(
                "server offset {offset} exceeds file size {}",
                self.total_size
            )));
        }
        if offset < self.offset {
            return Err(self.violation(format!(
                "server offset went backwards from {} to {offset}",
                self.offset
            )));
        }
        self.offset = offset;
        Ok(())
    }

    fn violation(&mut self, detail: String) -> UploadError {
        self.state = SessionState::Failed(FailureKind::Other);
        UploadError::Protocol(detail)
    }

    /// Applies the classifier to a failed call. Returns `Ok` when the caller
    /// should retry, after backing off.
    async fn on_transport_error(
        &mut self,
        err: TransportError,
        attempts: &mut u32,
        operation: &'static str,
    ) -> Result<(), UploadError> {
        match classify(&err, self.resume.is_some()) {
            Disposition::Transient => {
                *attempts += 1;
                if *attempts > self.options.retry.max_retries {
                    self.state = SessionState::Failed(FailureKind::Other);
                    return Err(UploadError::RetriesExhausted {
                        operation,
                        attempts: *attempts,
                        source: err,
                    });
                }
                let delay = self.options.retry.delay_for_attempt(*attempts);
                warn!(
                    handle = %self.handle,
                    operation,
                    attempt = *attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient failure, retrying"
                );
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = self.options.cancel.cancelled() => {}
                }
                Ok(())
            }
            Disposition::Unresumable => {
                self.state = SessionState::Failed(FailureKind::Unresumable);
                let ctx = self.resume.clone().ok_or_else(|| {
                    UploadError::InvalidState("unresumable without a resume record".into())
                })?;
                Err(UploadError::Unresumable {
                    fingerprint: ctx.fingerprint,
                    session_handle: self.handle.clone(),
                    store: ctx.store,
                    source: err,
                })
            }
            Disposition::Fatal => {
                self.state = SessionState::Failed(FailureKind::Other);
                Err(UploadError::Transport {
                    operation,
                    source: err,
                })
            }
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Server-confirmed offset.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }

    pub fn destination(&self) -> &DestinationId {
        &self.destination
    }

    /// True when the session continues a remote session from a resume record.
    pub fn is_resumed(&self) -> bool {
        self.resumed
    }

    /// Offset the server already held when the last run started.
    pub fn resumed_from(&self) -> u64 {
        self.resumed_from
    }

    /// Bytes acknowledged by the server during this process.
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }
}
