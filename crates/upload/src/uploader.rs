//! Per-file upload lifecycle: fingerprint, resume lookup, session, cleanup.

use std::path::Path;

use chrono::Utc;
use gxupload_protocol::UploadMetadata;
use gxupload_transfer::{ProgressSink, ResumeRecord, ResumeStore, compute_fingerprint};
use tracing::{debug, info, warn};

use crate::error::UploadError;
use crate::session::UploadSession;
use crate::transport::Transport;
use crate::types::{DestinationId, SessionOptions, UploadSummary};

/// Uploads single files, persisting resume records when a store is set.
pub struct Uploader<'a> {
    transport: &'a dyn Transport,
    store: Option<&'a ResumeStore>,
    options: SessionOptions,
}

impl<'a> Uploader<'a> {
    pub fn new(
        transport: &'a dyn Transport,
        store: Option<&'a ResumeStore>,
        options: SessionOptions,
    ) -> Self {
        Self {
            transport,
            store,
            options,
        }
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Uploads `path` into `destination`.
    ///
    /// The resume record is removed only after a successful finalize. On any
    /// failure it stays, so a later run continues from the server offset.
    pub async fn upload(
        &self,
        path: &Path,
        destination: DestinationId,
        metadata: UploadMetadata,
        sink: &mut dyn ProgressSink,
    ) -> Result<UploadSummary, UploadError> {
        let (fingerprint, previous) = match self.store {
            Some(store) => {
                let fp = compute_fingerprint(path)?;
                let previous = store.lookup(&fp);
                debug!(file = %path.display(), fingerprint = %fp, found = previous.is_some(), "resume lookup");
                (Some(fp), previous)
            }
            None => (None, None),
        };

        let mut session = UploadSession::open(
            self.transport,
            path,
            destination,
            metadata,
            previous.as_ref(),
            self.options.clone(),
        )
        .await?;

        if let (Some(store), Some(fp)) = (self.store, fingerprint.as_ref()) {
            let unchanged = session.is_resumed()
                && previous
                    .as_ref()
                    .is_some_and(|r| r.destination == session.destination().as_str());

            if unchanged {
                session.mark_persisted(fp.clone(), store.path().to_path_buf());
            } else {
                let record = ResumeRecord {
                    fingerprint: fp.clone(),
                    session_handle: session.handle().to_string(),
                    destination: session.destination().to_string(),
                    total_size: session.total_size(),
                    created_at: previous
                        .as_ref()
                        .filter(|_| session.is_resumed())
                        .map(|r| r.created_at)
                        .unwrap_or_else(Utc::now),
                };
                match store.put(&record) {
                    Ok(()) => session.mark_persisted(fp.clone(), store.path().to_path_buf()),
                    Err(e) if session.is_resumed() => {
                        // The old record still points at this session.
                        warn!(file = %path.display(), error = %e, "failed to update resume record");
                        session.mark_persisted(fp.clone(), store.path().to_path_buf());
                    }
                    Err(e) => {
                        warn!(
                            file = %path.display(),
                            error = %e,
                            "failed to save resume record, upload will not be resumable"
                        );
                    }
                }
            }
        }

        session.run(sink).await?;

        if let (Some(store), Some(fp)) = (self.store, fingerprint.as_ref()) {
            if let Err(e) = store.remove(fp) {
                warn!(fingerprint = %fp, error = %e, "failed to remove resume record");
            }
        }

        info!(
            file = %path.display(),
            handle = %session.handle(),
            bytes = session.total_size(),
            resumed_from = session.resumed_from(),
            "upload complete"
        );

        Ok(UploadSummary {
            session_handle: session.handle().to_string(),
            destination: session.destination().clone(),
            total_size: session.total_size(),
            resumed_from: session.resumed_from(),
            bytes_sent: session.bytes_sent(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::{MockTransport, opts, write_file};
    use crate::transport::TransportError;
    use gxupload_transfer::test_util::RecordingSink;

    fn dest(id: &str) -> DestinationId {
        DestinationId::new(id).unwrap()
    }

    #[tokio::test]
    async fn success_removes_resume_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "a.bin", 10);
        let store = ResumeStore::new(dir.path().join("resume.json"));
        let transport = MockTransport::new();
        let uploader = Uploader::new(&transport, Some(&store), opts(4));

        let summary = uploader
            .upload(
                &path,
                dest("h1"),
                UploadMetadata::new("a.bin"),
                &mut RecordingSink::default(),
            )
            .await
            .unwrap();

        assert_eq!(summary.total_size, 10);
        assert_eq!(summary.bytes_sent, 10);
        assert_eq!(summary.resumed_from, 0);
        assert!(store.list().is_empty());
    }

    #[tokio::test]
    async fn interrupted_upload_resumes_without_resending() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "a.bin", 10);
        let store = ResumeStore::new(dir.path().join("resume.json"));
        let transport = MockTransport::new();
        transport.with(|s| s.max_sends = Some(1));
        let mut options = opts(4);
        options.retry = crate::types::RetryPolicy::immediate(0);

        let first = Uploader::new(&transport, Some(&store), options);
        let err = first
            .upload(
                &path,
                dest("h1"),
                UploadMetadata::new("a.bin"),
                &mut RecordingSink::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::RetriesExhausted { .. }));
        let records = store.list();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].session_handle, "mock://upload/1");

        transport.with(|s| s.max_sends = None);
        let mut sink = RecordingSink::default();
        let second = Uploader::new(&transport, Some(&store), opts(4));
        let summary = second
            .upload(&path, dest("h1"), UploadMetadata::new("a.bin"), &mut sink)
            .await
            .unwrap();

        assert_eq!(summary.resumed_from, 4);
        assert_eq!(summary.bytes_sent, 6);
        assert_eq!(sink.started, Some((10, 4)));
        assert_eq!(transport.bytes_sent(), 10);
        transport.with(|s| {
            assert_eq!(s.created, 1);
            assert_eq!(s.finalized.len(), 1);
        });
        assert!(store.list().is_empty());
    }

    #[tokio::test]
    async fn unresumable_keeps_record_and_names_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "a.bin", 10);
        let store_path = dir.path().join("resume.json");
        let store = ResumeStore::new(&store_path);
        let fp = compute_fingerprint(&path).unwrap();
        store
            .put(&ResumeRecord {
                fingerprint: fp.clone(),
                session_handle: "mock://upload/expired".into(),
                destination: "h1".into(),
                total_size: 10,
                created_at: Utc::now(),
            })
            .unwrap();
        let transport = MockTransport::new();
        let uploader = Uploader::new(&transport, Some(&store), opts(4));

        let err = uploader
            .upload(
                &path,
                dest("h1"),
                UploadMetadata::new("a.bin"),
                &mut RecordingSink::default(),
            )
            .await
            .unwrap_err();

        assert!(err.is_unresumable());
        let msg = err.to_string();
        assert!(msg.contains(fp.as_str()));
        assert!(msg.contains(&store_path.display().to_string()));
        assert!(store.lookup(&fp).is_some());
        transport.with(|s| assert!(s.finalized.is_empty()));
    }

    #[tokio::test]
    async fn resume_into_other_destination_records_new_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "a.bin", 8);
        let store = ResumeStore::new(dir.path().join("resume.json"));
        let transport = MockTransport::new();
        transport.with(|s| {
            s.sessions.insert("mock://upload/old".into(), Vec::new());
            s.finalize_failures
                .push_back(TransportError::Unavailable { status: 503 });
        });
        let fp = compute_fingerprint(&path).unwrap();
        store
            .put(&ResumeRecord {
                fingerprint: fp.clone(),
                session_handle: "mock://upload/old".into(),
                destination: "h1".into(),
                total_size: 8,
                created_at: Utc::now(),
            })
            .unwrap();

        let uploader = Uploader::new(&transport, Some(&store), opts(4));
        let err = uploader
            .upload(
                &path,
                dest("h2"),
                UploadMetadata::new("a.bin"),
                &mut RecordingSink::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Finalize { .. }));

        let record = store.lookup(&fp).unwrap();
        assert_eq!(record.session_handle, "mock://upload/old");
        assert_eq!(record.destination, "h2");
        transport.with(|s| assert_eq!(s.created, 0));
    }

    #[tokio::test]
    async fn unwritable_store_still_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "a.bin", 6);
        let store = ResumeStore::new("/proc/gxupload-no-such-dir/resume.json");
        let transport = MockTransport::new();
        let uploader = Uploader::new(&transport, Some(&store), opts(4));

        let summary = uploader
            .upload(
                &path,
                dest("h1"),
                UploadMetadata::new("a.bin"),
                &mut RecordingSink::default(),
            )
            .await
            .unwrap();
        assert_eq!(summary.bytes_sent, 6);
    }

    #[tokio::test]
    async fn without_store_no_fingerprint_is_needed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "a.bin", 3);
        let transport = MockTransport::new();
        let uploader = Uploader::new(&transport, None, opts(4));

        let summary = uploader
            .upload(
                &path,
                dest("h1"),
                UploadMetadata::new("a.bin"),
                &mut RecordingSink::default(),
            )
            .await
            .unwrap();
        assert_eq!(summary.total_size, 3);
    }
}
