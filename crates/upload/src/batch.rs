//! Sequential multi-file uploads.
//!
//! Each file runs independently: it resolves its own destination and its
//! failure is recorded without stopping the files after it.

use std::path::{Path, PathBuf};

use gxupload_transfer::ProgressSink;
use tracing::{error, info};

use crate::error::UploadError;
use crate::resolve::{DestinationResolver, DestinationSelector, resolve_destination};
use crate::types::{DatasetOptions, UploadSummary};
use crate::uploader::Uploader;

/// Result for one file of a batch.
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub result: Result<UploadSummary, UploadError>,
}

/// Per-file results of a batch, in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }
}

/// Uploads a list of files one after another.
pub struct BatchUploader<'a> {
    uploader: Uploader<'a>,
    resolver: &'a dyn DestinationResolver,
}

impl<'a> BatchUploader<'a> {
    pub fn new(uploader: Uploader<'a>, resolver: &'a dyn DestinationResolver) -> Self {
        Self { uploader, resolver }
    }

    /// Uploads every file in `files`.
    ///
    /// Only argument errors fail the whole batch, and they are reported
    /// before any network call. Everything else ends up in the report.
    pub async fn upload_all<F>(
        &self,
        files: &[PathBuf],
        selector: &DestinationSelector,
        dataset: &DatasetOptions,
        mut make_sink: F,
    ) -> Result<BatchReport, UploadError>
    where
        F: FnMut(&Path) -> Box<dyn ProgressSink>,
    {
        if dataset.file_name.is_some() && files.len() > 1 {
            return Err(UploadError::FileNameWithMultiplePaths);
        }

        let mut report = BatchReport::default();
        for path in files {
            if self.uploader.options().cancel.is_cancelled() {
                info!(file = %path.display(), "skipping file after cancellation");
                break;
            }

            let mut sink = make_sink(path);
            let result = self
                .upload_one(path, selector, dataset, sink.as_mut())
                .await;
            if let Err(e) = &result {
                error!(file = %path.display(), error = %e, "upload failed");
            }
            report.outcomes.push(FileOutcome {
                path: path.clone(),
                result,
            });
        }

        info!(
            files = files.len(),
            succeeded = report.succeeded(),
            "batch finished"
        );
        Ok(report)
    }

    async fn upload_one(
        &self,
        path: &Path,
        selector: &DestinationSelector,
        dataset: &DatasetOptions,
        sink: &mut dyn ProgressSink,
    ) -> Result<UploadSummary, UploadError> {
        let destination = resolve_destination(self.resolver, selector).await?;
        self.uploader
            .upload(path, destination, dataset.metadata_for(path), sink)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::ResolveError;
    use crate::session::tests::{MockTransport, opts, write_file};
    use crate::transport::TransportError;
    use crate::types::Destination;
    use gxupload_transfer::NoopSink;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    /// Resolver whose n-th listing result is scripted.
    struct ScriptedResolver {
        listings: Mutex<Vec<Result<Vec<Destination>, TransportError>>>,
    }

    impl DestinationResolver for ScriptedResolver {
        fn list_destinations(
            &self,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<Destination>, TransportError>> + Send + '_>>
        {
            Box::pin(async move { self.listings.lock().unwrap().remove(0) })
        }
    }

    fn history(id: &str, name: &str) -> Destination {
        Destination {
            id: id.into(),
            name: name.into(),
            update_time: None,
        }
    }

    fn name_selector(pattern: &str) -> DestinationSelector {
        DestinationSelector::Name {
            pattern: pattern.into(),
            ignore_case: false,
        }
    }

    #[tokio::test]
    async fn failure_on_one_file_does_not_stop_others() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            write_file(dir.path(), "one.txt", 5),
            write_file(dir.path(), "two.txt", 5),
            write_file(dir.path(), "three.txt", 5),
        ];
        let resolver = ScriptedResolver {
            listings: Mutex::new(vec![
                Ok(vec![history("h1", "reads")]),
                Ok(vec![history("h9", "other")]),
                Ok(vec![history("h1", "reads")]),
            ]),
        };
        let transport = MockTransport::new();
        let batch = BatchUploader::new(Uploader::new(&transport, None, opts(4)), &resolver);

        let report = batch
            .upload_all(
                &files,
                &name_selector("reads"),
                &DatasetOptions::default(),
                |_| Box::new(NoopSink),
            )
            .await
            .unwrap();

        assert_eq!(report.outcomes.len(), 3);
        assert!(report.outcomes[0].result.is_ok());
        assert!(matches!(
            report.outcomes[1].result,
            Err(UploadError::Resolve(ResolveError::NotFound(_)))
        ));
        assert!(report.outcomes[2].result.is_ok());
        assert!(!report.all_succeeded());
        assert_eq!(report.failures().count(), 1);
        transport.with(|s| {
            assert_eq!(s.finalized.len(), 2);
            assert!(s.finalized.iter().all(|(_, dest)| dest == "h1"));
        });
    }

    #[tokio::test]
    async fn file_name_with_multiple_paths_rejected_up_front() {
        let resolver = ScriptedResolver {
            listings: Mutex::new(Vec::new()),
        };
        let transport = MockTransport::new();
        let batch = BatchUploader::new(Uploader::new(&transport, None, opts(4)), &resolver);
        let dataset = DatasetOptions {
            file_name: Some("x".into()),
            ..DatasetOptions::default()
        };

        let err = batch
            .upload_all(
                &[PathBuf::from("a"), PathBuf::from("b")],
                &DestinationSelector::Id("h1".into()),
                &dataset,
                |_| Box::new(NoopSink),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::FileNameWithMultiplePaths));
        transport.with(|s| assert_eq!(s.created, 0));
    }

    #[tokio::test]
    async fn missing_file_is_reported_per_file() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            dir.path().join("missing.txt"),
            write_file(dir.path(), "ok.txt", 2),
        ];
        let resolver = ScriptedResolver {
            listings: Mutex::new(Vec::new()),
        };
        let transport = MockTransport::new();
        let batch = BatchUploader::new(Uploader::new(&transport, None, opts(4)), &resolver);

        let report = batch
            .upload_all(
                &files,
                &DestinationSelector::Id("h1".into()),
                &DatasetOptions::default(),
                |_| Box::new(NoopSink),
            )
            .await
            .unwrap();

        assert!(matches!(
            report.outcomes[0].result,
            Err(UploadError::Transfer(_))
        ));
        assert!(report.outcomes[1].result.is_ok());
    }

    #[tokio::test]
    async fn dataset_names_follow_each_file() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![write_file(dir.path(), "x.fq", 1)];
        let resolver = ScriptedResolver {
            listings: Mutex::new(Vec::new()),
        };
        let transport = MockTransport::new();
        let batch = BatchUploader::new(Uploader::new(&transport, None, opts(4)), &resolver);
        let mut seen = Vec::new();

        let report = batch
            .upload_all(
                &files,
                &DestinationSelector::Id("h1".into()),
                &DatasetOptions::default(),
                |p| {
                    seen.push(p.to_path_buf());
                    Box::new(NoopSink)
                },
            )
            .await
            .unwrap();
        assert!(report.all_succeeded());
        assert_eq!(seen, files);
    }
}
