//! Data types shared by the upload pipeline.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use chrono::NaiveDateTime;
use gxupload_protocol::{DEFAULT_CHUNK_SIZE, UploadMetadata};
use tokio_util::sync::CancellationToken;

/// Identifier of the remote container (a Galaxy history) an upload is
/// attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DestinationId(String);

impl DestinationId {
    /// Returns `None` for an empty or blank id.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            None
        } else {
            Some(Self(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DestinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A destination as listed by the resolver collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct Destination {
    pub id: String,
    pub name: String,
    pub update_time: Option<NaiveDateTime>,
}

/// Retry policy for transient transport failures, with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries allowed for one operation before escalating to fatal.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries (backoff cap).
    pub max_delay: Duration,
    /// Multiplier for each subsequent retry.
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(15),
            backoff_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that retries `max_retries` times without sleeping.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_factor: 1.0,
        }
    }

    /// Calculates the delay for a given retry number (1-based),
    /// with ±25% jitter.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(63) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.backoff_factor.powi(exp);
        let capped = secs.min(self.max_delay.as_secs_f64());
        if capped <= 0.0 {
            return Duration::ZERO;
        }
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .subsec_nanos();
        let spread = nanos as f64 / 1_000_000_000.0 * 2.0 - 1.0; // [-1.0, 1.0)
        Duration::from_secs_f64(capped * (1.0 + 0.25 * spread))
    }
}

/// Fixed per-session settings.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Bytes per chunk. Fixed for the whole session.
    pub chunk_size: usize,
    pub retry: RetryPolicy,
    /// Cooperative cancellation, checked between chunks.
    pub cancel: CancellationToken,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            retry: RetryPolicy::default(),
            cancel: CancellationToken::new(),
        }
    }
}

/// Dataset options applied to every file of a batch.
#[derive(Debug, Clone)]
pub struct DatasetOptions {
    pub file_type: String,
    pub dbkey: String,
    pub space_to_tab: bool,
    pub auto_decompress: bool,
    /// Dataset name override; only valid for single-file batches.
    pub file_name: Option<String>,
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self {
            file_type: "auto".into(),
            dbkey: "?".into(),
            space_to_tab: false,
            auto_decompress: true,
            file_name: None,
        }
    }
}

impl DatasetOptions {
    /// Builds the finalize metadata for `path`, naming the dataset after the
    /// override or the file's base name.
    pub fn metadata_for(&self, path: &Path) -> UploadMetadata {
        let name = self.file_name.clone().unwrap_or_else(|| {
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.to_string_lossy().into_owned())
        });
        let mut meta = UploadMetadata::new(name);
        meta.file_type = self.file_type.clone();
        meta.dbkey = self.dbkey.clone();
        meta.space_to_tab = self.space_to_tab;
        meta.auto_decompress = self.auto_decompress;
        meta
    }
}

/// Result of one successful file upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSummary {
    pub session_handle: String,
    pub destination: DestinationId,
    pub total_size: u64,
    /// Offset the server already held when this run started.
    pub resumed_from: u64,
    /// Bytes sent by this run.
    pub bytes_sent: u64,
}
