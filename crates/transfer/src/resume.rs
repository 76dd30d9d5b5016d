//! Durable resume records.
//!
//! Maps a file [`Fingerprint`] to the remote session it was being uploaded
//! to, so a later process can continue the transfer instead of starting
//! over. Backed by a single JSON file that is always replaced atomically.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::fingerprint::Fingerprint;

/// Errors writing or reading the resume store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("resume store {path}: I/O error: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("resume store {path}: invalid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A persisted pointer from a local file to its remote upload session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeRecord {
    pub fingerprint: Fingerprint,
    /// Transport-level handle of the remote session (the TUS upload URL).
    pub session_handle: String,
    /// Destination the upload was started for.
    pub destination: String,
    pub total_size: u64,
    pub created_at: DateTime<Utc>,
}

/// On-disk value; the fingerprint is the map key.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    session_handle: String,
    destination: String,
    total_size: u64,
    created_at: DateTime<Utc>,
}

type StoreMap = BTreeMap<Fingerprint, StoredEntry>;

/// File-backed resume store.
///
/// Holds no in-memory cache: every operation reads the file, so records
/// written by another process are always observed. Writes go to a sibling
/// temp file that is renamed over the original, so concurrent readers see
/// either the old or the new content, never a partial one.
#[derive(Debug, Clone)]
pub struct ResumeStore {
    path: PathBuf,
}

impl ResumeStore {
    /// Creates a store backed by `path`. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the record for `fingerprint`, if any.
    ///
    /// Never fails: a missing file is an empty store, and an unreadable or
    /// corrupt one is logged and treated as empty.
    pub fn lookup(&self, fingerprint: &Fingerprint) -> Option<ResumeRecord> {
        let map = self.load_lenient();
        map.get(fingerprint).map(|e| to_record(fingerprint, e))
    }

    /// Persists `record`, replacing any existing record for its fingerprint.
    pub fn put(&self, record: &ResumeRecord) -> Result<(), StorageError> {
        let mut map = self.load_lenient();
        map.insert(
            record.fingerprint.clone(),
            StoredEntry {
                session_handle: record.session_handle.clone(),
                destination: record.destination.clone(),
                total_size: record.total_size,
                created_at: record.created_at,
            },
        );
        self.persist(&map)?;
        debug!(fingerprint = %record.fingerprint, path = %self.path.display(), "stored resume record");
        Ok(())
    }

    /// Removes the record for `fingerprint`. Succeeds if it is already absent.
    pub fn remove(&self, fingerprint: &Fingerprint) -> Result<(), StorageError> {
        let mut map = self.load_lenient();
        if map.remove(fingerprint).is_none() {
            return Ok(());
        }
        self.persist(&map)?;
        debug!(fingerprint = %fingerprint, path = %self.path.display(), "removed resume record");
        Ok(())
    }

    /// Returns every stored record, ordered by fingerprint.
    pub fn list(&self) -> Vec<ResumeRecord> {
        self.load_lenient()
            .iter()
            .map(|(fp, e)| to_record(fp, e))
            .collect()
    }

    fn load_lenient(&self) -> StoreMap {
        match self.load() {
            Ok(map) => map,
            Err(e) => {
                warn!(error = %e, "ignoring unreadable resume store");
                StoreMap::new()
            }
        }
    }

    fn load(&self) -> Result<StoreMap, StorageError> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(StoreMap::new()),
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if data.trim().is_empty() {
            return Ok(StoreMap::new());
        }
        serde_json::from_str(&data).map_err(|source| StorageError::Json {
            path: self.path.clone(),
            source,
        })
    }

    /// Writes `map` to a temp file in the same directory and renames it into place.
    fn persist(&self, map: &StoreMap) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };
        let json = serde_json::to_vec_pretty(map).map_err(|source| StorageError::Json {
            path: self.path.clone(),
            source,
        })?;

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(io_err)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(io_err)?;
        tmp.write_all(&json).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

fn to_record(fingerprint: &Fingerprint, entry: &StoredEntry) -> ResumeRecord {
    ResumeRecord {
        fingerprint: fingerprint.clone(),
        session_handle: entry.session_handle.clone(),
        destination: entry.destination.clone(),
        total_size: entry.total_size,
        created_at: entry.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fp: &str, handle: &str) -> ResumeRecord {
        ResumeRecord {
            fingerprint: Fingerprint::from_raw(fp),
            session_handle: handle.into(),
            destination: "hist1".into(),
            total_size: 1024,
            created_at: Utc::now(),
        }
    }

    fn test_store() -> (tempfile::TempDir, ResumeStore) {
        let tmp = tempfile::tempdir().unwrap();
        let store = ResumeStore::new(tmp.path().join("resume.json"));
        (tmp, store)
    }

    #[test]
    fn missing_file_is_empty() {
        let (_tmp, store) = test_store();
        assert!(store.lookup(&Fingerprint::from_raw("fp")).is_none());
        assert!(store.list().is_empty());
    }

    #[test]
    fn put_and_lookup() {
        let (_tmp, store) = test_store();
        let rec = record("fp1", "http://galaxy/api/upload/resumable_upload/abc");
        store.put(&rec).unwrap();
        assert_eq!(store.lookup(&rec.fingerprint).unwrap(), rec);
    }

    #[test]
    fn put_overwrites_same_fingerprint() {
        let (_tmp, store) = test_store();
        store.put(&record("fp1", "old")).unwrap();
        store.put(&record("fp1", "new")).unwrap();
        let found = store.lookup(&Fingerprint::from_raw("fp1")).unwrap();
        assert_eq!(found.session_handle, "new");
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn persists_across_instances() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("resume.json");
        {
            let store = ResumeStore::new(path.clone());
            store.put(&record("a", "h-a")).unwrap();
            store.put(&record("b", "h-b")).unwrap();
        }
        let reopened = ResumeStore::new(path);
        let fps: Vec<_> = reopened
            .list()
            .into_iter()
            .map(|r| r.fingerprint.to_string())
            .collect();
        assert_eq!(fps, vec!["a", "b"]);
    }

    #[test]
    fn remove_is_idempotent() {
        let (_tmp, store) = test_store();
        let rec = record("fp1", "h");
        store.put(&rec).unwrap();
        store.remove(&rec.fingerprint).unwrap();
        assert!(store.lookup(&rec.fingerprint).is_none());
        store.remove(&rec.fingerprint).unwrap();
        // Removing from a store file that never existed is fine too.
        let (_tmp2, empty) = test_store();
        empty.remove(&rec.fingerprint).unwrap();
    }

    #[test]
    fn corrupt_file_treated_as_empty() {
        let (_tmp, store) = test_store();
        std::fs::write(store.path(), b"{ not json").unwrap();
        assert!(store.lookup(&Fingerprint::from_raw("fp")).is_none());

        // A put replaces the corrupt content with a valid store.
        store.put(&record("fp", "h")).unwrap();
        assert!(store.lookup(&Fingerprint::from_raw("fp")).is_some());
    }

    #[test]
    fn other_writers_are_observed() {
        let (_tmp, store) = test_store();
        let other = ResumeStore::new(store.path().to_path_buf());
        other.put(&record("fp", "from-other")).unwrap();
        assert_eq!(
            store.lookup(&Fingerprint::from_raw("fp")).unwrap().session_handle,
            "from-other"
        );
    }

    #[test]
    fn on_disk_format_keyed_by_fingerprint() {
        let (_tmp, store) = test_store();
        store.put(&record("size:3--md5:abc", "h")).unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        let entry = &raw["size:3--md5:abc"];
        assert_eq!(entry["session_handle"], "h");
        assert_eq!(entry["destination"], "hist1");
        assert_eq!(entry["total_size"], 1024);
        assert!(entry["created_at"].is_string());
    }

    #[cfg(unix)]
    #[test]
    fn unwritable_location_is_storage_error() {
        let store = ResumeStore::new("/proc/gxupload-test/resume.json");
        let err = store.put(&record("fp", "h")).unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }));
    }
}
