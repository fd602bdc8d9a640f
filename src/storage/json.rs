// src/storage/json.rs

//! JSON-file metadata store.
//!
//! Each record lives in its own pretty-printed JSON file under the metadata
//! directory. Writes go to a `.tmp` sibling first and are renamed into
//! place, so interruption at any point leaves the previous record readable.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{Cursor, MonitorState, MonitorStats, TrackedDocument};
use crate::storage::{MetadataStore, StoreState};

const TRACKED_FILE: &str = "tracked.json";
const CURSOR_FILE: &str = "cursor.json";
const MONITOR_FILE: &str = "monitor.json";
const STATS_FILE: &str = "stats.json";

/// Metadata store backed by JSON files.
#[derive(Clone)]
pub struct JsonStore {
    root_dir: PathBuf,
}

impl JsonStore {
    /// Create a store rooted at the given metadata directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if the file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Read a record, falling back to its default when corrupt.
    ///
    /// Corruption is surfaced to the operator as a warning; the monitor then
    /// behaves as on a first run rather than refusing to start.
    async fn read_json_lenient<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.read_json(key).await {
            Ok(Some(value)) => value,
            Ok(None) => T::default(),
            Err(e) => {
                log::warn!("Persisted state {key} is unreadable ({e}); starting from scratch");
                T::default()
            }
        }
    }

    async fn load_tracked(&self) -> BTreeMap<String, TrackedDocument> {
        self.read_json_lenient(TRACKED_FILE).await
    }
}

#[async_trait]
impl MetadataStore for JsonStore {
    async fn load(&self) -> Result<StoreState> {
        let cursor = match self.read_json::<Cursor>(CURSOR_FILE).await {
            Ok(cursor) => cursor,
            Err(e) => {
                log::warn!("Cursor record is unreadable ({e}); treating as first run");
                None
            }
        };

        Ok(StoreState {
            cursor,
            tracked: self.load_tracked().await,
            monitor: self.read_json_lenient(MONITOR_FILE).await,
            stats: self.read_json_lenient(STATS_FILE).await,
        })
    }

    async fn commit_document(&self, document: &TrackedDocument) -> Result<()> {
        let mut tracked = self.load_tracked().await;
        tracked.insert(document.filename.clone(), document.clone());
        self.write_json(TRACKED_FILE, &tracked).await
    }

    async fn remove_document(&self, filename: &str) -> Result<()> {
        let mut tracked = self.load_tracked().await;
        if tracked.remove(filename).is_some() {
            self.write_json(TRACKED_FILE, &tracked).await?;
        }
        Ok(())
    }

    async fn commit_cursor(&self, cursor: &Cursor) -> Result<()> {
        self.write_json(CURSOR_FILE, cursor).await
    }

    async fn commit_monitor(&self, state: &MonitorState) -> Result<()> {
        self.write_json(MONITOR_FILE, state).await
    }

    async fn commit_stats(&self, stats: &MonitorStats) -> Result<()> {
        self.write_json(STATS_FILE, stats).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DateSource;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    fn sample_document(filename: &str) -> TrackedDocument {
        let now = Utc::now();
        TrackedDocument {
            filename: filename.to_string(),
            title: "BTech Sem 1".to_string(),
            source_url: format!("http://ggsipu.ac.in/ExamResults/{filename}"),
            fingerprint: "ab".repeat(32),
            downloaded_at: now,
            size_bytes: 2048,
            expires_at: now + Duration::hours(24),
            date_source: DateSource::ListingPosition,
        }
    }

    #[tokio::test]
    async fn empty_store_loads_defaults() {
        let tmp = TempDir::new().unwrap();
        let store = JsonStore::new(tmp.path());

        let state = store.load().await.unwrap();
        assert!(state.cursor.is_none());
        assert!(state.tracked.is_empty());
        assert_eq!(state.stats.total_checks, 0);
    }

    #[tokio::test]
    async fn document_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = JsonStore::new(tmp.path());

        let doc = sample_document("a.pdf");
        store.commit_document(&doc).await.unwrap();

        let state = store.load().await.unwrap();
        assert_eq!(state.tracked.len(), 1);
        assert_eq!(state.tracked["a.pdf"], doc);

        store.remove_document("a.pdf").await.unwrap();
        let state = store.load().await.unwrap();
        assert!(state.tracked.is_empty());
    }

    #[tokio::test]
    async fn remove_missing_document_is_noop() {
        let tmp = TempDir::new().unwrap();
        let store = JsonStore::new(tmp.path());

        store.remove_document("nope.pdf").await.unwrap();
    }

    #[tokio::test]
    async fn cursor_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = JsonStore::new(tmp.path());

        let cursor = Cursor {
            filename: "a.pdf".into(),
            title: "A".into(),
            url: "http://x/a.pdf".into(),
            timestamp: Utc::now(),
            position: 3,
            date_source: DateSource::ListingPosition,
        };
        store.commit_cursor(&cursor).await.unwrap();

        let state = store.load().await.unwrap();
        assert_eq!(state.cursor, Some(cursor));
    }

    #[tokio::test]
    async fn corrupt_cursor_falls_back_to_first_run() {
        let tmp = TempDir::new().unwrap();
        let store = JsonStore::new(tmp.path());

        std::fs::write(tmp.path().join(CURSOR_FILE), b"{not json").unwrap();
        std::fs::write(tmp.path().join(TRACKED_FILE), b"also not json").unwrap();

        let state = store.load().await.unwrap();
        assert!(state.cursor.is_none());
        assert!(state.tracked.is_empty());
    }

    #[tokio::test]
    async fn writes_leave_no_tmp_files() {
        let tmp = TempDir::new().unwrap();
        let store = JsonStore::new(tmp.path());

        store
            .commit_stats(&MonitorStats::default())
            .await
            .unwrap();
        store
            .commit_monitor(&MonitorState::default())
            .await
            .unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn monitor_state_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = JsonStore::new(tmp.path());

        let mut monitor = MonitorState::default();
        monitor.processed_urls.insert("http://x/a.pdf".into());
        monitor.page_fingerprint = "cafe".into();
        store.commit_monitor(&monitor).await.unwrap();

        let state = store.load().await.unwrap();
        assert!(state.monitor.processed_urls.contains("http://x/a.pdf"));
        assert_eq!(state.monitor.page_fingerprint, "cafe");
    }
}
