// src/pipeline/sweep.rs

//! Retention sweeper.
//!
//! Deletes downloaded files once their retention deadline elapses, measured
//! from the download time, independent of monitoring activity.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::models::TrackedDocument;
use crate::storage::MetadataStore;

/// Result of sweeping one expired document.
#[derive(Debug)]
pub struct SweepOutcome {
    pub filename: String,
    /// True when a file was actually removed; an already-absent file is a
    /// no-op, not an error
    pub deleted: bool,
    pub error: Option<String>,
}

/// Delete expired documents and clear their records.
///
/// Idempotent, and a failure on one document never aborts the rest; each
/// outcome carries its own error. Returns one outcome per expired document.
pub async fn sweep(
    now: DateTime<Utc>,
    tracked: &BTreeMap<String, TrackedDocument>,
    download_dir: &Path,
    store: &dyn MetadataStore,
) -> Vec<SweepOutcome> {
    let mut outcomes = Vec::new();

    for document in tracked.values().filter(|d| d.is_expired(now)) {
        let path = download_dir.join(&document.filename);
        let mut outcome = SweepOutcome {
            filename: document.filename.clone(),
            deleted: false,
            error: None,
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => outcome.deleted = true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                outcome.error = Some(format!("delete failed: {e}"));
                log::warn!("Could not delete expired file {}: {e}", path.display());
                outcomes.push(outcome);
                continue;
            }
        }

        if let Err(e) = store.remove_document(&document.filename).await {
            outcome.error = Some(format!("record removal failed: {e}"));
            log::warn!(
                "Could not remove record for expired file {}: {e}",
                document.filename
            );
        } else if outcome.deleted {
            log::info!("Deleted expired file: {}", document.filename);
        }

        outcomes.push(outcome);
    }

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DateSource;
    use crate::storage::{JsonStore, StoreState};
    use chrono::Duration;
    use tempfile::TempDir;

    fn document(filename: &str, expires_at: DateTime<Utc>) -> TrackedDocument {
        TrackedDocument {
            filename: filename.to_string(),
            title: filename.to_string(),
            source_url: format!("http://x/{filename}"),
            fingerprint: format!("{filename:0>64}"),
            downloaded_at: expires_at - Duration::hours(24),
            size_bytes: 4,
            expires_at,
            date_source: DateSource::ListingPosition,
        }
    }

    async fn seeded_store(tmp: &TempDir, docs: &[TrackedDocument]) -> (JsonStore, StoreState) {
        let store = JsonStore::new(tmp.path().join("metadata"));
        for doc in docs {
            store.commit_document(doc).await.unwrap();
        }
        let state = store.load().await.unwrap();
        (store, state)
    }

    #[tokio::test]
    async fn expired_file_is_deleted_and_untracked() {
        let tmp = TempDir::new().unwrap();
        let now = Utc::now();
        let doc = document("old.pdf", now - Duration::seconds(1));
        std::fs::write(tmp.path().join("old.pdf"), b"stale").unwrap();

        let (store, state) = seeded_store(&tmp, std::slice::from_ref(&doc)).await;
        let outcomes = sweep(now, &state.tracked, tmp.path(), &store).await;

        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].deleted);
        assert!(outcomes[0].error.is_none());
        assert!(!tmp.path().join("old.pdf").exists());
        assert!(store.load().await.unwrap().tracked.is_empty());
    }

    #[tokio::test]
    async fn unexpired_file_is_left_alone() {
        let tmp = TempDir::new().unwrap();
        let now = Utc::now();
        let doc = document("fresh.pdf", now + Duration::hours(1));
        std::fs::write(tmp.path().join("fresh.pdf"), b"fresh").unwrap();

        let (store, state) = seeded_store(&tmp, std::slice::from_ref(&doc)).await;
        let outcomes = sweep(now, &state.tracked, tmp.path(), &store).await;

        assert!(outcomes.is_empty());
        assert!(tmp.path().join("fresh.pdf").exists());
        assert_eq!(store.load().await.unwrap().tracked.len(), 1);
    }

    #[tokio::test]
    async fn sweeping_missing_file_is_a_noop_not_an_error() {
        let tmp = TempDir::new().unwrap();
        let now = Utc::now();
        let doc = document("gone.pdf", now - Duration::hours(1));

        let (store, state) = seeded_store(&tmp, std::slice::from_ref(&doc)).await;
        let outcomes = sweep(now, &state.tracked, tmp.path(), &store).await;

        assert_eq!(outcomes.len(), 1);
        assert!(!outcomes[0].deleted);
        assert!(outcomes[0].error.is_none());
        // Record is cleared even though the file was already absent.
        assert!(store.load().await.unwrap().tracked.is_empty());
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_the_rest() {
        let tmp = TempDir::new().unwrap();
        let now = Utc::now();

        // "locked.pdf" is a non-empty directory, so remove_file fails on it.
        let locked = tmp.path().join("locked.pdf");
        std::fs::create_dir(&locked).unwrap();
        std::fs::write(locked.join("inner"), b"x").unwrap();
        std::fs::write(tmp.path().join("ok.pdf"), b"y").unwrap();

        let docs = vec![
            document("locked.pdf", now - Duration::hours(1)),
            document("ok.pdf", now - Duration::hours(1)),
        ];
        let (store, state) = seeded_store(&tmp, &docs).await;
        let outcomes = sweep(now, &state.tracked, tmp.path(), &store).await;

        assert_eq!(outcomes.len(), 2);
        let by_name = |n: &str| outcomes.iter().find(|o| o.filename == n).unwrap();
        assert!(by_name("locked.pdf").error.is_some());
        assert!(by_name("ok.pdf").deleted);
        assert!(!tmp.path().join("ok.pdf").exists());

        // The failed document stays tracked for the next sweep.
        let remaining = store.load().await.unwrap().tracked;
        assert!(remaining.contains_key("locked.pdf"));
        assert!(!remaining.contains_key("ok.pdf"));
    }

    #[tokio::test]
    async fn retention_boundary_is_exact() {
        let tmp = TempDir::new().unwrap();
        let deadline = Utc::now();
        let doc = document("exact.pdf", deadline);
        std::fs::write(tmp.path().join("exact.pdf"), b"z").unwrap();

        let (store, state) = seeded_store(&tmp, std::slice::from_ref(&doc)).await;

        let before = sweep(deadline - Duration::seconds(1), &state.tracked, tmp.path(), &store).await;
        assert!(before.is_empty());
        assert!(tmp.path().join("exact.pdf").exists());

        let after = sweep(deadline + Duration::seconds(1), &state.tracked, tmp.path(), &store).await;
        assert_eq!(after.len(), 1);
        assert!(after[0].deleted);
    }
}
