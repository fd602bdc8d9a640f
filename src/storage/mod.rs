// src/storage/mod.rs

//! Storage abstractions for tracking metadata.
//!
//! One logical record per tracked document, plus a singleton cursor record,
//! the monitor state, and advisory stats.
//!
//! ## Directory Structure
//!
//! ```text
//! results/
//! ├── *.pdf                 # Downloaded documents
//! └── metadata/
//!     ├── tracked.json      # filename -> TrackedDocument
//!     ├── cursor.json       # Resume cursor (singleton)
//!     ├── monitor.json      # Processed references + page fingerprint
//!     └── stats.json        # Advisory counters
//! ```

pub mod json;

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Cursor, DocumentReference, MonitorState, MonitorStats, TrackedDocument};

// Re-export for convenience
pub use json::JsonStore;

/// Everything the store knows, loaded at pass start.
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    pub cursor: Option<Cursor>,
    /// Tracked documents keyed by on-disk filename
    pub tracked: BTreeMap<String, TrackedDocument>,
    pub monitor: MonitorState,
    pub stats: MonitorStats,
}

impl StoreState {
    /// Fingerprints of all currently tracked documents.
    pub fn known_fingerprints(&self) -> HashSet<String> {
        self.tracked
            .values()
            .map(|doc| doc.fingerprint.clone())
            .collect()
    }

    /// Whether a candidate is already recorded as a tracked document.
    ///
    /// Matches on source URL; a bare filename collision is deliberately not
    /// enough, since two distinct documents may share a filename.
    pub fn is_recorded(&self, reference: &DocumentReference) -> bool {
        self.tracked
            .values()
            .any(|doc| doc.source_url == reference.url)
    }
}

/// Trait for metadata persistence backends.
///
/// All writes must be atomic at the file level: an interrupted commit leaves
/// the previous record intact, never a half-written one.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Load persisted state. Corrupt records degrade to their defaults with
    /// a logged warning rather than failing the pass.
    async fn load(&self) -> Result<StoreState>;

    /// Record a tracked document after its file write committed.
    async fn commit_document(&self, document: &TrackedDocument) -> Result<()>;

    /// Remove a tracked document's record. Missing entries are a no-op.
    async fn remove_document(&self, filename: &str) -> Result<()>;

    /// Replace the singleton cursor.
    async fn commit_cursor(&self, cursor: &Cursor) -> Result<()>;

    /// Replace the monitor state.
    async fn commit_monitor(&self, state: &MonitorState) -> Result<()>;

    /// Replace the advisory stats record.
    async fn commit_stats(&self, stats: &MonitorStats) -> Result<()>;
}
