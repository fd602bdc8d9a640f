// src/models/cursor.rs

//! Persisted resume cursor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DateSource, DocumentReference};

/// Pointer to the most recently processed document reference.
///
/// At most one cursor exists. It moves only forward in publication order
/// (smaller listing position, or later header date), except via an explicit
/// `--start-from` override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub filename: String,
    pub title: String,
    pub url: String,

    /// Header date when `date_source` is `http_header`, otherwise the time
    /// the cursor was recorded.
    pub timestamp: DateTime<Utc>,

    /// Listing position the reference held when processed
    pub position: usize,

    pub date_source: DateSource,
}

impl Cursor {
    /// Build a cursor from a processed reference.
    pub fn from_reference(reference: &DocumentReference, now: DateTime<Utc>) -> Self {
        Self {
            filename: reference.filename.clone(),
            title: reference.title.clone(),
            url: reference.url.clone(),
            timestamp: reference.published.unwrap_or(now),
            position: reference.position,
            date_source: reference.date_source,
        }
    }

    /// Build an override cursor from a raw position supplied by the caller.
    ///
    /// Everything at a lower position (more recent) becomes eligible again,
    /// and with an empty `url` so does the item holding the start position
    /// itself, via the replaced-slot rule in `is_after`.
    pub fn override_at(position: usize, url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            filename: String::new(),
            title: String::new(),
            url,
            timestamp: Utc::now(),
            position,
            date_source: DateSource::ListingPosition,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_reference_uses_published_date_when_present() {
        let now = Utc::now();
        let published = now - chrono::Duration::days(3);
        let reference = DocumentReference::new(
            "http://x/a.pdf".into(),
            "A".into(),
            "a.pdf".into(),
            2,
        )
        .with_published(published);

        let cursor = Cursor::from_reference(&reference, now);
        assert_eq!(cursor.timestamp, published);
        assert_eq!(cursor.position, 2);
        assert_eq!(cursor.date_source, DateSource::HttpHeader);
    }

    #[test]
    fn override_includes_the_start_position_itself() {
        let cursor = Cursor::override_at(3, "");

        let at_start =
            DocumentReference::new("http://x/c.pdf".into(), "C".into(), "c.pdf".into(), 3);
        let newer = DocumentReference::new("http://x/b.pdf".into(), "B".into(), "b.pdf".into(), 1);
        let older = DocumentReference::new("http://x/d.pdf".into(), "D".into(), "d.pdf".into(), 4);

        assert!(at_start.is_after(&cursor));
        assert!(newer.is_after(&cursor));
        assert!(!older.is_after(&cursor));
    }

    #[test]
    fn from_reference_falls_back_to_now() {
        let now = Utc::now();
        let reference =
            DocumentReference::new("http://x/a.pdf".into(), "A".into(), "a.pdf".into(), 0);

        let cursor = Cursor::from_reference(&reference, now);
        assert_eq!(cursor.timestamp, now);
        assert_eq!(cursor.date_source, DateSource::ListingPosition);
    }
}
