// src/models/reference.rs

//! Ephemeral document references extracted from the listing page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Cursor;

/// Provenance of a reference's publication ordering.
///
/// The results page carries no sequence numbers, so ordering is derived from
/// whatever signal is available, in decreasing order of trust.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateSource {
    /// `Last-Modified` header obtained from a HEAD probe
    HttpHeader,
    /// 0-based position in the listing, newest first
    ListingPosition,
    /// No signal at all; treated as always newer than the cursor
    FallbackNow,
}

/// A candidate document discovered on the listing page.
///
/// Produced fresh on every pass; never persisted directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReference {
    /// Absolute URL of the PDF
    pub url: String,

    /// Link label text, or a title derived from the filename
    pub title: String,

    /// Sanitized filename inferred from the URL path
    pub filename: String,

    /// 0-based order of appearance in the listing (lower = more recent)
    pub position: usize,

    /// Publication date when the server exposes one
    pub published: Option<DateTime<Utc>>,

    /// Where the ordering signal came from
    pub date_source: DateSource,
}

impl DocumentReference {
    /// Create a reference with position-based ordering.
    pub fn new(url: String, title: String, filename: String, position: usize) -> Self {
        Self {
            url,
            title,
            filename,
            position,
            published: None,
            date_source: DateSource::ListingPosition,
        }
    }

    /// Attach a server-provided publication date.
    pub fn with_published(mut self, published: DateTime<Utc>) -> Self {
        self.published = Some(published);
        self.date_source = DateSource::HttpHeader;
        self
    }

    /// Whether this reference is published strictly after the cursor.
    ///
    /// Header dates are compared directly when both sides carry one.
    /// Otherwise listing position decides, assuming the page lists newest
    /// first and stays stable between fetches; an equal position with a
    /// different URL counts as after (the slot was replaced).
    pub fn is_after(&self, cursor: &Cursor) -> bool {
        match self.date_source {
            DateSource::FallbackNow => true,
            DateSource::HttpHeader if cursor.date_source == DateSource::HttpHeader => {
                self.published.is_some_and(|d| d > cursor.timestamp)
            }
            _ => {
                self.position < cursor.position
                    || (self.position == cursor.position && self.url != cursor.url)
            }
        }
    }

    /// Case-insensitive keyword match over filename and title.
    ///
    /// An empty or absent keyword accepts everything.
    pub fn matches_keyword(&self, keyword: Option<&str>) -> bool {
        match keyword {
            None => true,
            Some(k) if k.is_empty() => true,
            Some(k) => {
                let haystack = format!("{} {}", self.filename, self.title).to_lowercase();
                haystack.contains(&k.to_lowercase())
            }
        }
    }
}
