// src/models/tracked.rs

//! Persisted record of a downloaded document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DateSource;

/// A downloaded document tracked until its retention deadline.
///
/// One entry per distinct content fingerprint. Created when a download
/// commits; removed when the retention sweeper deletes the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedDocument {
    /// On-disk filename under the download directory
    pub filename: String,

    /// Display title from the listing link
    pub title: String,

    /// URL the document was fetched from
    pub source_url: String,

    /// Hex SHA-256 over the downloaded bytes
    pub fingerprint: String,

    pub downloaded_at: DateTime<Utc>,

    pub size_bytes: u64,

    /// `downloaded_at` plus the retention window
    pub expires_at: DateTime<Utc>,

    pub date_source: DateSource,
}

impl TrackedDocument {
    /// Whether the retention deadline has elapsed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Time left before deletion, clamped to zero.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> chrono::Duration {
        (self.expires_at - now).max(chrono::Duration::zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn tracked(expires_at: DateTime<Utc>) -> TrackedDocument {
        TrackedDocument {
            filename: "a.pdf".into(),
            title: "A".into(),
            source_url: "http://x/a.pdf".into(),
            fingerprint: "00".repeat(32),
            downloaded_at: expires_at - Duration::hours(24),
            size_bytes: 1024,
            expires_at,
            date_source: DateSource::ListingPosition,
        }
    }

    #[test]
    fn expiry_is_exact() {
        let deadline = Utc::now();
        let doc = tracked(deadline);

        assert!(!doc.is_expired(deadline - Duration::seconds(1)));
        assert!(doc.is_expired(deadline));
        assert!(doc.is_expired(deadline + Duration::seconds(1)));
    }

    #[test]
    fn time_remaining_clamps_to_zero() {
        let deadline = Utc::now();
        let doc = tracked(deadline);

        assert_eq!(
            doc.time_remaining(deadline + Duration::hours(1)),
            Duration::zero()
        );
        assert_eq!(
            doc.time_remaining(deadline - Duration::hours(2)),
            Duration::hours(2)
        );
    }
}
