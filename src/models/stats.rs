// src/models/stats.rs

//! Persisted monitoring state and advisory counters.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Change-detection state carried between passes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorState {
    /// URLs of references fully processed in earlier passes.
    ///
    /// Only filtered-in references that completed (downloaded or skipped as
    /// duplicates) are recorded here. References a keyword filter excluded
    /// stay out, so a later unfiltered run still surfaces them.
    pub processed_urls: BTreeSet<String>,

    /// SHA-256 over the listing's PDF links, used to skip unchanged pages
    pub page_fingerprint: String,

    /// Keyword filter in effect when `page_fingerprint` was recorded. A pass
    /// with a different filter must re-classify even an unchanged listing,
    /// otherwise documents the recorded filter excluded stay invisible.
    pub keyword: Option<String>,

    /// Download failures in the previous pass; a non-zero value disables the
    /// unchanged-page short-circuit so failed items are retried
    pub last_pass_failures: u64,
}

impl MonitorState {
    /// Whether classification can be skipped for an unchanged listing.
    pub fn can_short_circuit(&self, current_fingerprint: &str, keyword: Option<&str>) -> bool {
        !self.page_fingerprint.is_empty()
            && self.page_fingerprint == current_fingerprint
            && self.keyword.as_deref() == keyword
            && self.last_pass_failures == 0
    }
}

/// Advisory counters; written every pass, never read back to drive logic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorStats {
    pub total_checks: u64,
    pub new_documents_found: u64,
    pub total_downloaded: u64,
    pub total_skipped: u64,
    pub last_check: Option<DateTime<Utc>>,
}

impl MonitorStats {
    /// Record that a check ran at the given time.
    pub fn record_check(&mut self, now: DateTime<Utc>) {
        self.total_checks += 1;
        self.last_check = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_circuit_requires_clean_previous_pass() {
        let mut state = MonitorState {
            page_fingerprint: "abc".into(),
            ..MonitorState::default()
        };
        assert!(state.can_short_circuit("abc", None));
        assert!(!state.can_short_circuit("def", None));

        state.last_pass_failures = 1;
        assert!(!state.can_short_circuit("abc", None));
    }

    #[test]
    fn changed_keyword_defeats_short_circuit() {
        let state = MonitorState {
            page_fingerprint: "abc".into(),
            keyword: Some("btech".into()),
            ..MonitorState::default()
        };
        assert!(state.can_short_circuit("abc", Some("btech")));
        assert!(!state.can_short_circuit("abc", Some("mba")));
        assert!(!state.can_short_circuit("abc", None));

        let unfiltered = MonitorState {
            page_fingerprint: "abc".into(),
            ..MonitorState::default()
        };
        assert!(!unfiltered.can_short_circuit("abc", Some("btech")));
    }

    #[test]
    fn empty_fingerprint_never_short_circuits() {
        let state = MonitorState::default();
        assert!(!state.can_short_circuit("", None));
    }

    #[test]
    fn record_check_increments() {
        let mut stats = MonitorStats::default();
        let now = Utc::now();
        stats.record_check(now);
        stats.record_check(now);
        assert_eq!(stats.total_checks, 2);
        assert_eq!(stats.last_check, Some(now));
    }
}
