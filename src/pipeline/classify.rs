// src/pipeline/classify.rs

//! Change detection: classify candidates against persisted state and decide
//! how the cursor advances after a pass.
//!
//! The results page offers no feed, no sequence numbers, and no reliable
//! ETags, so "new" is derived from three persisted signals: the resume
//! cursor, the set of already-processed reference URLs, and the tracked
//! document records. The keyword filter is applied before any of them, and
//! filtered-out candidates leave no trace in persisted state, so a later
//! run with a different (or no) filter still surfaces them.

use chrono::{DateTime, Utc};

use crate::models::{Cursor, DocumentReference};
use crate::storage::StoreState;

/// Result of classifying one pass's candidates.
#[derive(Debug, Default)]
pub struct Classification {
    /// Candidates to download, in listing order (most recent first)
    pub eligible: Vec<DocumentReference>,

    /// Filtered-in candidates already recorded or already processed
    pub seen: usize,

    /// Candidates the keyword filter excluded
    pub filtered_out: usize,

    /// Eligible candidates dropped by the initial-run batch cap
    pub truncated: usize,
}

/// Classify candidates into eligible / seen / filtered-out.
///
/// A filtered-in candidate is eligible when it is not recorded in the store
/// and either sorts strictly after the cursor or was never processed at all.
/// The second branch is what lets a failed download retry and lets an
/// unfiltered run pick up documents an earlier filtered run skipped over.
///
/// With no cursor (first run, or corrupt state) everything unrecorded is
/// eligible, truncated to `initial_batch_limit` keeping the most recent
/// (lowest) positions.
pub fn classify(
    candidates: Vec<DocumentReference>,
    cursor: Option<&Cursor>,
    state: &StoreState,
    keyword: Option<&str>,
    initial_batch_limit: usize,
) -> Classification {
    let mut result = Classification::default();

    for candidate in candidates {
        if !candidate.matches_keyword(keyword) {
            result.filtered_out += 1;
            continue;
        }

        if state.is_recorded(&candidate) {
            result.seen += 1;
            continue;
        }

        let eligible = match cursor {
            None => true,
            Some(cursor) => {
                candidate.is_after(cursor)
                    || !state.monitor.processed_urls.contains(&candidate.url)
            }
        };

        if eligible {
            result.eligible.push(candidate);
        } else {
            result.seen += 1;
        }
    }

    if cursor.is_none() && result.eligible.len() > initial_batch_limit {
        // Candidates arrive in listing order, so truncating the tail keeps
        // the most recent positions.
        result.truncated = result.eligible.len() - initial_batch_limit;
        result.eligible.truncate(initial_batch_limit);
    }

    result
}

/// Compute the cursor after a pass.
///
/// The cursor moves to the completed candidate (downloaded or skipped as a
/// byte-identical duplicate) with the smallest position, but never past a
/// failed candidate: a failure at position p pins the cursor above p so the
/// item stays strictly after it and is retried next pass. Returns `None`
/// when the cursor should not move.
pub fn advance_cursor(
    current: Option<&Cursor>,
    completed: &[DocumentReference],
    failed: &[DocumentReference],
    now: DateTime<Utc>,
) -> Option<Cursor> {
    let failure_bound = failed.iter().map(|r| r.position).max();

    let best = completed
        .iter()
        .filter(|r| failure_bound.is_none_or(|bound| r.position > bound))
        .min_by_key(|r| r.position)?;

    match current {
        Some(cursor) if !best.is_after(cursor) => None,
        _ => Some(Cursor::from_reference(best, now)),
    }
}
