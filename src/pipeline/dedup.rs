// src/pipeline/dedup.rs

//! Content fingerprinting and deduplication.
//!
//! The fingerprint over downloaded bytes is the sole dedup signal. Filename
//! collisions are not: two different URLs may serve byte-identical content
//! (a reposted PDF) and must be stored once, while two distinct documents
//! may share a filename and must both be kept.

use std::collections::HashSet;

use sha2::{Digest, Sha256};

use crate::models::DocumentReference;

/// Hex SHA-256 over exact byte content.
pub fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Decide whether a downloaded payload should be stored.
///
/// Pure: the caller persists the fingerprint only after the file write
/// commits, so a crash between download and commit just re-downloads.
pub fn should_store(bytes: &[u8], known: &HashSet<String>) -> (bool, String) {
    let fp = fingerprint(bytes);
    let accept = !known.contains(&fp);
    (accept, fp)
}

/// Fingerprint of the listing's PDF links, for unchanged-page detection.
///
/// Hashes only the links themselves so dynamic page chrome doesn't register
/// as a change.
pub fn page_fingerprint(references: &[DocumentReference]) -> String {
    let mut hasher = Sha256::new();
    for reference in references {
        hasher.update(reference.url.as_bytes());
        hasher.update(b"|");
        hasher.update(reference.title.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}
