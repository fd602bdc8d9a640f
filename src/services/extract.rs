// src/services/extract.rs

//! Link extraction from the results listing page.
//!
//! Pulls every anchor pointing at a PDF out of the raw markup and turns it
//! into a [`DocumentReference`]. Unparseable anchors are skipped, never
//! fatal; a broken page simply yields fewer candidates.

use std::collections::HashSet;

use scraper::{Html, Selector};
use url::Url;

use crate::models::DocumentReference;
use crate::utils::{filename_from_url, resolve_url, title_from_filename};

/// Extract PDF references from listing markup, in order of appearance.
///
/// Duplicate URLs keep their first (most recent) position. Position is the
/// 0-based index among the accepted references.
pub fn extract_references(html: &str, base_url: &Url) -> Vec<DocumentReference> {
    let document = Html::parse_document(html);
    // "a[href]" is a static, known-good selector
    let anchor_sel = Selector::parse("a[href]").expect("valid selector");

    let mut seen_urls = HashSet::new();
    let mut references = Vec::new();

    for anchor in document.select(&anchor_sel) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !href.to_lowercase().ends_with(".pdf") {
            continue;
        }

        let url = resolve_url(base_url, href);
        let Some(filename) = filename_from_url(&url) else {
            log::debug!("Skipping PDF link without usable filename: {url}");
            continue;
        };
        if !seen_urls.insert(url.clone()) {
            continue;
        }

        let label: String = anchor.text().collect::<String>();
        let label = label.split_whitespace().collect::<Vec<_>>().join(" ");
        let title = if label.is_empty() {
            title_from_filename(&filename)
        } else {
            label
        };

        let position = references.len();
        references.push(DocumentReference::new(url, title, filename, position));
    }

    references
}
