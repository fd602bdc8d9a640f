// src/services/listing.rs

//! Listing page retrieval and publication-date probing.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use url::Url;

use crate::config::Config;
use crate::error::Result;
use crate::models::DocumentReference;
use crate::services::extract_references;
use crate::utils::http::fetch_text;

/// Fetches the results listing and enriches candidates with header dates.
pub struct ListingFetcher {
    client: Client,
    base_url: Url,
    retry_attempts: u32,
    max_concurrent: usize,
}

impl ListingFetcher {
    /// Create a fetcher for the configured listing URL.
    pub fn new(client: Client, config: &Config) -> Result<Self> {
        Ok(Self {
            client,
            base_url: Url::parse(&config.monitor.base_url)?,
            retry_attempts: config.http.retry_attempts,
            max_concurrent: config.http.max_concurrent.max(1),
        })
    }

    /// Base URL of the monitored listing page.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch the raw listing markup.
    pub async fn fetch_listing(&self) -> Result<String> {
        fetch_text(&self.client, self.base_url.as_str(), self.retry_attempts).await
    }

    /// Fetch the listing and extract candidate references.
    pub async fn fetch_references(&self) -> Result<Vec<DocumentReference>> {
        let html = self.fetch_listing().await?;
        Ok(extract_references(&html, &self.base_url))
    }

    /// Probe each candidate with a HEAD request for a `Last-Modified` date.
    ///
    /// A failed or dateless probe leaves the candidate on position-based
    /// ordering. Probes run with the same bounded concurrency as downloads.
    pub async fn probe_published(
        &self,
        references: Vec<DocumentReference>,
    ) -> Vec<DocumentReference> {
        let mut probed: Vec<DocumentReference> = stream::iter(references)
            .map(|reference| async move {
                match self.head_last_modified(&reference.url).await {
                    Some(date) => reference.with_published(date),
                    None => reference,
                }
            })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        // buffer_unordered loses listing order
        probed.sort_by_key(|r| r.position);
        probed
    }

    async fn head_last_modified(&self, url: &str) -> Option<DateTime<Utc>> {
        let response = self.client.head(url).send().await.ok()?;
        let header = response.headers().get(reqwest::header::LAST_MODIFIED)?;
        let raw = header.to_str().ok()?;
        DateTime::parse_from_rfc2822(raw)
            .ok()
            .map(|d| d.with_timezone(&Utc))
    }
}
