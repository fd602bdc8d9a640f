// src/services/download.rs

//! Document download service.

use std::time::Duration;

use reqwest::Client;

use crate::config::Config;
use crate::error::{AppError, Result};

/// Downloads single documents with per-item retry.
#[derive(Clone)]
pub struct Downloader {
    client: Client,
    retry_attempts: u32,
}

impl Downloader {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            retry_attempts: config.http.retry_attempts.max(1),
        }
    }

    /// Fetch a document's bytes, retrying transient failures.
    ///
    /// Backs off 2s, then 4s between attempts.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let mut attempt = 1;
        loop {
            let err = match self.try_fetch(url).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) => e,
            };

            if attempt >= self.retry_attempts {
                return Err(AppError::download(url, err));
            }

            let wait = Duration::from_secs(2 * attempt as u64);
            log::warn!("Download attempt {attempt} failed for {url}, retrying in {wait:?}");
            tokio::time::sleep(wait).await;
            attempt += 1;
        }
    }

    async fn try_fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}
