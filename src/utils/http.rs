// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::config::HttpConfig;
use crate::error::Result;

/// Create a configured asynchronous HTTP client.
pub fn create_client(config: &HttpConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetch a page body with retries for transient failures.
///
/// Retries with a short linear backoff between attempts.
pub async fn fetch_text(client: &reqwest::Client, url: &str, attempts: u32) -> Result<String> {
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        let err = match client.get(url).send().await {
            Ok(response) => match response.error_for_status() {
                Ok(response) => return Ok(response.text().await?),
                Err(e) => e,
            },
            Err(e) => e,
        };

        if attempt >= attempts {
            return Err(err.into());
        }

        let wait = Duration::from_secs(2 * attempt as u64);
        log::warn!("Fetch attempt {attempt} failed for {url}: {err}. Retrying in {wait:?}");
        tokio::time::sleep(wait).await;
        attempt += 1;
    }
}
