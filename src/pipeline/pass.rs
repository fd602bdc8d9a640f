// src/pipeline/pass.rs

//! Pass driver: fetch → extract → classify → download → record → sweep.
//!
//! A pass is sequential; only the downloads inside it fan out, bounded by
//! `http.max_concurrent`. Results are drained on this task, so every store
//! write and the single cursor update are serialized by construction.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use futures::stream::{self, StreamExt};

use crate::config::Config;
use crate::error::Result;
use crate::models::{Cursor, DocumentReference, TrackedDocument};
use crate::pipeline::{advance_cursor, classify, dedup, sweep};
use crate::services::{Downloader, ListingFetcher};
use crate::storage::{MetadataStore, StoreState};
use crate::utils::{format_size, sanitize_filename};

/// Shared collaborators for running passes.
pub struct PassContext<'a> {
    pub config: &'a Config,
    pub fetcher: &'a ListingFetcher,
    pub downloader: &'a Downloader,
    pub store: &'a dyn MetadataStore,
}

/// Per-invocation options.
#[derive(Debug, Default, Clone)]
pub struct PassOptions {
    /// Case-insensitive substring filter over filename and title
    pub keyword: Option<String>,

    /// Replaces the persisted cursor before classification
    pub override_cursor: Option<Cursor>,

    /// Download-all mode: ignore cursor and processed set, no batch cap,
    /// and leave the cursor untouched
    pub ignore_cursor: bool,
}

/// What happened during one pass.
#[derive(Debug, Default)]
pub struct PassSummary {
    pub found: usize,
    pub eligible: usize,
    pub downloaded: usize,
    pub duplicates: usize,
    pub failed: usize,
    pub seen: usize,
    pub filtered_out: usize,
    pub swept: usize,
    pub bytes_downloaded: u64,
    /// Listing unchanged since last clean pass; classification skipped
    pub short_circuited: bool,
}

impl PassSummary {
    /// Log the end-of-pass summary, printed regardless of partial failures.
    pub fn log(&self) {
        if self.short_circuited {
            log::info!(
                "No changes detected on the listing page ({} swept)",
                self.swept
            );
            return;
        }
        log::info!(
            "Pass complete: {} found, {} eligible, {} downloaded ({}), \
             {} duplicate, {} failed, {} already seen, {} filtered out, {} swept",
            self.found,
            self.eligible,
            self.downloaded,
            format_size(self.bytes_downloaded),
            self.duplicates,
            self.failed,
            self.seen,
            self.filtered_out,
            self.swept
        );
    }
}

/// Run one full monitoring pass.
pub async fn run_pass(ctx: &PassContext<'_>, options: &PassOptions) -> Result<PassSummary> {
    let now = Utc::now();
    let download_dir = ctx.config.download_dir();
    tokio::fs::create_dir_all(&download_dir).await?;

    let mut state = ctx.store.load().await?;
    let mut summary = PassSummary::default();

    // Sweeping runs first and independently of detection.
    let swept = sweep(now, &state.tracked, &download_dir, ctx.store).await;
    for outcome in &swept {
        if outcome.error.is_none() {
            state.tracked.remove(&outcome.filename);
        }
    }
    summary.swept = swept.iter().filter(|o| o.deleted).count();

    let references = ctx.fetcher.fetch_references().await?;
    summary.found = references.len();
    state.stats.record_check(now);

    let page_fp = dedup::page_fingerprint(&references);
    let plain_monitor_pass = !options.ignore_cursor && options.override_cursor.is_none();
    if plain_monitor_pass
        && state
            .monitor
            .can_short_circuit(&page_fp, options.keyword.as_deref())
    {
        summary.short_circuited = true;
        ctx.store.commit_stats(&state.stats).await?;
        summary.log();
        return Ok(summary);
    }

    let references = ctx.fetcher.probe_published(references).await;
    let listed_urls: BTreeSet<String> = references.iter().map(|r| r.url.clone()).collect();

    let effective_cursor = options
        .override_cursor
        .clone()
        .or_else(|| state.cursor.clone());

    let classification = if options.ignore_cursor {
        // Bulk mode: everything unrecorded that passes the filter.
        classify(references, None, &state, options.keyword.as_deref(), usize::MAX)
    } else {
        classify(
            references,
            effective_cursor.as_ref(),
            &state,
            options.keyword.as_deref(),
            ctx.config.monitor.initial_batch_limit,
        )
    };
    summary.eligible = classification.eligible.len();
    summary.seen = classification.seen;
    summary.filtered_out = classification.filtered_out;
    if classification.truncated > 0 {
        log::info!(
            "Initial run: limiting to the {} most recent of {} new documents",
            ctx.config.monitor.initial_batch_limit,
            summary.eligible + classification.truncated
        );
    }

    let (completed, failed) = download_eligible(ctx, classification.eligible, &mut state, &mut summary)
        .await;

    if !options.ignore_cursor {
        if let Some(cursor) = advance_cursor(effective_cursor.as_ref(), &completed, &failed, now) {
            log::info!(
                "Cursor advanced to {} (position {})",
                cursor.filename,
                cursor.position
            );
            ctx.store.commit_cursor(&cursor).await?;
        } else if let Some(override_cursor) = &options.override_cursor {
            ctx.store.commit_cursor(override_cursor).await?;
        }
    }

    // Entries that left the listing can never become candidates again.
    state
        .monitor
        .processed_urls
        .retain(|url| listed_urls.contains(url));
    for reference in &completed {
        state.monitor.processed_urls.insert(reference.url.clone());
    }
    state.monitor.page_fingerprint = page_fp;
    state.monitor.keyword = options.keyword.clone();
    state.monitor.last_pass_failures = summary.failed as u64;
    ctx.store.commit_monitor(&state.monitor).await?;

    state.stats.new_documents_found += summary.eligible as u64;
    state.stats.total_downloaded += summary.downloaded as u64;
    state.stats.total_skipped += (summary.duplicates + summary.seen) as u64;
    ctx.store.commit_stats(&state.stats).await?;

    summary.log();
    Ok(summary)
}

/// Download eligible candidates with bounded concurrency and commit each
/// result as it completes.
///
/// Returns the references that completed (downloaded or duplicate-skipped)
/// and those that failed.
async fn download_eligible(
    ctx: &PassContext<'_>,
    eligible: Vec<DocumentReference>,
    state: &mut StoreState,
    summary: &mut PassSummary,
) -> (Vec<DocumentReference>, Vec<DocumentReference>) {
    let download_dir = ctx.config.download_dir();
    let concurrency = ctx.config.http.max_concurrent.max(1);
    let mut known_fingerprints = state.known_fingerprints();

    let mut completed = Vec::new();
    let mut failed = Vec::new();

    let mut downloads = stream::iter(eligible)
        .map(|reference| async move {
            let result = ctx.downloader.fetch(&reference.url).await;
            (reference, result)
        })
        .buffer_unordered(concurrency);

    while let Some((reference, result)) = downloads.next().await {
        let bytes = match result {
            Ok(bytes) => bytes,
            Err(error) => {
                log::error!("Failed to download {}: {error}", reference.filename);
                summary.failed += 1;
                failed.push(reference);
                continue;
            }
        };

        // Check-then-commit happens here on the driver task, so concurrent
        // downloads cannot race the fingerprint set.
        let (accept, fingerprint) = dedup::should_store(&bytes, &known_fingerprints);
        if !accept {
            log::info!(
                "Skipping {} (byte-identical content already stored)",
                reference.filename
            );
            summary.duplicates += 1;
            completed.push(reference);
            continue;
        }

        match store_document(ctx, &download_dir, &reference, &bytes, &fingerprint, state).await {
            Ok(document) => {
                log::info!(
                    "Downloaded {} ({}) - expires {}",
                    document.filename,
                    format_size(document.size_bytes),
                    document.expires_at.format("%Y-%m-%d %H:%M")
                );
                summary.downloaded += 1;
                summary.bytes_downloaded += document.size_bytes;
                known_fingerprints.insert(fingerprint);
                state.tracked.insert(document.filename.clone(), document);
                completed.push(reference);
            }
            Err(error) => {
                log::error!("Failed to store {}: {error}", reference.filename);
                summary.failed += 1;
                failed.push(reference);
            }
        }
    }

    (completed, failed)
}

/// Write the payload to disk atomically, then record it in the store.
///
/// The fingerprint is persisted only after the rename commits, so a crash in
/// between leaves no record and the document is simply re-downloaded.
async fn store_document(
    ctx: &PassContext<'_>,
    download_dir: &Path,
    reference: &DocumentReference,
    bytes: &[u8],
    fingerprint: &str,
    state: &StoreState,
) -> Result<TrackedDocument> {
    let (filename, path) = destination(download_dir, &reference.filename, state).await;

    let tmp = path.with_extension("part");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, &path).await?;

    let downloaded_at = Utc::now();
    let document = TrackedDocument {
        filename,
        title: reference.title.clone(),
        source_url: reference.url.clone(),
        fingerprint: fingerprint.to_string(),
        downloaded_at,
        size_bytes: bytes.len() as u64,
        expires_at: downloaded_at + ctx.config.retention_window(),
        date_source: reference.date_source,
    };
    ctx.store.commit_document(&document).await?;
    Ok(document)
}

/// Pick a destination filename, decorating it when a different document
/// already owns the name.
async fn destination(
    download_dir: &Path,
    filename: &str,
    state: &StoreState,
) -> (String, PathBuf) {
    let filename = sanitize_filename(filename);
    let mut candidate = filename.clone();
    let mut n = 1;
    loop {
        let path = download_dir.join(&candidate);
        let taken = state.tracked.contains_key(&candidate)
            || tokio::fs::try_exists(&path).await.unwrap_or(false);
        if !taken {
            return (candidate, path);
        }
        candidate = decorate(&filename, n);
        n += 1;
    }
}

fn decorate(filename: &str, n: u32) -> String {
    match filename.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}_{n}.{ext}"),
        None => format!("{filename}_{n}"),
    }
}

/// Run the continuous monitor loop until interrupted.
pub async fn run_monitor(ctx: &PassContext<'_>, options: &PassOptions) -> Result<()> {
    let interval = std::time::Duration::from_secs(ctx.config.monitor.interval_minutes * 60);
    log::info!(
        "Monitoring {} every {} minutes (retention {}h)",
        ctx.config.monitor.base_url,
        ctx.config.monitor.interval_minutes,
        ctx.config.monitor.retention_hours
    );

    // The override only applies to the first pass; later passes resume from
    // the persisted cursor it replaced.
    let mut options = options.clone();
    loop {
        match run_pass(ctx, &options).await {
            Ok(_) => {}
            Err(error) => log::error!("Pass failed: {error}. Retrying next interval."),
        }
        options.override_cursor = None;

        log::info!(
            "Sleeping for {} minutes...",
            ctx.config.monitor.interval_minutes
        );
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => {
                log::info!("Monitoring stopped by user");
                return Ok(());
            }
        }
    }
}

/// Sweep expired files without fetching the listing (cleanup-only mode).
pub async fn run_cleanup(ctx: &PassContext<'_>) -> Result<usize> {
    let state = ctx.store.load().await?;
    let outcomes = sweep(Utc::now(), &state.tracked, &ctx.config.download_dir(), ctx.store).await;
    let deleted = outcomes.iter().filter(|o| o.deleted).count();
    let failures = outcomes.iter().filter(|o| o.error.is_some()).count();
    if failures > 0 {
        log::warn!("Cleanup finished with {failures} failures");
    }
    log::info!("Cleaned up {deleted} expired files");
    Ok(deleted)
}
