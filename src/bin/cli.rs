//! ipu-watch CLI
//!
//! Monitors the GGSIPU exam results page and auto-downloads new result
//! PDFs. Downloaded files are deleted after the configured retention
//! window (24 hours by default).

use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};
use ipu_watch::{
    config::Config,
    error::Result,
    models::Cursor,
    pipeline::{PassContext, PassOptions, run_cleanup, run_monitor, run_pass},
    services::{Downloader, ListingFetcher},
    storage::{JsonStore, MetadataStore},
    utils::{format_size, http},
};

/// ipu-watch - University Results Monitor & Downloader
#[derive(Parser, Debug)]
#[command(name = "ipuwatch", version, about = "GGSIPU Results Monitor & Downloader")]
struct Cli {
    /// Path to the config file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Continuously monitor the results page for new PDFs
    Monitor {
        /// Minutes between checks (overrides config)
        interval_minutes: Option<u64>,

        /// Only download PDFs whose filename or title contains this text
        #[arg(long)]
        keyword: Option<String>,

        /// Listing position to resume from, replacing the saved cursor
        #[arg(long)]
        start_from: Option<usize>,
    },

    /// Perform a single check for new results
    CheckOnce {
        /// Only download PDFs whose filename or title contains this text
        #[arg(long)]
        keyword: Option<String>,
    },

    /// Download every listed PDF, ignoring the resume cursor
    DownloadAll {
        /// Only download PDFs whose filename or title contains this text
        #[arg(long)]
        keyword: Option<String>,
    },

    /// Show current state and statistics
    Status,

    /// Only clean up expired files
    CleanupOnly,

    /// Exercise the fetch, extraction, and storage plumbing
    Test,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    if let Command::Monitor {
        interval_minutes: Some(minutes),
        ..
    } = &cli.command
    {
        config.monitor.interval_minutes = *minutes;
    }
    config.validate()?;

    let client = http::create_client(&config.http)?;
    let fetcher = ListingFetcher::new(client.clone(), &config)?;
    let downloader = Downloader::new(client, &config);
    let store = JsonStore::new(config.metadata_dir());

    let ctx = PassContext {
        config: &config,
        fetcher: &fetcher,
        downloader: &downloader,
        store: &store,
    };

    match cli.command {
        Command::Monitor {
            keyword,
            start_from,
            ..
        } => {
            let options = PassOptions {
                keyword,
                override_cursor: start_from.map(|position| Cursor::override_at(position, "")),
                ignore_cursor: false,
            };
            run_monitor(&ctx, &options).await?;
        }

        Command::CheckOnce { keyword } => {
            run_pass(
                &ctx,
                &PassOptions {
                    keyword,
                    ..PassOptions::default()
                },
            )
            .await?;
        }

        Command::DownloadAll { keyword } => {
            log::info!("Downloading all listed PDFs...");
            run_pass(
                &ctx,
                &PassOptions {
                    keyword,
                    override_cursor: None,
                    ignore_cursor: true,
                },
            )
            .await?;
        }

        Command::Status => {
            show_status(&config, &store).await?;
        }

        Command::CleanupOnly => {
            run_cleanup(&ctx).await?;
        }

        Command::Test => {
            run_system_test(&ctx).await?;
        }
    }

    Ok(())
}

/// Read-only report of persisted state and statistics.
async fn show_status(config: &Config, store: &JsonStore) -> Result<()> {
    let state = store.load().await?;

    log::info!("Base URL: {}", config.monitor.base_url);
    log::info!("Download directory: {}", config.download_dir().display());
    log::info!("Check interval: {} minutes", config.monitor.interval_minutes);
    log::info!("Retention window: {} hours", config.monitor.retention_hours);

    match state.stats.last_check {
        Some(last) => {
            log::info!("Last check: {}", last.format("%Y-%m-%d %H:%M:%S"));
            log::info!("Total checks: {}", state.stats.total_checks);
            log::info!("New documents found: {}", state.stats.new_documents_found);
            log::info!("Total downloaded: {}", state.stats.total_downloaded);
            log::info!("Total skipped: {}", state.stats.total_skipped);
            log::info!("Known references: {}", state.monitor.processed_urls.len());
        }
        None => log::info!("No monitoring history found"),
    }

    match &state.cursor {
        Some(cursor) => {
            log::info!(
                "Cursor: {} (position {}, {})",
                cursor.filename,
                cursor.position,
                cursor.timestamp.format("%Y-%m-%d %H:%M:%S")
            );
        }
        None => log::info!("No cursor yet (next run is an initial download)"),
    }

    if state.tracked.is_empty() {
        log::info!("No active downloaded files");
    } else {
        let now = Utc::now();
        let total: u64 = state.tracked.values().map(|d| d.size_bytes).sum();
        log::info!(
            "Active files: {} ({})",
            state.tracked.len(),
            format_size(total)
        );
        for document in state.tracked.values() {
            let left = document.time_remaining(now);
            log::info!(
                "    {} expires in {}h {}m",
                document.filename,
                left.num_hours(),
                left.num_minutes() % 60
            );
        }
    }

    Ok(())
}

/// Live exercise of the main collaborators, in dependency order.
async fn run_system_test(ctx: &PassContext<'_>) -> Result<()> {
    let mut passed = 0;
    let total = 4;

    log::info!("Test 1/4: listing page access...");
    let html = ctx.fetcher.fetch_listing().await?;
    if html.len() > 1000 {
        log::info!("Listing access: PASSED ({} bytes)", html.len());
        passed += 1;
    } else {
        log::error!("Listing access: FAILED (suspiciously short body)");
    }

    log::info!("Test 2/4: PDF link extraction...");
    let references = ipu_watch::services::extract_references(&html, ctx.fetcher.base_url());
    if references.is_empty() {
        log::error!("PDF extraction: FAILED (no links found)");
    } else {
        log::info!("PDF extraction: PASSED ({} links)", references.len());
        passed += 1;
    }

    log::info!("Test 3/4: metadata store round-trip...");
    if tempdir_store().await? {
        log::info!("Metadata store: PASSED");
        passed += 1;
    } else {
        log::error!("Metadata store: FAILED");
    }

    log::info!("Test 4/4: fingerprint stability...");
    let fp1 = ipu_watch::pipeline::dedup::fingerprint(html.as_bytes());
    let fp2 = ipu_watch::pipeline::dedup::fingerprint(html.as_bytes());
    if fp1 == fp2 && fp1.len() == 64 {
        log::info!("Fingerprinting: PASSED ({}...)", &fp1[..8]);
        passed += 1;
    } else {
        log::error!("Fingerprinting: FAILED");
    }

    log::info!("System test complete: {passed}/{total} passed");
    if passed < total {
        return Err(ipu_watch::error::AppError::state("system test failed"));
    }
    Ok(())
}

/// Round-trip a record through a throwaway store.
async fn tempdir_store() -> Result<bool> {
    use ipu_watch::models::{DateSource, TrackedDocument};

    let tmp = std::env::temp_dir().join(format!("ipuwatch-selftest-{}", std::process::id()));
    let store = JsonStore::new(&tmp);
    let now = Utc::now();
    let probe = TrackedDocument {
        filename: "selftest.pdf".into(),
        title: "Self test".into(),
        source_url: "http://example.invalid/selftest.pdf".into(),
        fingerprint: "00".repeat(32),
        downloaded_at: now,
        size_bytes: 1,
        expires_at: now,
        date_source: DateSource::FallbackNow,
    };

    store.commit_document(&probe).await?;
    let loaded = store.load().await?;
    store.remove_document("selftest.pdf").await?;
    let _ = tokio::fs::remove_dir_all(&tmp).await;

    Ok(loaded.tracked.get("selftest.pdf") == Some(&probe))
}
