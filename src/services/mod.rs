// src/services/mod.rs

//! External-facing services: listing retrieval, link extraction, downloads.

mod download;
mod extract;
mod listing;

pub use download::Downloader;
pub use extract::extract_references;
pub use listing::ListingFetcher;
