// src/lib.rs

//! ipu-watch Library
//!
//! Monitors a university exam-results listing page, downloads newly
//! published PDFs, deduplicates by content hash, and deletes downloads
//! after a fixed retention window.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
