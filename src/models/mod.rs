// src/models/mod.rs

//! Domain models for the results monitor.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod cursor;
mod reference;
mod stats;
mod tracked;

// Re-export all public types
pub use cursor::Cursor;
pub use reference::{DateSource, DocumentReference};
pub use stats::{MonitorState, MonitorStats};
pub use tracked::TrackedDocument;
