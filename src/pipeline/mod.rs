// src/pipeline/mod.rs

//! Pass pipeline: change detection, deduplication, retention, and the
//! driver that ties them together.

pub mod classify;
pub mod dedup;
pub mod pass;
pub mod sweep;

pub use classify::{Classification, advance_cursor, classify};
pub use pass::{PassContext, PassOptions, PassSummary, run_cleanup, run_monitor, run_pass};
pub use sweep::{SweepOutcome, sweep};
