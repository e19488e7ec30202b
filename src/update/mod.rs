// src/update/mod.rs

//! Package update workflow built on the task and process layers.
//!
//! - [`exclusion`]: the per-run `ExclusionSet` snapshot.
//! - [`manager`]: the `PackageManager` seam and its WinGet implementation.
//! - [`sequencer`]: the DISCOVER → FILTER → UPDATE_EACH → REPORT pipeline.

pub mod exclusion;
pub mod manager;
pub mod sequencer;

pub use exclusion::{ExclusionSet, Partition};
pub use manager::{BoxFuture, PackageManager, WinGetManager};
pub use sequencer::{
    PackageOutcome, RunSummary, UpdateLedger, UpdateOptions, UpdatePreview, UpdateReport,
    UpdateSequencer,
};
