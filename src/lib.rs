//! # tilefuse
//!
//! Batch consolidation of per-year PMTiles archives into fewer, larger
//! archives grouped by year range.
//!
//! The heavy geometry work happens in external tools (ogr2ogr,
//! tippecanoe, pmtiles); this crate plans the year groups, orchestrates
//! the tool invocations one at a time, verifies the artifacts they leave
//! behind, and cleans up every intermediate file whether a group succeeds
//! or fails.

pub mod config;
pub mod events;
pub mod pipeline;
pub mod plan;
pub mod summary;

// Re-exports
pub use config::{Config, Variant};
pub use events::{EventSink, MemorySink, PipelineEvent, TracingSink};
pub use pipeline::Pipeline;
pub use plan::{plan_groups, YearGroup};
pub use summary::{GroupOutcome, GroupReport, RunSummary};
