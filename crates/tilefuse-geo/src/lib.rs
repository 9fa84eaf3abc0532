//! # tilefuse-geo
//!
//! External-tool layer for the tilefuse consolidation pipeline.
//!
//! This crate provides:
//! - Probing for the required tools (ogr2ogr, tippecanoe, pmtiles)
//! - A process-execution abstraction ([`CommandInvoker`]) so the
//!   orchestrator can be tested without spawning anything
//! - The pipeline actions: archive-to-GeoJSON conversion, explicit year
//!   tagging, feature-file merging, and tile archive building
//! - Output artifact verification shared by every action
//!
//! The geometry work itself lives in the external tools; this crate only
//! assembles their command lines and validates what they leave behind.

pub mod actions;
pub mod artifact;
mod error;
pub mod invoker;
pub mod tools;

// Re-exports
pub use artifact::{expect_artifact, verify_artifact, ArtifactStatus};
pub use error::{Error, Result};
pub use invoker::{CommandInvoker, CommandSpec, Invocation, SystemInvoker};
pub use tools::{check_tool, check_tools, require_tool, ToolInfo};
