//! Pipeline progress events.
//!
//! The orchestrator reports progress through an injectable [`EventSink`]
//! instead of logging directly, so tests assert on emitted events rather
//! than parsing log text. [`TracingSink`] is the production sink.

use crate::summary::GroupOutcome;
use std::path::PathBuf;

/// Stage a group is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Pending,
    Converting,
    Tagging,
    Merging,
    Building,
    Verifying,
    CleaningUp,
    Done,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Pending => "pending",
            Stage::Converting => "converting",
            Stage::Tagging => "tagging",
            Stage::Merging => "merging",
            Stage::Building => "building",
            Stage::Verifying => "verifying",
            Stage::CleaningUp => "cleaning up",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Everything the pipeline reports while running.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    BatchStarted {
        variant: String,
        groups: usize,
    },
    GroupStarted {
        group: String,
        years: usize,
    },
    StageEntered {
        group: String,
        stage: Stage,
    },
    SourceMissing {
        group: String,
        year: i32,
        path: PathBuf,
    },
    YearConverted {
        group: String,
        year: i32,
    },
    YearFailed {
        group: String,
        year: i32,
        error: String,
    },
    YearTagged {
        group: String,
        year: i32,
        features: usize,
    },
    MergeFailed {
        group: String,
        error: String,
    },
    BuildFailed {
        group: String,
        error: String,
    },
    ArchiveReady {
        group: String,
        path: PathBuf,
        bytes: u64,
    },
    CleanupWarning {
        path: PathBuf,
        error: String,
    },
    GroupFinished {
        group: String,
        outcome: GroupOutcome,
    },
    BatchFinished {
        succeeded: usize,
        failed: usize,
    },
}

/// Receiver for pipeline progress.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &PipelineEvent);
}

/// Sink that forwards events to the `tracing` log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::BatchStarted { variant, groups } => {
                tracing::info!("Starting {} consolidation, {} groups", variant, groups);
            }
            PipelineEvent::GroupStarted { group, years } => {
                tracing::info!("=== Group {} ({} years) ===", group, years);
            }
            PipelineEvent::StageEntered { group, stage } => {
                tracing::debug!("[{}] {}", group, stage);
            }
            PipelineEvent::SourceMissing { year, path, .. } => {
                tracing::warn!("Source archive not found for {}: {}", year, path.display());
            }
            PipelineEvent::YearConverted { group, year } => {
                tracing::info!("[{}] converted year {}", group, year);
            }
            PipelineEvent::YearFailed { group, year, error } => {
                tracing::warn!("[{}] year {} failed: {}", group, year, error);
            }
            PipelineEvent::YearTagged {
                group,
                year,
                features,
            } => {
                tracing::debug!("[{}] tagged {} features with year {}", group, features, year);
            }
            PipelineEvent::MergeFailed { group, error } => {
                tracing::error!("[{}] merge failed: {}", group, error);
            }
            PipelineEvent::BuildFailed { group, error } => {
                tracing::error!("[{}] build failed: {}", group, error);
            }
            PipelineEvent::ArchiveReady { group, path, bytes } => {
                tracing::info!(
                    "[{}] archive ready: {} ({} KB)",
                    group,
                    path.display(),
                    bytes / 1024
                );
            }
            PipelineEvent::CleanupWarning { path, error } => {
                tracing::warn!("Could not clean up {}: {}", path.display(), error);
            }
            PipelineEvent::GroupFinished { group, outcome } => {
                tracing::info!("[{}] finished: {}", group, outcome);
            }
            PipelineEvent::BatchFinished { succeeded, failed } => {
                tracing::info!("Batch finished: {} succeeded, {} failed", succeeded, failed);
            }
        }
    }
}

/// Sink that records events in memory, for tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: parking_lot::Mutex<Vec<PipelineEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn recorded(&self) -> Vec<PipelineEvent> {
        self.events.lock().clone()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &PipelineEvent) {
        self.events.lock().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_records_in_order() {
        let sink = MemorySink::new();
        sink.emit(&PipelineEvent::BatchStarted {
            variant: "merged".to_string(),
            groups: 8,
        });
        sink.emit(&PipelineEvent::BatchFinished {
            succeeded: 7,
            failed: 1,
        });

        let events = sink.recorded();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], PipelineEvent::BatchStarted { .. }));
        assert!(matches!(
            events[1],
            PipelineEvent::BatchFinished {
                succeeded: 7,
                failed: 1
            }
        ));
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::CleaningUp.to_string(), "cleaning up");
        assert_eq!(Stage::Converting.to_string(), "converting");
    }
}
