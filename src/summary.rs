//! End-of-batch run summary.
//!
//! The summary re-reads filesystem state for every expected output path
//! instead of trusting in-memory success flags, so an archive deleted or
//! truncated between build and summary shows up as a failure.

use crate::plan::YearGroup;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;
use tilefuse_geo::verify_artifact;

/// Terminal state of one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupOutcome {
    /// Output archive was built and verified.
    Built,
    /// No year in the group had a usable source or conversion.
    NoUsableYears,
    /// The feature-file merge failed.
    MergeFailed,
    /// The archive build failed.
    BuildFailed,
    /// The build reported success but no usable archive was found.
    OutputMissing,
}

impl GroupOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, GroupOutcome::Built)
    }
}

impl std::fmt::Display for GroupOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GroupOutcome::Built => "built",
            GroupOutcome::NoUsableYears => "no usable years",
            GroupOutcome::MergeFailed => "merge failed",
            GroupOutcome::BuildFailed => "build failed",
            GroupOutcome::OutputMissing => "output missing",
        };
        f.write_str(name)
    }
}

/// What happened to one group during the run.
#[derive(Debug, Clone)]
pub struct GroupReport {
    pub group: YearGroup,
    /// Years whose source archive was absent.
    pub years_missing: Vec<i32>,
    /// Years whose conversion or tagging failed.
    pub years_failed: Vec<i32>,
    /// Years successfully converted into the group's output.
    pub years_converted: Vec<i32>,
    pub outcome: GroupOutcome,
    /// Failure reason, when the outcome is not `Built`.
    pub failure: Option<String>,
    /// Expected output archive path.
    pub output: PathBuf,
}

/// Per-group line of the final summary.
#[derive(Debug, Clone, Serialize)]
pub struct GroupSummary {
    pub group: String,
    pub years_total: usize,
    pub years_covered: usize,
    pub succeeded: bool,
    pub output: PathBuf,
    /// Archive size as re-read from disk, if present and non-empty.
    pub size_bytes: Option<u64>,
    pub failure: Option<String>,
}

/// Aggregate result of one batch run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub variant: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub groups: Vec<GroupSummary>,
    pub groups_attempted: usize,
    pub groups_succeeded: usize,
    pub groups_failed: usize,
    /// Years that made it into an output archive.
    pub years_processed: usize,
    /// Years whose source archive existed.
    pub source_files_seen: usize,
}

impl RunSummary {
    /// Build the summary from per-group reports, re-reading output state
    /// from disk.
    pub fn collect(variant: &str, started_at: DateTime<Utc>, reports: &[GroupReport]) -> Self {
        let mut groups = Vec::with_capacity(reports.len());
        let mut source_files_seen = 0;
        let mut years_processed = 0;

        for report in reports {
            let status = verify_artifact(&report.output);
            let succeeded = report.outcome.succeeded() && status.is_usable();

            source_files_seen += report.years_converted.len() + report.years_failed.len();
            if succeeded {
                years_processed += report.years_converted.len();
            }

            let failure = if succeeded {
                None
            } else if report.failure.is_some() {
                report.failure.clone()
            } else {
                Some(format!("output not usable ({})", report.outcome))
            };

            groups.push(GroupSummary {
                group: report.group.name.clone(),
                years_total: report.group.years.len(),
                years_covered: report.years_converted.len(),
                succeeded,
                output: report.output.clone(),
                size_bytes: status.size(),
                failure,
            });
        }

        let groups_succeeded = groups.iter().filter(|g| g.succeeded).count();
        let groups_attempted = groups.len();

        Self {
            variant: variant.to_string(),
            started_at,
            finished_at: Utc::now(),
            groups,
            groups_attempted,
            groups_succeeded,
            groups_failed: groups_attempted - groups_succeeded,
            years_processed,
            source_files_seen,
        }
    }

    /// Whether any group failed.
    pub fn any_failed(&self) -> bool {
        self.groups_failed > 0
    }

    /// Human-readable summary block for stdout.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "\nCONSOLIDATION SUMMARY ({})", self.variant);
        let _ = writeln!(out, "================================");

        for group in &self.groups {
            if group.succeeded {
                let kb = group.size_bytes.unwrap_or(0) / 1024;
                let _ = writeln!(
                    out,
                    "ok   {}: {} KB ({}/{} years)",
                    group.group, kb, group.years_covered, group.years_total
                );
            } else {
                let reason = group.failure.as_deref().unwrap_or("failed");
                let _ = writeln!(out, "FAIL {}: {}", group.group, reason);
            }
        }

        let _ = writeln!(out, "--------------------------------");
        let _ = writeln!(
            out,
            "Groups: {}/{} succeeded",
            self.groups_succeeded, self.groups_attempted
        );
        let _ = writeln!(
            out,
            "Years:  {} consolidated from {} source archives",
            self.years_processed, self.source_files_seen
        );
        if self.source_files_seen > 0 && self.groups_succeeded > 0 {
            let reduction =
                100.0 * (1.0 - self.groups_succeeded as f64 / self.source_files_seen as f64);
            let _ = writeln!(
                out,
                "Files:  {} -> {} ({:.0}% reduction)",
                self.source_files_seen,
                self.groups_succeeded,
                reduction.max(0.0)
            );
        }

        out
    }
}
