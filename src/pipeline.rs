//! Batch orchestrator.
//!
//! Drives convert -> (tag -> merge) -> build -> verify -> cleanup for each
//! year group in order. Every failure is absorbed at the narrowest scope
//! that can continue: a bad year shrinks its group, a bad group never
//! stops the batch, and cleanup always runs.

use crate::config::{Config, Variant};
use crate::events::{EventSink, PipelineEvent, Stage};
use crate::plan::YearGroup;
use crate::summary::{GroupOutcome, GroupReport, RunSummary};
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tilefuse_geo::actions::{build, convert, merge, tag};
use tilefuse_geo::{verify_artifact, ArtifactStatus, CommandInvoker};

/// One configured batch run over all year groups.
pub struct Pipeline<'a> {
    config: &'a Config,
    variant: Variant,
    invoker: &'a dyn CommandInvoker,
    sink: &'a dyn EventSink,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a Config,
        variant: Variant,
        invoker: &'a dyn CommandInvoker,
        sink: &'a dyn EventSink,
    ) -> Self {
        Self {
            config,
            variant,
            invoker,
            sink,
        }
    }

    fn emit(&self, event: PipelineEvent) {
        self.sink.emit(&event);
    }

    fn stage(&self, group: &YearGroup, stage: Stage) {
        self.emit(PipelineEvent::StageEntered {
            group: group.name.clone(),
            stage,
        });
    }

    /// Run the whole batch, strictly sequentially, and return the summary.
    ///
    /// Individual group failures are reported through the summary and the
    /// event sink; only a completely unusable output directory is an `Err`.
    pub fn run(&self) -> Result<RunSummary> {
        let started_at = Utc::now();
        let groups = self.config.groups();

        self.emit(PipelineEvent::BatchStarted {
            variant: self.variant.label().to_string(),
            groups: groups.len(),
        });

        std::fs::create_dir_all(&self.config.paths.output_dir).with_context(|| {
            format!(
                "Failed to create output directory: {:?}",
                self.config.paths.output_dir
            )
        })?;

        let mut reports = Vec::with_capacity(groups.len());
        for group in &groups {
            let report = self.run_group(group);
            self.emit(PipelineEvent::GroupFinished {
                group: group.name.clone(),
                outcome: report.outcome,
            });
            reports.push(report);
        }

        let summary = RunSummary::collect(self.variant.label(), started_at, &reports);
        self.emit(PipelineEvent::BatchFinished {
            succeeded: summary.groups_succeeded,
            failed: summary.groups_failed,
        });

        Ok(summary)
    }

    /// Render the command lines a run would execute, without touching
    /// anything. Missing sources are annotated as comments.
    pub fn describe(&self) -> Vec<String> {
        let settings = self.config.variant(self.variant);
        let temp_dir = self.config.temp_dir(self.variant);
        let mut lines = Vec::new();

        for group in self.config.groups() {
            lines.push(format!("# group {}", group.name));

            let mut converted: Vec<(i32, PathBuf)> = Vec::new();
            for &year in &group.years {
                let source = self.config.source_path(year);
                if !source.exists() {
                    lines.push(format!(
                        "# year {}: source missing ({})",
                        year,
                        source.display()
                    ));
                    continue;
                }
                let dest = temp_dir.join(format!("year_{}.geojson", year));
                lines.push(convert::convert_command(&source, &dest, &settings.convert).to_string());
                if self.variant == Variant::Merged {
                    lines.push(format!("# tag {} with year={}", dest.display(), year));
                }
                converted.push((year, dest));
            }

            if converted.is_empty() {
                lines.push("# skipped: no usable source years".to_string());
                continue;
            }

            let output = self.config.output_path(&group, self.variant);
            match self.variant {
                Variant::Merged => {
                    let merged_path = temp_dir.join(format!("merged_{}.geojson", group.name));
                    let inputs: Vec<PathBuf> =
                        converted.iter().map(|(_, p)| p.clone()).collect();
                    lines.push(merge::merge_command(&inputs, &merged_path).to_string());
                    lines.push(
                        build::fused_command(&merged_path, &output, &settings.build).to_string(),
                    );
                }
                Variant::Layered => {
                    let layers = named_layers(&converted);
                    lines.push(
                        build::layered_command(&layers, &output, &settings.build).to_string(),
                    );
                }
            }
        }

        lines
    }

    fn run_group(&self, group: &YearGroup) -> GroupReport {
        self.emit(PipelineEvent::GroupStarted {
            group: group.name.clone(),
            years: group.years.len(),
        });

        let temp_dir = self.config.temp_dir(self.variant);
        let mut report = GroupReport {
            group: group.clone(),
            years_missing: Vec::new(),
            years_failed: Vec::new(),
            years_converted: Vec::new(),
            outcome: GroupOutcome::NoUsableYears,
            failure: None,
            output: self.config.output_path(group, self.variant),
        };
        let mut intermediates: Vec<PathBuf> = Vec::new();

        self.execute_group(group, &temp_dir, &mut report, &mut intermediates);

        // Cleanup runs on every path out of the stages above.
        self.stage(group, Stage::CleaningUp);
        self.cleanup(&temp_dir, &intermediates);
        self.stage(group, Stage::Done);

        report
    }

    fn execute_group(
        &self,
        group: &YearGroup,
        temp_dir: &Path,
        report: &mut GroupReport,
        intermediates: &mut Vec<PathBuf>,
    ) {
        let settings = self.config.variant(self.variant);

        if let Err(e) = std::fs::create_dir_all(temp_dir) {
            report.failure = Some(format!("could not create temp dir: {}", e));
            return;
        }

        self.stage(group, Stage::Converting);
        let mut converted: Vec<(i32, PathBuf)> = Vec::new();
        for &year in &group.years {
            let source = self.config.source_path(year);
            if !source.exists() {
                report.years_missing.push(year);
                self.emit(PipelineEvent::SourceMissing {
                    group: group.name.clone(),
                    year,
                    path: source,
                });
                continue;
            }

            let dest = temp_dir.join(format!("year_{}.geojson", year));
            intermediates.push(dest.clone());
            match convert::convert(self.invoker, &source, &dest, &settings.convert) {
                Ok(()) => {
                    self.emit(PipelineEvent::YearConverted {
                        group: group.name.clone(),
                        year,
                    });
                    converted.push((year, dest));
                }
                Err(e) => {
                    report.years_failed.push(year);
                    self.emit(PipelineEvent::YearFailed {
                        group: group.name.clone(),
                        year,
                        error: e.to_string(),
                    });
                }
            }
        }

        // Explicit year tagging: the merged build loses layer identity, so
        // every feature must carry its origin year before the merge.
        if self.variant == Variant::Merged && !converted.is_empty() {
            self.stage(group, Stage::Tagging);
            converted = self.tag_converted(group, report, converted);
        }

        if converted.is_empty() {
            report.outcome = GroupOutcome::NoUsableYears;
            report.failure = Some("no usable source years".to_string());
            return;
        }
        report.years_converted = converted.iter().map(|(year, _)| *year).collect();

        let build_result = match self.variant {
            Variant::Merged => {
                self.stage(group, Stage::Merging);
                let merged_path = temp_dir.join(format!("merged_{}.geojson", group.name));
                intermediates.push(merged_path.clone());
                let inputs: Vec<PathBuf> = converted.iter().map(|(_, p)| p.clone()).collect();

                if let Err(e) = merge::merge(self.invoker, &inputs, &merged_path) {
                    report.outcome = GroupOutcome::MergeFailed;
                    report.failure = Some(e.to_string());
                    self.emit(PipelineEvent::MergeFailed {
                        group: group.name.clone(),
                        error: e.to_string(),
                    });
                    return;
                }

                self.stage(group, Stage::Building);
                build::build_fused(self.invoker, &merged_path, &report.output, &settings.build)
            }
            Variant::Layered => {
                self.stage(group, Stage::Building);
                let layers = named_layers(&converted);
                build::build_layered(self.invoker, &layers, &report.output, &settings.build)
            }
        };

        if let Err(e) = build_result {
            report.outcome = GroupOutcome::BuildFailed;
            report.failure = Some(e.to_string());
            self.emit(PipelineEvent::BuildFailed {
                group: group.name.clone(),
                error: e.to_string(),
            });
            if let Err(marker_err) = write_error_marker(&report.output, group, &e.to_string()) {
                tracing::warn!("Could not write error marker: {}", marker_err);
            }
            return;
        }

        self.stage(group, Stage::Verifying);
        match verify_artifact(&report.output) {
            ArtifactStatus::Present(bytes) => {
                report.outcome = GroupOutcome::Built;
                self.emit(PipelineEvent::ArchiveReady {
                    group: group.name.clone(),
                    path: report.output.clone(),
                    bytes,
                });
                // Stale marker from an earlier failed run.
                let _ = std::fs::remove_file(error_marker_path(&report.output));

                match build::inspect(self.invoker, &report.output) {
                    Ok(info) => tracing::debug!("Archive metadata:\n{}", info.trim_end()),
                    Err(e) => tracing::warn!("Could not read archive info: {}", e),
                }
            }
            status => {
                report.outcome = GroupOutcome::OutputMissing;
                report.failure = Some(format!("archive not usable after build: {:?}", status));
            }
        }
    }

    /// Tag each converted file with its year and verify the tag stuck.
    /// Years whose tagging fails are dropped from the group.
    fn tag_converted(
        &self,
        group: &YearGroup,
        report: &mut GroupReport,
        converted: Vec<(i32, PathBuf)>,
    ) -> Vec<(i32, PathBuf)> {
        let mut kept = Vec::with_capacity(converted.len());
        for (year, path) in converted {
            match tag_and_verify(&path, year) {
                Ok(features) => {
                    self.emit(PipelineEvent::YearTagged {
                        group: group.name.clone(),
                        year,
                        features,
                    });
                    kept.push((year, path));
                }
                Err(error) => {
                    report.years_failed.push(year);
                    self.emit(PipelineEvent::YearFailed {
                        group: group.name.clone(),
                        year,
                        error,
                    });
                }
            }
        }
        kept
    }

    /// Delete every intermediate file, then the temp directory if and only
    /// if it is empty. Failures are reported but never escalated.
    fn cleanup(&self, temp_dir: &Path, intermediates: &[PathBuf]) {
        for path in intermediates {
            if !path.exists() {
                continue;
            }
            match std::fs::remove_file(path) {
                Ok(()) => tracing::debug!("Cleaned up {}", path.display()),
                Err(e) => self.emit(PipelineEvent::CleanupWarning {
                    path: path.clone(),
                    error: e.to_string(),
                }),
            }
        }

        if let Ok(mut entries) = std::fs::read_dir(temp_dir) {
            if entries.next().is_none() {
                let _ = std::fs::remove_dir(temp_dir);
            }
        }
    }
}

fn named_layers(converted: &[(i32, PathBuf)]) -> Vec<(String, PathBuf)> {
    converted
        .iter()
        .map(|(year, path)| (format!("year_{}", year), path.clone()))
        .collect()
}

fn tag_and_verify(path: &Path, year: i32) -> std::result::Result<usize, String> {
    let features = tag::tag_year(path, year).map_err(|e| e.to_string())?;
    match tag::verify_year_attribute(path, year) {
        Ok(true) => Ok(features),
        Ok(false) => Err(format!("year attribute missing after tagging: {}", year)),
        Err(e) => Err(e.to_string()),
    }
}

/// Sibling path of the diagnostic marker written on build failure.
pub fn error_marker_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_os_string();
    name.push(".error");
    PathBuf::from(name)
}

fn write_error_marker(output: &Path, group: &YearGroup, reason: &str) -> std::io::Result<()> {
    let body = format!(
        "Error creating consolidated archive\nGroup: {}\nYears: {}\nError: {}\n",
        group.name,
        group.years_label(),
        reason
    );
    std::fs::write(error_marker_path(output), body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::plan_groups;

    #[test]
    fn test_error_marker_path_keeps_full_name() {
        let marker = error_marker_path(Path::new("consolidated/lulc_2020-2023_merged.pmtiles"));
        assert_eq!(
            marker,
            PathBuf::from("consolidated/lulc_2020-2023_merged.pmtiles.error")
        );
    }

    #[test]
    fn test_error_marker_contents() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("lulc_2020-2023_merged.pmtiles");
        let group = plan_groups(2020, 2023, 5).remove(0);

        write_error_marker(&output, &group, "tippecanoe exited with code 1").unwrap();

        let body = std::fs::read_to_string(error_marker_path(&output)).unwrap();
        assert!(body.contains("Group: 2020-2023"));
        assert!(body.contains("Years: 2020, 2021, 2022, 2023"));
        assert!(body.contains("tippecanoe exited with code 1"));
    }
}
