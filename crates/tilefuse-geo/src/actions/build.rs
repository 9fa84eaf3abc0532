//! Tile archive construction via tippecanoe, plus archive inspection.

use crate::artifact::expect_artifact;
use crate::invoker::{invoke_checked, CommandInvoker, CommandSpec};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Size-optimization tuning for one tippecanoe run.
///
/// All knobs are configuration, never hard-coded at call sites.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildTuning {
    /// Minimum zoom level (`-Z`).
    #[serde(default)]
    pub minzoom: u8,

    /// Maximum zoom level; `None` lets tippecanoe guess (`-zg`).
    #[serde(default)]
    pub maxzoom: Option<u8>,

    /// Simplification aggressiveness (`--simplification`).
    #[serde(default = "default_simplification")]
    pub simplification: u32,

    /// Eliminate redundant shared polygon borders.
    #[serde(default = "default_true")]
    pub detect_shared_borders: bool,

    /// Coalesce features in the densest tiles as needed.
    #[serde(default = "default_true")]
    pub coalesce_densest: bool,

    /// Extend zoom levels while features are still being dropped.
    #[serde(default = "default_true")]
    pub extend_zooms: bool,

    /// Zoom level up to which full detail is kept (`--full-detail`).
    #[serde(default = "default_full_detail")]
    pub full_detail: u32,

    /// Minimum detail at the most reduced zooms (`--min-detail`), if set.
    #[serde(default)]
    pub min_detail: Option<u32>,

    /// Tile buffer in screen pixels; 0 minimizes size at the cost of
    /// seam artifacts.
    #[serde(default)]
    pub buffer: u32,

    /// Reorder features along a Hilbert curve for compression locality.
    #[serde(default)]
    pub hilbert_reorder: bool,
}

fn default_simplification() -> u32 {
    15
}

fn default_full_detail() -> u32 {
    12
}

fn default_true() -> bool {
    true
}

impl Default for BuildTuning {
    fn default() -> Self {
        Self {
            minzoom: 0,
            maxzoom: None,
            simplification: default_simplification(),
            detect_shared_borders: true,
            coalesce_densest: true,
            extend_zooms: true,
            full_detail: default_full_detail(),
            min_detail: None,
            buffer: 0,
            hilbert_reorder: false,
        }
    }
}

fn base_command(output: &Path, tuning: &BuildTuning) -> CommandSpec {
    let mut spec = CommandSpec::new("tippecanoe")
        .arg("-o")
        .arg_path(output)
        .arg("-Z")
        .arg(tuning.minzoom.to_string());

    match tuning.maxzoom {
        Some(z) => spec = spec.arg("-z").arg(z.to_string()),
        None => spec = spec.arg("-zg"),
    }

    // Overwrite a pre-existing archive instead of erroring.
    spec = spec
        .arg("--force")
        .arg(format!("--simplification={}", tuning.simplification));

    if tuning.detect_shared_borders {
        spec = spec.arg("--detect-shared-borders");
    }
    if tuning.coalesce_densest {
        spec = spec.arg("--coalesce-densest-as-needed");
    }
    if tuning.extend_zooms {
        spec = spec.arg("--extend-zooms-if-still-dropping");
    }

    spec = spec.arg(format!("--full-detail={}", tuning.full_detail));
    if let Some(min_detail) = tuning.min_detail {
        spec = spec.arg(format!("--min-detail={}", min_detail));
    }

    spec = spec.arg(format!("--buffer={}", tuning.buffer));
    if tuning.hilbert_reorder {
        spec = spec.arg("--reorder").arg("--hilbert");
    }

    spec
}

/// Build the command line for a single-input, single-layer archive.
pub fn fused_command(input: &Path, output: &Path, tuning: &BuildTuning) -> CommandSpec {
    base_command(output, tuning).arg_path(input)
}

/// Build the command line for a multi-input archive with named layers.
pub fn layered_command(
    layers: &[(String, PathBuf)],
    output: &Path,
    tuning: &BuildTuning,
) -> CommandSpec {
    let mut spec = base_command(output, tuning);
    for (name, path) in layers {
        spec = spec.arg(format!("--named-layer={}:{}", name, path.display()));
    }
    spec
}

/// Compress one merged feature file into an archive with one fused layer.
///
/// # Errors
///
/// Returns an error on tool failure or when no usable archive exists at
/// `output` afterwards.
pub fn build_fused(
    invoker: &dyn CommandInvoker,
    input: &Path,
    output: &Path,
    tuning: &BuildTuning,
) -> Result<u64> {
    let spec = fused_command(input, output, tuning);
    tracing::info!("Building fused archive: {}", output.display());

    invoke_checked(invoker, "tippecanoe", &spec)?;
    expect_artifact(output)
}

/// Compress several feature files into one archive, one named layer each.
///
/// Layer order follows input order.
///
/// # Errors
///
/// Returns an error on tool failure or when no usable archive exists at
/// `output` afterwards.
pub fn build_layered(
    invoker: &dyn CommandInvoker,
    layers: &[(String, PathBuf)],
    output: &Path,
    tuning: &BuildTuning,
) -> Result<u64> {
    let spec = layered_command(layers, output, tuning);
    tracing::info!(
        "Building layered archive ({} layers): {}",
        layers.len(),
        output.display()
    );

    invoke_checked(invoker, "tippecanoe", &spec)?;
    expect_artifact(output)
}

/// Ask the pmtiles CLI for a human-readable description of an archive.
///
/// # Errors
///
/// Returns an error if the tool is unavailable or exits non-zero; callers
/// treat this as diagnostic only, never fatal.
pub fn inspect(invoker: &dyn CommandInvoker, archive: &Path) -> Result<String> {
    let spec = CommandSpec::new("pmtiles").arg("show").arg_path(archive);
    let run = invoke_checked(invoker, "pmtiles", &spec)?;
    Ok(run.stdout)
}
