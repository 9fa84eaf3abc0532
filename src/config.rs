//! Configuration for the consolidation pipeline.
//!
//! Everything is overridable through a TOML file; defaults reproduce the
//! production land-cover dataset layout (years 1985-2023, five-year
//! groups).

use crate::plan::{plan_groups, YearGroup};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tilefuse_geo::actions::{BuildTuning, ClipBounds, ConvertOptions};

/// Which merge strategy a run uses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Per-year data is fused into one layer, distinguished by a `year`
    /// attribute.
    Merged,
    /// Each year becomes its own named `year_<Y>` layer.
    Layered,
}

impl Variant {
    /// Suffix used in output file names and temp directory names.
    pub fn label(&self) -> &'static str {
        match self {
            Variant::Merged => "merged",
            Variant::Layered => "layered",
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub dataset: DatasetConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    /// Settings for the merged (fused single-layer) variant.
    #[serde(default = "merged_defaults")]
    pub merged: VariantConfig,

    /// Settings for the layered (one named layer per year) variant.
    #[serde(default = "layered_defaults")]
    pub layered: VariantConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset: DatasetConfig::default(),
            paths: PathsConfig::default(),
            merged: merged_defaults(),
            layered: layered_defaults(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Prefix of source archive file names.
    #[serde(default = "default_source_prefix")]
    pub source_prefix: String,

    /// Suffix of source archive file names (before `.pmtiles`).
    #[serde(default = "default_source_suffix")]
    pub source_suffix: String,

    /// Prefix of consolidated output file names.
    #[serde(default = "default_output_prefix")]
    pub output_prefix: String,

    /// First calendar year of the dataset.
    #[serde(default = "default_first_year")]
    pub first_year: i32,

    /// Last calendar year of the dataset.
    #[serde(default = "default_last_year")]
    pub last_year: i32,

    /// Years per consolidated archive; the final group may be shorter.
    #[serde(default = "default_group_width")]
    pub group_width: usize,
}

fn default_source_prefix() -> String {
    "lulc_nat_ant".to_string()
}
fn default_source_suffix() -> String {
    "gpu".to_string()
}
fn default_output_prefix() -> String {
    "lulc".to_string()
}
fn default_first_year() -> i32 {
    1985
}
fn default_last_year() -> i32 {
    2023
}
fn default_group_width() -> usize {
    5
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            source_prefix: default_source_prefix(),
            source_suffix: default_source_suffix(),
            output_prefix: default_output_prefix(),
            first_year: default_first_year(),
            last_year: default_last_year(),
            group_width: default_group_width(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the per-year source archives.
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    /// Directory receiving consolidated archives and per-run temp files.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_source_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("consolidated")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            output_dir: default_output_dir(),
        }
    }
}

/// Conversion and build tuning for one pipeline variant.
///
/// A `[merged]` or `[layered]` section in the config file replaces that
/// variant's defaults as a whole; keys left unset inside it fall back to
/// the generic tool defaults, not the variant-specific ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariantConfig {
    #[serde(default)]
    pub convert: ConvertOptions,

    #[serde(default)]
    pub build: BuildTuning,
}

/// Merged variant: coarser precision and aggressive size tuning.
fn merged_defaults() -> VariantConfig {
    VariantConfig {
        convert: ConvertOptions {
            coordinate_precision: 5,
            simplify_tolerance: 15.0,
            clip: Some(ClipBounds::web_mercator_safe()),
            ..ConvertOptions::default()
        },
        build: BuildTuning {
            simplification: 20,
            full_detail: 10,
            min_detail: Some(15),
            hilbert_reorder: true,
            ..BuildTuning::default()
        },
    }
}

/// Layered variant: finer precision, moderate tuning.
fn layered_defaults() -> VariantConfig {
    VariantConfig {
        convert: ConvertOptions::default(),
        build: BuildTuning::default(),
    }
}

impl Config {
    /// Tuning for the given variant.
    pub fn variant(&self, variant: Variant) -> &VariantConfig {
        match variant {
            Variant::Merged => &self.merged,
            Variant::Layered => &self.layered,
        }
    }

    /// Deterministic source archive path for a year.
    pub fn source_path(&self, year: i32) -> PathBuf {
        self.paths.source_dir.join(format!(
            "{}_{}_{}.pmtiles",
            self.dataset.source_prefix, year, self.dataset.source_suffix
        ))
    }

    /// Deterministic consolidated output path for a group.
    pub fn output_path(&self, group: &YearGroup, variant: Variant) -> PathBuf {
        self.paths.output_dir.join(format!(
            "{}_{}_{}.pmtiles",
            self.dataset.output_prefix,
            group.name,
            variant.label()
        ))
    }

    /// Per-variant temporary directory for intermediate feature files.
    pub fn temp_dir(&self, variant: Variant) -> PathBuf {
        self.paths
            .output_dir
            .join(format!("temp_{}", variant.label()))
    }

    /// The configured year groups, in processing order.
    pub fn groups(&self) -> Vec<YearGroup> {
        plan_groups(
            self.dataset.first_year,
            self.dataset.last_year,
            self.dataset.group_width,
        )
    }
}

/// Load configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return the default config.
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = ["./tilefuse.toml", "~/.config/tilefuse/config.toml"];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration.
fn validate_config(config: &Config) -> Result<()> {
    if config.dataset.group_width == 0 {
        anyhow::bail!("dataset.group_width cannot be 0");
    }

    if config.dataset.first_year > config.dataset.last_year {
        anyhow::bail!(
            "dataset.first_year ({}) is after dataset.last_year ({})",
            config.dataset.first_year,
            config.dataset.last_year
        );
    }

    if !config.paths.source_dir.exists() {
        tracing::warn!(
            "Source directory does not exist: {:?}",
            config.paths.source_dir
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let config = Config::default();
        let groups = config.groups();

        assert_eq!(
            config.source_path(1994),
            PathBuf::from("./lulc_nat_ant_1994_gpu.pmtiles")
        );
        assert_eq!(
            config.output_path(&groups[0], Variant::Merged),
            PathBuf::from("consolidated/lulc_1985-1989_merged.pmtiles")
        );
        assert_eq!(
            config.output_path(&groups[7], Variant::Layered),
            PathBuf::from("consolidated/lulc_2020-2023_layered.pmtiles")
        );
        assert_eq!(
            config.temp_dir(Variant::Merged),
            PathBuf::from("consolidated/temp_merged")
        );
    }

    #[test]
    fn test_variant_defaults_differ() {
        let config = Config::default();

        let merged = config.variant(Variant::Merged);
        assert_eq!(merged.convert.coordinate_precision, 5);
        assert_eq!(merged.convert.simplify_tolerance, 15.0);
        assert!(merged.convert.clip.is_some());
        assert_eq!(merged.build.simplification, 20);
        assert_eq!(merged.build.min_detail, Some(15));
        assert!(merged.build.hilbert_reorder);

        let layered = config.variant(Variant::Layered);
        assert_eq!(layered.convert.coordinate_precision, 6);
        assert_eq!(layered.convert.simplify_tolerance, 10.0);
        assert!(layered.convert.clip.is_none());
        assert_eq!(layered.build.simplification, 15);
        assert_eq!(layered.build.min_detail, None);
        assert!(!layered.build.hilbert_reorder);
    }

    #[test]
    fn test_toml_overrides() {
        let config: Config = toml::from_str(
            r#"
[dataset]
first_year = 2000
last_year = 2009
group_width = 4
source_prefix = "cover"

[paths]
source_dir = "/data/tiles"

[merged.build]
simplification = 25
"#,
        )
        .unwrap();

        assert_eq!(config.dataset.first_year, 2000);
        assert_eq!(config.groups().len(), 3);
        assert_eq!(
            config.source_path(2004),
            PathBuf::from("/data/tiles/cover_2004_gpu.pmtiles")
        );
        assert_eq!(config.merged.build.simplification, 25);
        // Untouched sections keep their defaults.
        assert_eq!(config.layered.build.simplification, 15);
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let mut config = Config::default();
        config.dataset.first_year = 2024;
        config.dataset.last_year = 2023;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_width() {
        let mut config = Config::default();
        config.dataset.group_width = 0;
        assert!(validate_config(&config).is_err());
    }
}
