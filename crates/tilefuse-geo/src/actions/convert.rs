//! PMTiles-to-GeoJSON conversion via ogr2ogr.

use crate::artifact::expect_artifact;
use crate::invoker::{invoke_checked, CommandInvoker, CommandSpec};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Latitude limit beyond which web-mercator reprojection degenerates.
pub const WEB_MERCATOR_MAX_LAT: f64 = 85.051_128_779_8;

/// Axis-aligned clip rectangle in target (lon/lat) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipBounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl ClipBounds {
    /// Full longitude range, latitude limited to the web-mercator-safe band.
    pub fn web_mercator_safe() -> Self {
        Self {
            min_lon: -180.0,
            min_lat: -WEB_MERCATOR_MAX_LAT,
            max_lon: 180.0,
            max_lat: WEB_MERCATOR_MAX_LAT,
        }
    }
}

/// Options for one archive-to-feature conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertOptions {
    /// Source coordinate reference system.
    #[serde(default = "default_source_srs")]
    pub source_srs: String,

    /// Target coordinate reference system.
    #[serde(default = "default_target_srs")]
    pub target_srs: String,

    /// Decimal digits retained per coordinate.
    #[serde(default = "default_precision")]
    pub coordinate_precision: u8,

    /// Pre-simplification tolerance passed to `-simplify`.
    #[serde(default = "default_simplify")]
    pub simplify_tolerance: f64,

    /// Optional clip rectangle applied during conversion.
    #[serde(default)]
    pub clip: Option<ClipBounds>,
}

fn default_source_srs() -> String {
    "EPSG:3857".to_string()
}

fn default_target_srs() -> String {
    "EPSG:4326".to_string()
}

fn default_precision() -> u8 {
    6
}

fn default_simplify() -> f64 {
    10.0
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            source_srs: default_source_srs(),
            target_srs: default_target_srs(),
            coordinate_precision: default_precision(),
            simplify_tolerance: default_simplify(),
            clip: None,
        }
    }
}

/// Build the ogr2ogr command line for one conversion.
pub fn convert_command(source: &Path, dest: &Path, options: &ConvertOptions) -> CommandSpec {
    let mut spec = CommandSpec::new("ogr2ogr")
        .args(["-f", "GeoJSON"])
        .arg("-s_srs")
        .arg(&options.source_srs)
        .arg("-t_srs")
        .arg(&options.target_srs)
        .arg("-lco")
        .arg(format!(
            "COORDINATE_PRECISION={}",
            options.coordinate_precision
        ))
        .arg("-simplify")
        .arg(options.simplify_tolerance.to_string());

    if let Some(clip) = &options.clip {
        spec = spec.arg("-clipsrc").args([
            clip.min_lon.to_string(),
            clip.min_lat.to_string(),
            clip.max_lon.to_string(),
            clip.max_lat.to_string(),
        ]);
    }

    spec.arg_path(dest).arg_path(source)
}

/// Convert one source tile archive into a GeoJSON feature file.
///
/// The caller is expected to have checked that `source` exists. Success
/// requires both a zero exit from ogr2ogr and a non-empty file at `dest`.
///
/// # Errors
///
/// Returns an error when the tool cannot be spawned, exits non-zero, or
/// leaves no usable output behind.
pub fn convert(
    invoker: &dyn CommandInvoker,
    source: &Path,
    dest: &Path,
    options: &ConvertOptions,
) -> Result<()> {
    let spec = convert_command(source, dest, options);
    tracing::info!("Converting {} -> {}", source.display(), dest.display());

    invoke_checked(invoker, "ogr2ogr", &spec)?;
    expect_artifact(dest)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_convert_command_without_clip() {
        let opts = ConvertOptions::default();
        let spec = convert_command(
            &PathBuf::from("lulc_nat_ant_1990_gpu.pmtiles"),
            &PathBuf::from("temp/year_1990.geojson"),
            &opts,
        );

        assert_eq!(spec.program(), "ogr2ogr");
        let args = spec.arg_list();
        assert!(args.windows(2).any(|w| w == ["-f", "GeoJSON"]));
        assert!(args.windows(2).any(|w| w == ["-s_srs", "EPSG:3857"]));
        assert!(args.windows(2).any(|w| w == ["-t_srs", "EPSG:4326"]));
        assert!(args
            .windows(2)
            .any(|w| w == ["-lco", "COORDINATE_PRECISION=6"]));
        assert!(args.windows(2).any(|w| w == ["-simplify", "10"]));
        assert!(!args.iter().any(|a| a == "-clipsrc"));
        // Destination precedes source.
        assert_eq!(
            &args[args.len() - 2..],
            ["temp/year_1990.geojson", "lulc_nat_ant_1990_gpu.pmtiles"]
        );
    }

    #[test]
    fn test_convert_command_with_clip() {
        let opts = ConvertOptions {
            coordinate_precision: 5,
            simplify_tolerance: 15.0,
            clip: Some(ClipBounds::web_mercator_safe()),
            ..ConvertOptions::default()
        };
        let spec = convert_command(
            &PathBuf::from("src.pmtiles"),
            &PathBuf::from("dst.geojson"),
            &opts,
        );

        let args = spec.arg_list();
        assert!(args
            .windows(2)
            .any(|w| w == ["-lco", "COORDINATE_PRECISION=5"]));
        assert!(args.windows(2).any(|w| w == ["-simplify", "15"]));
        let clip_pos = args.iter().position(|a| a == "-clipsrc").unwrap();
        assert_eq!(
            &args[clip_pos + 1..clip_pos + 5],
            ["-180", "-85.0511287798", "180", "85.0511287798"]
        );
    }
}
