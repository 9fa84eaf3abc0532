//! Concatenation of per-year GeoJSON files via ogr2ogr append mode.

use crate::artifact::expect_artifact;
use crate::invoker::{invoke_checked, CommandInvoker, CommandSpec};
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Build the ogr2ogr command line merging `inputs` into `output`.
///
/// The first input seeds the output file; every further input is appended
/// in the order given. Records are never deduplicated or reordered.
pub fn merge_command(inputs: &[PathBuf], output: &Path) -> CommandSpec {
    let mut spec = CommandSpec::new("ogr2ogr")
        .args(["-f", "GeoJSON"])
        .arg_path(output)
        .arg_path(&inputs[0]);

    for input in &inputs[1..] {
        spec = spec.args(["-update", "-append"]).arg_path(input);
    }

    spec
}

/// Merge one or more feature files into a single file at `output`.
///
/// With a single input this still produces a new file at `output` (copy
/// semantics). Year provenance is expected to already be embedded in each
/// input's feature properties.
///
/// # Errors
///
/// Returns an error with zero inputs, on tool failure, or when no usable
/// output file exists afterwards.
pub fn merge(invoker: &dyn CommandInvoker, inputs: &[PathBuf], output: &Path) -> Result<()> {
    if inputs.is_empty() {
        return Err(Error::invalid_input("merge requires at least one input"));
    }

    let spec = merge_command(inputs, output);
    tracing::info!("Merging {} feature files -> {}", inputs.len(), output.display());

    invoke_checked(invoker, "ogr2ogr", &spec)?;
    expect_artifact(output)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_command_single_input() {
        let inputs = vec![PathBuf::from("a.geojson")];
        let spec = merge_command(&inputs, &PathBuf::from("merged.geojson"));
        assert_eq!(
            spec.arg_list(),
            ["-f", "GeoJSON", "merged.geojson", "a.geojson"]
        );
    }

    #[test]
    fn test_merge_command_appends_in_order() {
        let inputs = vec![
            PathBuf::from("year_1985.geojson"),
            PathBuf::from("year_1986.geojson"),
            PathBuf::from("year_1987.geojson"),
        ];
        let spec = merge_command(&inputs, &PathBuf::from("merged.geojson"));
        assert_eq!(
            spec.arg_list(),
            [
                "-f",
                "GeoJSON",
                "merged.geojson",
                "year_1985.geojson",
                "-update",
                "-append",
                "year_1986.geojson",
                "-update",
                "-append",
                "year_1987.geojson",
            ]
        );
    }

    #[test]
    fn test_merge_rejects_empty_inputs() {
        struct NeverInvoker;
        impl CommandInvoker for NeverInvoker {
            fn invoke(&self, _spec: &CommandSpec) -> Result<crate::Invocation> {
                panic!("must not be invoked");
            }
        }

        let err = merge(&NeverInvoker, &[], &PathBuf::from("out.geojson")).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
