//! Output artifact verification.
//!
//! Exit codes alone are not trusted: after every external invocation the
//! destination file is checked for existence and non-zero size.

use crate::{Error, Result};
use std::path::Path;

/// Observed state of an expected output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactStatus {
    /// File exists with the given size in bytes.
    Present(u64),
    /// File exists but has zero length.
    Empty,
    /// File does not exist.
    Absent,
}

impl ArtifactStatus {
    /// Whether the artifact is present and non-empty.
    pub fn is_usable(&self) -> bool {
        matches!(self, ArtifactStatus::Present(_))
    }

    /// Size in bytes, if present.
    pub fn size(&self) -> Option<u64> {
        match self {
            ArtifactStatus::Present(bytes) => Some(*bytes),
            _ => None,
        }
    }
}

/// Inspect the file at `path`.
pub fn verify_artifact(path: &Path) -> ArtifactStatus {
    match std::fs::metadata(path) {
        Ok(meta) if meta.len() > 0 => ArtifactStatus::Present(meta.len()),
        Ok(_) => ArtifactStatus::Empty,
        Err(_) => ArtifactStatus::Absent,
    }
}

/// Require a usable artifact at `path`, returning its size.
///
/// # Errors
///
/// Returns [`Error::ArtifactMissing`] or [`Error::ArtifactEmpty`] when the
/// file is absent or zero-length.
pub fn expect_artifact(path: &Path) -> Result<u64> {
    match verify_artifact(path) {
        ArtifactStatus::Present(bytes) => Ok(bytes),
        ArtifactStatus::Empty => Err(Error::artifact_empty(path)),
        ArtifactStatus::Absent => Err(Error::artifact_missing(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.geojson");
        assert_eq!(verify_artifact(&path), ArtifactStatus::Absent);
        assert!(matches!(
            expect_artifact(&path),
            Err(Error::ArtifactMissing { .. })
        ));
    }

    #[test]
    fn test_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.geojson");
        std::fs::write(&path, b"").unwrap();
        assert_eq!(verify_artifact(&path), ArtifactStatus::Empty);
        assert!(matches!(
            expect_artifact(&path),
            Err(Error::ArtifactEmpty { .. })
        ));
    }

    #[test]
    fn test_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.geojson");
        std::fs::write(&path, b"{}").unwrap();
        assert_eq!(verify_artifact(&path), ArtifactStatus::Present(2));
        assert_eq!(expect_artifact(&path).unwrap(), 2);
        assert!(verify_artifact(&path).is_usable());
        assert_eq!(verify_artifact(&path).size(), Some(2));
    }
}
