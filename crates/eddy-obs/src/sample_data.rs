//! Sample-data path resolution.
//!
//! Datasets are referred to by identifier (e.g. `Anticyclonic_seg.nc`) and
//! looked up in a short list of data directories.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ObsError, ObsResult};

/// Environment variable pointing at the sample data directory.
pub const DATA_DIR_ENV: &str = "EDDY_DATA_DIR";

/// Directories searched for datasets, in order:
/// 1. `$EDDY_DATA_DIR` (if set)
/// 2. `./data`
/// 3. `data/` at the workspace root
pub fn search_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        dirs.push(PathBuf::from(dir));
    }
    dirs.push(PathBuf::from("data"));
    let workspace_data = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(Path::parent)
        .map(|root| root.join("data"));
    if let Some(dir) = workspace_data {
        dirs.push(dir);
    }
    dirs
}

/// Resolve a dataset identifier or path to an existing file.
///
/// An identifier that is already a path to an existing file is returned as is.
pub fn resolve(name: &str) -> ObsResult<PathBuf> {
    let direct = PathBuf::from(name);
    if direct.is_file() {
        return Ok(direct);
    }
    resolve_in(name, &search_dirs())
}

/// Resolve a dataset identifier against explicit directories.
pub fn resolve_in(name: &str, dirs: &[PathBuf]) -> ObsResult<PathBuf> {
    for dir in dirs {
        let candidate = dir.join(name);
        debug!(candidate = %candidate.display(), "Looking for dataset");
        if candidate.is_file() {
            return Ok(candidate);
        }
    }
    Err(ObsError::NotFound(format!(
        "{} (searched {})",
        name,
        dirs.iter()
            .map(|d| d.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_in_finds_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Cyclonic.nc");
        std::fs::write(&path, b"").unwrap();
        let found = resolve_in("Cyclonic.nc", &[PathBuf::from("/nonexistent"), dir.path().to_path_buf()])
            .unwrap();
        assert_eq!(found, path);
    }

    #[test]
    fn test_resolve_in_reports_searched_dirs() {
        let err = resolve_in("missing.nc", &[PathBuf::from("/nowhere")]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("missing.nc"));
        assert!(msg.contains("/nowhere"));
    }

    #[test]
    fn test_resolve_existing_path() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let name = file.path().to_string_lossy().to_string();
        assert_eq!(resolve(&name).unwrap(), file.path());
    }
}
