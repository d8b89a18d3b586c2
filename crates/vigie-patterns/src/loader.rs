//! Pattern library overrides loaded from TOML files.
//!
//! Any `*.toml` file under the configured directory (searched recursively)
//! that names an existing library replaces the category sets it defines.

use crate::catalog::PatternLibrary;
use crate::error::{PatternError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Loader for pattern library overrides.
pub struct CatalogLoader {
    /// Directory containing override files
    dir: PathBuf,
}

impl CatalogLoader {
    /// Create a loader for `dir`.
    ///
    /// # Errors
    /// Returns error if the directory doesn't exist.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();

        if !dir.is_dir() {
            return Err(PatternError::DirectoryNotFound {
                path: dir.display().to_string(),
            });
        }

        Ok(Self { dir })
    }

    /// Load every library file in the directory.
    ///
    /// Invalid files are logged as warnings and skipped. Files are visited in
    /// path order so that later files win on conflicts.
    ///
    /// # Errors
    /// Returns error if the directory can't be read.
    pub fn load_all(&self) -> Result<Vec<PatternLibrary>> {
        let mut paths = Vec::new();
        Self::collect_paths(&self.dir, &mut paths)?;
        paths.sort();

        let mut libraries = Vec::new();
        for path in paths {
            match Self::load_from_path(&path) {
                Ok(library) => {
                    debug!(
                        path = %path.display(),
                        library = %library.name(),
                        "loaded pattern library"
                    );
                    libraries.push(library);
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "skipping invalid pattern library"
                    );
                }
            }
        }

        info!(
            count = libraries.len(),
            dir = %self.dir.display(),
            "loaded pattern library overrides"
        );

        Ok(libraries)
    }

    fn collect_paths(dir: &Path, paths: &mut Vec<PathBuf>) -> Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                Self::collect_paths(&path, paths)?;
            } else if path.extension().and_then(|s| s.to_str()) == Some("toml") {
                paths.push(path);
            }
        }
        Ok(())
    }

    fn load_from_path(path: &Path) -> Result<PatternLibrary> {
        let contents = std::fs::read_to_string(path)?;
        PatternLibrary::from_toml_str(&contents, &path.display().to_string())
    }
}
