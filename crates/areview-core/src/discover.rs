//! Source file discovery.
//!
//! Searches the conventional source directory first and falls back to the
//! whole repository root when that directory is missing. Entries are visited
//! in file-name order at every level, so the result is stable across
//! platforms and filesystems.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::PipelineConfig;
use crate::error::{Result, ReviewError};

/// Locates candidate source files under a repository root.
#[derive(Debug, Clone)]
pub struct FileDiscoverer {
    root: PathBuf,
    source_subdir: PathBuf,
    extension: String,
}

impl FileDiscoverer {
    pub fn new(
        root: impl Into<PathBuf>,
        source_subdir: impl Into<PathBuf>,
        extension: &str,
    ) -> Self {
        Self {
            root: root.into(),
            source_subdir: source_subdir.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(&config.repo_root, &config.source_subdir, &config.extension)
    }

    /// Return matching files in depth-first, file-name order.
    ///
    /// Fails with [`ReviewError::NotFound`] only when the repository root
    /// itself does not exist.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(ReviewError::NotFound(self.root.clone()));
        }
        let root = self.root.canonicalize()?;

        let primary = root.join(&self.source_subdir);
        let search_root = if primary.is_dir() {
            primary
        } else {
            warn!(
                path = %primary.display(),
                "source directory not found, scanning the whole repository"
            );
            root
        };

        let files = walk(&search_root, &self.extension);
        info!(
            count = files.len(),
            root = %search_root.display(),
            extension = %self.extension,
            "discovered source files"
        );
        Ok(files)
    }
}

fn walk(search_root: &Path, extension: &str) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let walker = WalkDir::new(search_root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden_dir(e));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|e| e.to_str()) == Some(extension) {
            files.push(entry.into_path());
        }
    }
    files
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && entry.file_name().to_string_lossy().starts_with('.')
}
