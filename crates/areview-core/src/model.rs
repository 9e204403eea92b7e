//! Domain records passed between pipeline stages.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, ReviewError};

/// A discovered source file with its content loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute path; identity of the file.
    pub path: PathBuf,

    /// Raw textual content, decoded lossily.
    pub content: String,

    /// Size on disk in bytes.
    pub size: u64,
}

impl SourceFile {
    /// Read a file from disk.
    ///
    /// Invalid UTF-8 is replaced rather than rejected, so only genuine I/O
    /// failures surface as [`ReviewError::FileRead`].
    pub async fn load(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ReviewError::FileRead {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            size: bytes.len() as u64,
            content: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }

    /// File name without directories, as shown in prompts and report headings.
    pub fn display_name(&self) -> String {
        display_name(&self.path)
    }

    /// Length of the content after trimming surrounding whitespace, in chars.
    pub fn trimmed_len(&self) -> usize {
        self.content.trim().chars().count()
    }
}

/// Base name of a path, falling back to the full path when it has none.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Outcome of analysing one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Succeeded,
    Skipped,
    Failed,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Succeeded => "succeeded",
            AnalysisStatus::Skipped => "skipped",
            AnalysisStatus::Failed => "failed",
        }
    }
}

/// Result of one analysis attempt. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// The analysed file.
    pub file: PathBuf,

    pub status: AnalysisStatus,

    /// Markdown findings on success, a diagnostic otherwise.
    pub body: String,
}

impl AnalysisResult {
    pub fn succeeded(file: &Path, body: String) -> Self {
        Self {
            file: file.to_path_buf(),
            status: AnalysisStatus::Succeeded,
            body,
        }
    }

    pub fn skipped(file: &Path, body: String) -> Self {
        Self {
            file: file.to_path_buf(),
            status: AnalysisStatus::Skipped,
            body,
        }
    }

    pub fn failed(file: &Path, body: String) -> Self {
        Self {
            file: file.to_path_buf(),
            status: AnalysisStatus::Failed,
            body,
        }
    }
}

/// Owner and repository name on the hosting provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryIdentity {
    pub owner: String,
    pub repo: String,
}

impl std::fmt::Display for RepositoryIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Payload of the pull-request creation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRequest {
    pub title: String,
    pub body: String,
    pub head: String,
    pub base: String,
}
