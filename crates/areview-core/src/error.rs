//! Error taxonomy for the review pipeline.
//!
//! Variants fall into two classes. Per-file and credential problems
//! (`ConfigurationMissing`, `FileRead`, `AnalysisService`, `UnsupportedRemote`,
//! `Hosting`) are absorbed by the pipeline and turned into skip or failure
//! outcomes. `VersionControl` errors raised during branch setup or push abort
//! the run.

use std::path::PathBuf;

/// Errors produced by the review pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("configuration missing: {0}")]
    ConfigurationMissing(&'static str),

    #[error("failed to read {path:?}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("analysis service error: {0}")]
    AnalysisService(String),

    #[error("version control error: {0}")]
    VersionControl(String),

    #[error("unsupported remote: {0}")]
    UnsupportedRemote(String),

    #[error("path not found: {0:?}")]
    NotFound(PathBuf),

    #[error("hosting API returned {status}: {body}")]
    Hosting { status: u16, body: String },

    #[error("http error: {0}")]
    Http(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for review pipeline operations.
pub type Result<T> = std::result::Result<T, ReviewError>;
