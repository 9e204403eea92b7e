//! Pipeline configuration.
//!
//! A [`PipelineConfig`] is built once (usually by the CLI from arguments and
//! environment variables) and passed by reference to every stage.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, ReviewError};

pub const DEFAULT_SOURCE_SUBDIR: &str = "app/src/main/java";
pub const DEFAULT_EXTENSION: &str = "java";
pub const DEFAULT_REPORT_PATH: &str = "docs/Task-3C/smells_and_refactored.md";
pub const DEFAULT_BRANCH: &str = "Agentic_Pipeline";
pub const DEFAULT_BASE_BRANCH: &str = "main";
pub const DEFAULT_REMOTE: &str = "origin";
pub const DEFAULT_MIN_CONTENT_LEN: usize = 100;
pub const DEFAULT_PACING: Duration = Duration::from_secs(2);
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_COMMIT_MESSAGE: &str = "chore: Generate refactoring suggestions report";
pub const DEFAULT_PR_TITLE: &str = "[Agentic] Refactoring Suggestions";
pub const DEFAULT_PR_BODY: &str = "This PR contains a report of identified design smells and \
suggested refactorings generated by the Agentic Pipeline.";

/// Environment variable holding the analysis service credential.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
/// Environment variable holding the hosting credential.
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Complete configuration for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Repository working tree root.
    pub repo_root: PathBuf,

    /// Conventional source directory, relative to `repo_root`.
    pub source_subdir: PathBuf,

    /// Extension (without dot) of files to review.
    pub extension: String,

    /// Report location; relative paths resolve against `repo_root`.
    pub report_path: PathBuf,

    /// Dedicated branch the report is published to.
    pub branch: String,

    /// Branch synced before analysis and targeted by the pull request.
    pub base_branch: String,

    /// Git remote to pull from and push to.
    pub remote: String,

    /// Files whose trimmed content is shorter than this are not analysed.
    pub min_content_len: usize,

    /// Pause after each analysis call.
    #[serde(with = "duration_millis")]
    pub pacing: Duration,

    /// Process at most this many discovered files.
    pub max_files: Option<usize>,

    /// Stop after writing the report (no commit, push or pull request).
    pub publish: bool,

    pub commit_message: String,
    pub pr_title: String,
    pub pr_body: String,

    /// Gemini model name.
    pub model: String,
    pub gemini_base_url: String,
    pub github_api_url: String,

    #[serde(skip_serializing)]
    pub gemini_api_key: Option<String>,

    #[serde(skip_serializing)]
    pub github_token: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            repo_root: PathBuf::from("."),
            source_subdir: PathBuf::from(DEFAULT_SOURCE_SUBDIR),
            extension: DEFAULT_EXTENSION.to_string(),
            report_path: PathBuf::from(DEFAULT_REPORT_PATH),
            branch: DEFAULT_BRANCH.to_string(),
            base_branch: DEFAULT_BASE_BRANCH.to_string(),
            remote: DEFAULT_REMOTE.to_string(),
            min_content_len: DEFAULT_MIN_CONTENT_LEN,
            pacing: DEFAULT_PACING,
            max_files: None,
            publish: true,
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
            pr_title: DEFAULT_PR_TITLE.to_string(),
            pr_body: DEFAULT_PR_BODY.to_string(),
            model: DEFAULT_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            gemini_api_key: None,
            github_token: None,
        }
    }
}

impl PipelineConfig {
    /// Replace `repo_root` with its canonical absolute form.
    ///
    /// Git runs with the root as its working directory while the report is
    /// written from the process working directory, so both must see the same
    /// absolute root.
    pub fn canonicalize_root(mut self) -> Result<Self> {
        self.repo_root = std::fs::canonicalize(&self.repo_root)
            .map_err(|_| ReviewError::NotFound(self.repo_root.clone()))?;
        Ok(self)
    }

    /// Directory searched first for source files.
    pub fn source_dir(&self) -> PathBuf {
        self.repo_root.join(&self.source_subdir)
    }

    /// Absolute location of the report file.
    pub fn report_file(&self) -> PathBuf {
        resolve(&self.repo_root, &self.report_path)
    }

    /// Analysis credential, or `ConfigurationMissing` when unset.
    pub fn analysis_credential(&self) -> Result<&str> {
        credential(self.gemini_api_key.as_deref(), GEMINI_API_KEY_ENV)
    }

    /// Hosting credential, or `ConfigurationMissing` when unset.
    pub fn hosting_credential(&self) -> Result<&str> {
        credential(self.github_token.as_deref(), GITHUB_TOKEN_ENV)
    }
}

fn credential<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ReviewError::ConfigurationMissing(name)),
    }
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
