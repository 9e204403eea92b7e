//! Agentic Review Core Library
//!
//! Domain records, configuration, file discovery, report aggregation, remote
//! identity resolution and the git boundary used by the review pipeline.

pub mod config;
pub mod discover;
pub mod error;
pub mod fakes;
pub mod git;
pub mod model;
pub mod remote;
pub mod report;
pub mod telemetry;

pub use config::PipelineConfig;
pub use discover::FileDiscoverer;
pub use error::{Result, ReviewError};
pub use git::{is_git_repo, CommitOutcome, GitCli, VersionControl};
pub use model::{
    display_name, AnalysisResult, AnalysisStatus, PullRequestRequest, RepositoryIdentity,
    SourceFile,
};
pub use remote::{parse_github_remote, parse_remote_url, GITHUB_HOST};
pub use report::{Report, ENTRY_DELIMITER, REPORT_HEADER};
pub use telemetry::{init_tracing, run_span};
