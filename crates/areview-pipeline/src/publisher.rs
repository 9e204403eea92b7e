//! Report publication: write, stage, commit, push, open a pull request.
//!
//! Pushing is the primary success criterion. Once the push has succeeded,
//! pull-request problems are reported as outcomes, never as errors.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use areview_core::{
    parse_github_remote, CommitOutcome, PipelineConfig, PullRequestRequest, Report, Result,
    VersionControl,
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::hosting::HostingMode;

/// What happened to the pull-request step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PullRequestOutcome {
    Created { number: u64, url: String },
    /// Informational: no credential, or the remote is not on GitHub.
    Skipped { reason: String },
    /// The hosting API refused or could not be reached.
    Failed { reason: String },
}

/// Result of a publication that reached the push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub report_path: PathBuf,
    pub commit: CommitOutcome,
    pub pull_request: PullRequestOutcome,
}

/// Persists the report and publishes it on the dedicated branch.
pub struct Publisher {
    vcs: Arc<dyn VersionControl>,
    hosting: HostingMode,
    remote: String,
    branch: String,
    base_branch: String,
    commit_message: String,
    pr_title: String,
    pr_body: String,
}

impl Publisher {
    pub fn from_config(
        vcs: Arc<dyn VersionControl>,
        hosting: HostingMode,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            vcs,
            hosting,
            remote: config.remote.clone(),
            branch: config.branch.clone(),
            base_branch: config.base_branch.clone(),
            commit_message: config.commit_message.clone(),
            pr_title: config.pr_title.clone(),
            pr_body: config.pr_body.clone(),
        }
    }

    /// Write the report to `path`, fully replacing any previous report.
    pub async fn write_report(&self, report: &Report, path: &Path) -> Result<()> {
        info!("Writing report to {}...", path.display());
        report.write_to(path).await
    }

    /// Write, stage, commit and push the report, then try to open a pull
    /// request.
    ///
    /// Errors from writing, staging, committing or pushing abort publication
    /// before any pull request is attempted. An empty commit is not an error.
    pub async fn publish(&self, report: &Report, path: &Path) -> Result<Publication> {
        self.write_report(report, path).await?;

        info!("Committing changes...");
        self.vcs.add(path).await?;
        let commit = self.vcs.commit(&self.commit_message).await?;
        if commit == CommitOutcome::NothingToCommit {
            info!("No changes to commit");
        }

        if let Err(e) = self.vcs.push(&self.remote, &self.branch).await {
            error!(branch = %self.branch, error = %e, "push failed");
            return Err(e);
        }
        info!(branch = %self.branch, remote = %self.remote, "pushed report");

        let pull_request = self.open_pull_request().await;
        Ok(Publication {
            report_path: path.to_path_buf(),
            commit,
            pull_request,
        })
    }

    async fn open_pull_request(&self) -> PullRequestOutcome {
        info!("Creating Pull Request...");
        let client = match &self.hosting {
            HostingMode::Enabled(client) => client,
            HostingMode::Disabled => {
                let reason = format!(
                    "GITHUB_TOKEN not found. Please manually create a PR from branch '{}' to '{}'.",
                    self.branch, self.base_branch
                );
                info!("{reason}");
                return PullRequestOutcome::Skipped { reason };
            }
        };

        let identity = match self.vcs.remote_url(&self.remote).await {
            Ok(url) => parse_github_remote(&url),
            Err(e) => Err(e),
        };
        let identity = match identity {
            Ok(identity) => identity,
            Err(e) => {
                let reason = format!("Could not determine repo info for PR creation: {e}");
                info!("{reason}");
                return PullRequestOutcome::Skipped { reason };
            }
        };

        let request = PullRequestRequest {
            title: self.pr_title.clone(),
            body: self.pr_body.clone(),
            head: self.branch.clone(),
            base: self.base_branch.clone(),
        };

        match client.create_pull_request(&identity, &request).await {
            Ok(created) => {
                info!(
                    repo = %identity,
                    url = %created.html_url,
                    "Pull Request created successfully"
                );
                PullRequestOutcome::Created {
                    number: created.number,
                    url: created.html_url,
                }
            }
            Err(e) => {
                warn!(repo = %identity, error = %e, "Failed to create PR");
                PullRequestOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}
