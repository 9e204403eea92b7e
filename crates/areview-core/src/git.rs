//! Version-control boundary.
//!
//! [`VersionControl`] is the narrow set of git operations the pipeline
//! consumes. [`GitCli`] implements it by shelling out to `git`; every failure
//! carries git's own stderr.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, ReviewError};

/// Outcome of a commit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// Nothing was staged; treated as success.
    NothingToCommit,
}

/// Git operations used by the pipeline. Each call is atomic from the
/// pipeline's point of view.
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Check out an existing branch.
    async fn checkout(&self, branch: &str) -> Result<()>;

    /// Pull `branch` from `remote` into the current branch.
    async fn pull(&self, remote: &str, branch: &str) -> Result<()>;

    /// Switch to `branch`, creating it from the current HEAD when missing.
    async fn checkout_create_or_switch(&self, branch: &str) -> Result<()>;

    /// Stage a path.
    async fn add(&self, path: &Path) -> Result<()>;

    /// Commit staged changes. An empty index yields
    /// [`CommitOutcome::NothingToCommit`], not an error.
    async fn commit(&self, message: &str) -> Result<CommitOutcome>;

    /// Push `branch` to `remote`, setting upstream.
    async fn push(&self, remote: &str, branch: &str) -> Result<()>;

    /// URL configured for `remote`.
    async fn remote_url(&self, remote: &str) -> Result<String>;
}

/// [`VersionControl`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    repo_dir: PathBuf,
}

impl GitCli {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
        }
    }

    async fn output(&self, args: &[&str]) -> Result<std::process::Output> {
        debug!(args = ?args, "running git");
        Command::new("git")
            .args(args)
            .current_dir(&self.repo_dir)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ReviewError::VersionControl(format!("failed to run git: {e}")))
    }

    /// Run git and return trimmed stdout, failing on a non-zero exit.
    async fn run(&self, args: &[&str]) -> Result<String> {
        let output = self.output(args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReviewError::VersionControl(format!(
                "git {} failed: {}",
                args.join(" "),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn branch_exists(&self, branch: &str) -> Result<bool> {
        let reference = format!("refs/heads/{branch}");
        let output = self
            .output(&["rev-parse", "--verify", "--quiet", &reference])
            .await?;
        Ok(output.status.success())
    }

    async fn has_staged_changes(&self) -> Result<bool> {
        let output = self
            .output(&["diff", "--cached", "--quiet", "--exit-code"])
            .await?;
        match output.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(ReviewError::VersionControl(format!(
                "git diff --cached failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ))),
        }
    }
}

#[async_trait]
impl VersionControl for GitCli {
    async fn checkout(&self, branch: &str) -> Result<()> {
        self.run(&["checkout", branch]).await.map(|_| ())
    }

    async fn pull(&self, remote: &str, branch: &str) -> Result<()> {
        self.run(&["pull", remote, branch]).await.map(|_| ())
    }

    async fn checkout_create_or_switch(&self, branch: &str) -> Result<()> {
        if self.branch_exists(branch).await? {
            self.run(&["checkout", branch]).await.map(|_| ())
        } else {
            self.run(&["checkout", "-b", branch]).await.map(|_| ())
        }
    }

    /// Paths under the work tree are passed to git relative to it, since git
    /// resolves pathspecs against its own working directory.
    async fn add(&self, path: &Path) -> Result<()> {
        let path = path.strip_prefix(&self.repo_dir).unwrap_or(path);
        let path = path.to_string_lossy();
        self.run(&["add", "--", &*path]).await.map(|_| ())
    }

    async fn commit(&self, message: &str) -> Result<CommitOutcome> {
        if !self.has_staged_changes().await? {
            return Ok(CommitOutcome::NothingToCommit);
        }
        self.run(&["commit", "-m", message]).await?;
        Ok(CommitOutcome::Committed)
    }

    async fn push(&self, remote: &str, branch: &str) -> Result<()> {
        self.run(&["push", "-u", remote, branch]).await.map(|_| ())
    }

    async fn remote_url(&self, remote: &str) -> Result<String> {
        self.run(&["remote", "get-url", remote]).await
    }
}

/// Whether `dir` lies inside a git work tree (a bare repository or a `.git`
/// directory does not count).
pub fn is_git_repo(dir: &Path) -> bool {
    std::process::Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(["rev-parse", "--is-inside-work-tree"])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .map(|out| out.status.success() && out.stdout.starts_with(b"true"))
        .unwrap_or(false)
}
