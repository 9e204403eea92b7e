//! In-memory fake for the version-control boundary (testing only)
//!
//! [`MemoryVcs`] tracks branches, staged content and every call made, and can
//! be told to fail a given operation.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Result, ReviewError};
use crate::git::{CommitOutcome, VersionControl};

/// Operations that can be scripted to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VcsOp {
    Checkout,
    Pull,
    CreateOrSwitch,
    Add,
    Commit,
    Push,
    RemoteUrl,
}

/// A recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VcsCall {
    Checkout(String),
    Pull { remote: String, branch: String },
    CreateOrSwitch(String),
    Add(PathBuf),
    Commit(String),
    Push { remote: String, branch: String },
    RemoteUrl(String),
}

#[derive(Debug)]
struct VcsState {
    calls: Vec<VcsCall>,
    branches: BTreeSet<String>,
    current: String,
    remote_url: String,
    staged: BTreeMap<PathBuf, Vec<u8>>,
    committed: BTreeMap<PathBuf, Vec<u8>>,
    commits: usize,
    pushed: Vec<String>,
    failures: HashMap<VcsOp, String>,
}

/// In-memory [`VersionControl`].
#[derive(Debug)]
pub struct MemoryVcs {
    state: Mutex<VcsState>,
}

impl Default for MemoryVcs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryVcs {
    /// A repository on `main` with a GitHub `origin`.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(VcsState {
                calls: Vec::new(),
                branches: BTreeSet::from(["main".to_string()]),
                current: "main".to_string(),
                remote_url: "git@github.com:acme/widget.git".to_string(),
                staged: BTreeMap::new(),
                committed: BTreeMap::new(),
                commits: 0,
                pushed: Vec::new(),
                failures: HashMap::new(),
            }),
        }
    }

    pub fn with_remote_url(self, url: &str) -> Self {
        self.state.lock().unwrap().remote_url = url.to_string();
        self
    }

    pub fn with_branch(self, branch: &str) -> Self {
        self.state.lock().unwrap().branches.insert(branch.to_string());
        self
    }

    /// Make every call of `op` fail with `message`.
    pub fn fail_on(self, op: VcsOp, message: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(op, message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<VcsCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn current(&self) -> String {
        self.state.lock().unwrap().current.clone()
    }

    pub fn branches(&self) -> Vec<String> {
        self.state.lock().unwrap().branches.iter().cloned().collect()
    }

    pub fn commit_count(&self) -> usize {
        self.state.lock().unwrap().commits
    }

    pub fn pushed_branches(&self) -> Vec<String> {
        self.state.lock().unwrap().pushed.clone()
    }

    fn record(&self, op: VcsOp, call: VcsCall) -> Result<std::sync::MutexGuard<'_, VcsState>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if let Some(message) = state.failures.get(&op) {
            return Err(ReviewError::VersionControl(message.clone()));
        }
        Ok(state)
    }
}

#[async_trait]
impl VersionControl for MemoryVcs {
    async fn checkout(&self, branch: &str) -> Result<()> {
        let mut state = self.record(VcsOp::Checkout, VcsCall::Checkout(branch.to_string()))?;
        if !state.branches.contains(branch) {
            return Err(ReviewError::VersionControl(format!(
                "error: pathspec '{branch}' did not match any file(s) known to git"
            )));
        }
        state.current = branch.to_string();
        Ok(())
    }

    async fn pull(&self, remote: &str, branch: &str) -> Result<()> {
        self.record(
            VcsOp::Pull,
            VcsCall::Pull {
                remote: remote.to_string(),
                branch: branch.to_string(),
            },
        )?;
        Ok(())
    }

    async fn checkout_create_or_switch(&self, branch: &str) -> Result<()> {
        let mut state = self.record(
            VcsOp::CreateOrSwitch,
            VcsCall::CreateOrSwitch(branch.to_string()),
        )?;
        state.branches.insert(branch.to_string());
        state.current = branch.to_string();
        Ok(())
    }

    async fn add(&self, path: &Path) -> Result<()> {
        let mut state = self.record(VcsOp::Add, VcsCall::Add(path.to_path_buf()))?;
        let content = std::fs::read(path).map_err(|e| {
            ReviewError::VersionControl(format!("fatal: pathspec '{}': {e}", path.display()))
        })?;
        if state.committed.get(path) == Some(&content) {
            state.staged.remove(path);
        } else {
            state.staged.insert(path.to_path_buf(), content);
        }
        Ok(())
    }

    async fn commit(&self, message: &str) -> Result<CommitOutcome> {
        let mut state = self.record(VcsOp::Commit, VcsCall::Commit(message.to_string()))?;
        if state.staged.is_empty() {
            return Ok(CommitOutcome::NothingToCommit);
        }
        let staged = std::mem::take(&mut state.staged);
        state.committed.extend(staged);
        state.commits += 1;
        Ok(CommitOutcome::Committed)
    }

    async fn push(&self, remote: &str, branch: &str) -> Result<()> {
        let mut state = self.record(
            VcsOp::Push,
            VcsCall::Push {
                remote: remote.to_string(),
                branch: branch.to_string(),
            },
        )?;
        state.pushed.push(branch.to_string());
        Ok(())
    }

    async fn remote_url(&self, remote: &str) -> Result<String> {
        let state = self.record(VcsOp::RemoteUrl, VcsCall::RemoteUrl(remote.to_string()))?;
        Ok(state.remote_url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_of_unchanged_content_leaves_nothing_to_commit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");
        std::fs::write(&path, "v1").unwrap();

        let vcs = MemoryVcs::new();
        vcs.add(&path).await.unwrap();
        assert_eq!(vcs.commit("m").await.unwrap(), CommitOutcome::Committed);

        vcs.add(&path).await.unwrap();
        assert_eq!(
            vcs.commit("m").await.unwrap(),
            CommitOutcome::NothingToCommit
        );
        assert_eq!(vcs.commit_count(), 1);
    }

    #[tokio::test]
    async fn scripted_failure_is_recorded_and_returned() {
        let vcs = MemoryVcs::new().fail_on(VcsOp::Push, "rejected");
        let err = vcs.push("origin", "review").await.unwrap_err();
        assert!(err.to_string().contains("rejected"));
        assert_eq!(
            vcs.calls(),
            vec![VcsCall::Push {
                remote: "origin".to_string(),
                branch: "review".to_string()
            }]
        );
        assert!(vcs.pushed_branches().is_empty());
    }
}
