//! Dedicated-branch lifecycle.
//!
//! ```text
//! OnUnknownBranch --checkout base--> BaseSynced --pull base--> BaseUpToDate
//!     --create-or-switch dedicated--> OnDedicatedBranch
//! ```
//!
//! Any failure aborts the run before analysis starts.

use std::sync::Arc;

use areview_core::{PipelineConfig, Result, ReviewError, VersionControl};
use tracing::{error, info};

/// Position in the branch setup sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchState {
    OnUnknownBranch,
    BaseSynced,
    BaseUpToDate,
    OnDedicatedBranch,
}

/// Puts the working tree on the dedicated branch, synced from base.
pub struct BranchManager {
    vcs: Arc<dyn VersionControl>,
    remote: String,
    base_branch: String,
    branch: String,
}

impl BranchManager {
    pub fn new(
        vcs: Arc<dyn VersionControl>,
        remote: &str,
        base_branch: &str,
        branch: &str,
    ) -> Self {
        Self {
            vcs,
            remote: remote.to_string(),
            base_branch: base_branch.to_string(),
            branch: branch.to_string(),
        }
    }

    pub fn from_config(vcs: Arc<dyn VersionControl>, config: &PipelineConfig) -> Self {
        Self::new(vcs, &config.remote, &config.base_branch, &config.branch)
    }

    /// Walk the state machine to [`BranchState::OnDedicatedBranch`].
    ///
    /// Succeeds whether or not the dedicated branch already exists.
    pub async fn prepare(&self) -> Result<BranchState> {
        if self.branch == self.base_branch {
            return Err(ReviewError::VersionControl(format!(
                "dedicated branch '{}' must differ from base branch",
                self.branch
            )));
        }

        info!(branch = %self.branch, base = %self.base_branch, "Setting up branch");
        let mut state = BranchState::OnUnknownBranch;
        while state != BranchState::OnDedicatedBranch {
            state = self.step(state).await.map_err(|e| {
                error!(state = ?state, error = %e, "branch setup failed");
                e
            })?;
        }
        info!(branch = %self.branch, "on dedicated branch");
        Ok(state)
    }

    async fn step(&self, state: BranchState) -> Result<BranchState> {
        match state {
            BranchState::OnUnknownBranch => {
                self.vcs.checkout(&self.base_branch).await?;
                Ok(BranchState::BaseSynced)
            }
            BranchState::BaseSynced => {
                self.vcs.pull(&self.remote, &self.base_branch).await?;
                Ok(BranchState::BaseUpToDate)
            }
            BranchState::BaseUpToDate => {
                self.vcs.checkout_create_or_switch(&self.branch).await?;
                Ok(BranchState::OnDedicatedBranch)
            }
            BranchState::OnDedicatedBranch => Ok(state),
        }
    }
}
