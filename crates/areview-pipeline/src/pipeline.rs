//! End-to-end review pipeline orchestration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use areview_core::{
    is_git_repo, run_span, FileDiscoverer, GitCli, PipelineConfig, Report, Result, ReviewError,
    VersionControl,
};
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use crate::analysis::AnalysisInvoker;
use crate::branch::BranchManager;
use crate::hosting::HostingMode;
use crate::publisher::{Publication, Publisher};
use crate::scheduler::{ScheduleStats, Scheduler};

/// Result of a complete pipeline run that passed every fatal-class stage.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub run_id: String,

    /// Files found by discovery (before any limit).
    pub discovered: usize,

    pub stats: ScheduleStats,

    pub report_path: PathBuf,
    pub report_entries: usize,

    /// Hex SHA-256 of the written report.
    pub report_digest: String,

    /// `None` when publication was disabled.
    pub publication: Option<Publication>,

    pub duration_ms: u64,
}

/// Sequences branch setup, discovery, analysis, aggregation and publication.
pub struct ReviewPipeline {
    config: PipelineConfig,
    vcs: Arc<dyn VersionControl>,
    invoker: AnalysisInvoker,
    hosting: HostingMode,
}

impl ReviewPipeline {
    /// Production wiring: `git` in the repository root, Gemini and GitHub
    /// clients enabled by the configured credentials.
    ///
    /// The repository root is made absolute first and must be a git work
    /// tree.
    pub fn from_config(config: PipelineConfig) -> Result<Self> {
        let config = config.canonicalize_root()?;
        if !is_git_repo(&config.repo_root) {
            return Err(ReviewError::VersionControl(format!(
                "{} is not inside a git work tree",
                config.repo_root.display()
            )));
        }

        let vcs: Arc<dyn VersionControl> = Arc::new(GitCli::new(&config.repo_root));
        let invoker = AnalysisInvoker::from_config(&config)?;
        let hosting = HostingMode::from_config(&config)?;
        Ok(Self::with_components(config, vcs, invoker, hosting))
    }

    /// Explicit wiring, for alternative backends and tests.
    pub fn with_components(
        config: PipelineConfig,
        vcs: Arc<dyn VersionControl>,
        invoker: AnalysisInvoker,
        hosting: HostingMode,
    ) -> Self {
        let invoker = invoker.with_extension(&config.extension);
        Self {
            config,
            vcs,
            invoker,
            hosting,
        }
    }

    /// Run the pipeline once.
    ///
    /// Returns an error only for fatal-class failures: branch setup, a
    /// missing repository root, report writing, or commit/push.
    pub async fn run(&self) -> Result<PipelineResult> {
        let run_id = Uuid::new_v4().to_string();
        self.run_stages(&run_id)
            .instrument(run_span(&run_id))
            .await
    }

    async fn run_stages(&self, run_id: &str) -> Result<PipelineResult> {
        let start = Instant::now();
        info!("Starting Agentic Refactoring Pipeline...");
        if !self.invoker.is_enabled() {
            warn!("GEMINI_API_KEY not set; every file will get a skip notice");
        }
        if !self.hosting.is_enabled() {
            warn!("GITHUB_TOKEN not set; the pull request must be opened manually");
        }

        BranchManager::from_config(self.vcs.clone(), &self.config)
            .prepare()
            .await?;

        let mut files = FileDiscoverer::from_config(&self.config).discover()?;
        let discovered = files.len();
        info!("Found {} {} files.", discovered, self.config.extension);
        if let Some(limit) = self.config.max_files {
            if limit < files.len() {
                info!(limit, "limiting run to the first files discovered");
                files.truncate(limit);
            }
        }

        let outcome = Scheduler::from_config(&self.invoker, &self.config)
            .run(&files)
            .await;

        let report = Report::aggregate(&outcome.results);
        let report_path = self.config.report_file();
        let publisher =
            Publisher::from_config(self.vcs.clone(), self.hosting.clone(), &self.config);

        let publication = if self.config.publish {
            Some(publisher.publish(&report, &report_path).await?)
        } else {
            publisher.write_report(&report, &report_path).await?;
            info!("publication disabled; report left uncommitted");
            None
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(duration_ms, entries = report.entries(), "pipeline finished");

        Ok(PipelineResult {
            run_id: run_id.to_string(),
            discovered,
            stats: outcome.stats,
            report_path,
            report_entries: report.entries(),
            report_digest: report.digest(),
            publication,
            duration_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use areview_core::fakes::{MemoryVcs, VcsCall};
    use std::time::Duration;

    fn config(root: &std::path::Path) -> PipelineConfig {
        PipelineConfig {
            repo_root: root.to_path_buf(),
            pacing: Duration::ZERO,
            ..PipelineConfig::default()
        }
    }

    #[tokio::test]
    async fn limit_truncates_processed_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["A.java", "B.java", "C.java"] {
            std::fs::write(dir.path().join(name), "y".repeat(200)).unwrap();
        }
        let config = PipelineConfig {
            max_files: Some(2),
            publish: false,
            ..config(dir.path())
        };
        let vcs = Arc::new(MemoryVcs::new());

        let result = ReviewPipeline::with_components(
            config,
            vcs.clone(),
            AnalysisInvoker::disabled(),
            HostingMode::Disabled,
        )
        .run()
        .await
        .unwrap();

        assert_eq!(result.discovered, 3);
        assert_eq!(result.stats.total, 2);
        assert_eq!(result.report_entries, 2);
        assert!(result.publication.is_none());
        assert!(result.report_path.exists());
        assert!(!vcs.calls().iter().any(|c| matches!(c, VcsCall::Commit(_))));
    }

    #[test]
    fn from_config_rejects_directory_outside_git() {
        let dir = tempfile::tempdir().unwrap();
        let err = match ReviewPipeline::from_config(config(dir.path())) {
            Err(e) => e,
            Ok(_) => panic!("plain directory accepted as repository"),
        };
        assert!(matches!(err, ReviewError::VersionControl(_)));
    }

    #[test]
    fn from_config_missing_root_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = match ReviewPipeline::from_config(config(&dir.path().join("gone"))) {
            Err(e) => e,
            Ok(_) => panic!("missing root accepted"),
        };
        assert!(matches!(err, ReviewError::NotFound(_)));
    }
}
