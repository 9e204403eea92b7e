//! Agentic Review CLI
//!
//! The `areview` command runs the design-smell review pipeline against a
//! git repository:
//!
//! 1. Checks out and pulls the base branch, then switches to the dedicated
//!    review branch
//! 2. Sends every discovered source file to Gemini for review
//! 3. Writes the aggregated markdown report
//! 4. Commits and pushes it, and opens a GitHub pull request
//!
//! Credentials come from `GEMINI_API_KEY` and `GITHUB_TOKEN` (a `.env` file
//! in the working directory is honoured). Without them the run still
//! completes, with skip notices in the report and no pull request.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use areview_core::config::{
    DEFAULT_BASE_BRANCH, DEFAULT_BRANCH, DEFAULT_EXTENSION, DEFAULT_GEMINI_BASE_URL,
    DEFAULT_GITHUB_API_URL, DEFAULT_MIN_CONTENT_LEN, DEFAULT_MODEL, DEFAULT_PACING,
    DEFAULT_REMOTE, DEFAULT_REPORT_PATH, DEFAULT_SOURCE_SUBDIR,
};
use areview_core::{CommitOutcome, PipelineConfig};
use areview_pipeline::{PipelineResult, PullRequestOutcome, ReviewPipeline};
use clap::Parser;
use tracing::{error, Level};

#[derive(Parser)]
#[command(name = "areview")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Agentic design-smell review pipeline", long_about = None)]
struct Cli {
    /// Repository root
    #[arg(long, env = "AREVIEW_REPO", default_value = ".")]
    repo: PathBuf,

    /// Source directory searched first, relative to the repository root
    #[arg(long, env = "AREVIEW_SOURCE_DIR", default_value = DEFAULT_SOURCE_SUBDIR)]
    source_dir: PathBuf,

    /// Extension of files to review
    #[arg(long, env = "AREVIEW_EXTENSION", default_value = DEFAULT_EXTENSION)]
    extension: String,

    /// Report path, relative to the repository root
    #[arg(long, env = "AREVIEW_REPORT", default_value = DEFAULT_REPORT_PATH)]
    report: PathBuf,

    /// Dedicated branch the report is published to
    #[arg(long, env = "AREVIEW_BRANCH", default_value = DEFAULT_BRANCH)]
    branch: String,

    /// Base branch to sync from and open the pull request against
    #[arg(long, env = "AREVIEW_BASE_BRANCH", default_value = DEFAULT_BASE_BRANCH)]
    base: String,

    /// Git remote
    #[arg(long, env = "AREVIEW_REMOTE", default_value = DEFAULT_REMOTE)]
    remote: String,

    /// Minimum trimmed file length (characters) worth analysing
    #[arg(long, default_value_t = DEFAULT_MIN_CONTENT_LEN)]
    min_length: usize,

    /// Pause after each analysis call, in milliseconds
    #[arg(long, env = "AREVIEW_PACING_MS", default_value_t = DEFAULT_PACING.as_millis() as u64)]
    pacing_ms: u64,

    /// Process only the first N discovered files
    #[arg(long)]
    limit: Option<usize>,

    /// Write the report but do not commit, push or open a pull request
    #[arg(long)]
    no_publish: bool,

    /// Gemini model
    #[arg(long, env = "AREVIEW_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Gemini API base URL
    #[arg(long, env = "GEMINI_BASE_URL", default_value = DEFAULT_GEMINI_BASE_URL, hide = true)]
    gemini_base_url: String,

    /// GitHub API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_GITHUB_API_URL, hide = true)]
    github_api_url: String,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,

    /// GitHub token used to open the pull request
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn into_config(self) -> PipelineConfig {
        PipelineConfig {
            repo_root: self.repo,
            source_subdir: self.source_dir,
            extension: self.extension,
            report_path: self.report,
            branch: self.branch,
            base_branch: self.base,
            remote: self.remote,
            min_content_len: self.min_length,
            pacing: Duration::from_millis(self.pacing_ms),
            max_files: self.limit,
            publish: !self.no_publish,
            model: self.model,
            gemini_base_url: self.gemini_base_url,
            github_api_url: self.github_api_url,
            gemini_api_key: self.gemini_api_key.filter(|k| !k.trim().is_empty()),
            github_token: self.github_token.filter(|t| !t.trim().is_empty()),
            ..PipelineConfig::default()
        }
    }
}

fn main() -> ExitCode {
    // Load .env before clap reads environment fallbacks.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    areview_core::init_tracing(cli.json, level);

    match run(cli) {
        Ok(result) => {
            print_summary(&result);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            eprintln!("✗ Pipeline aborted: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<PipelineResult> {
    let config = cli.into_config();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(async {
        let pipeline =
            ReviewPipeline::from_config(config).context("failed to set up review pipeline")?;
        pipeline.run().await.context("review pipeline failed")
    })
}

fn print_summary(result: &PipelineResult) {
    let stats = &result.stats;
    println!();
    println!("Run ID: {}", result.run_id);
    println!("Duration: {}ms", result.duration_ms);
    println!(
        "Files: {} discovered, {} processed",
        result.discovered, stats.total
    );
    println!(
        "  ✓ {} analysed  ✗ {} failed  - {} skipped (no API key)",
        stats.succeeded, stats.failed, stats.skipped
    );
    println!(
        "  {} too small, {} unreadable",
        stats.too_small, stats.unreadable
    );
    println!(
        "Report: {} ({} entries, sha256 {})",
        result.report_path.display(),
        result.report_entries,
        &result.report_digest[..12]
    );

    let Some(publication) = &result.publication else {
        println!("Publication: disabled");
        return;
    };

    match publication.commit {
        CommitOutcome::Committed => println!("Commit: ✓ committed and pushed"),
        CommitOutcome::NothingToCommit => println!("Commit: no changes, branch pushed"),
    }
    match &publication.pull_request {
        PullRequestOutcome::Created { number, url } => {
            println!("Pull request: ✓ #{number} {url}")
        }
        PullRequestOutcome::Skipped { reason } => println!("Pull request: skipped ({reason})"),
        PullRequestOutcome::Failed { reason } => println!("Pull request: ✗ failed ({reason})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_pipeline_defaults() {
        let cli = Cli::try_parse_from(["areview"]).unwrap();
        let config = cli.into_config();
        let defaults = PipelineConfig::default();

        assert_eq!(config.branch, defaults.branch);
        assert_eq!(config.base_branch, defaults.base_branch);
        assert_eq!(config.source_subdir, defaults.source_subdir);
        assert_eq!(config.report_path, defaults.report_path);
        assert_eq!(config.min_content_len, defaults.min_content_len);
        assert_eq!(config.pacing, defaults.pacing);
        assert!(config.publish);
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "areview",
            "--repo",
            "/work/repo",
            "--branch",
            "review/smells",
            "--base",
            "master",
            "--extension",
            "kt",
            "--pacing-ms",
            "0",
            "--limit",
            "5",
            "--no-publish",
            "--gemini-api-key",
            "k",
        ])
        .unwrap();
        let config = cli.into_config();

        assert_eq!(config.repo_root, PathBuf::from("/work/repo"));
        assert_eq!(config.branch, "review/smells");
        assert_eq!(config.base_branch, "master");
        assert_eq!(config.extension, "kt");
        assert_eq!(config.pacing, Duration::ZERO);
        assert_eq!(config.max_files, Some(5));
        assert!(!config.publish);
        assert_eq!(config.gemini_api_key.as_deref(), Some("k"));
    }

    #[test]
    fn blank_key_is_treated_as_missing() {
        let cli = Cli::try_parse_from(["areview", "--gemini-api-key", "  "]).unwrap();
        assert!(cli.into_config().gemini_api_key.is_none());
    }
}
