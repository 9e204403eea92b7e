//! Agentic Review pipeline
//!
//! Orchestrates one review run:
//! - Syncs and checks out the dedicated branch
//! - Sends each discovered file to the analysis service, one at a time
//! - Aggregates the findings into a markdown report
//! - Commits and pushes the report, then opens a pull request

pub mod analysis;
pub mod branch;
pub mod fakes;
pub mod hosting;
pub mod pipeline;
pub mod publisher;
pub mod scheduler;

// Re-export key types
pub use analysis::{
    build_prompt, AnalysisInvoker, AnalysisMode, AnalysisService, GeminiClient, SKIP_NOTICE,
};
pub use branch::{BranchManager, BranchState};
pub use hosting::{CreatedPullRequest, GitHubClient, HostingMode, PullRequestClient};
pub use pipeline::{PipelineResult, ReviewPipeline};
pub use publisher::{Publication, PullRequestOutcome, Publisher};
pub use scheduler::{ScheduleOutcome, ScheduleStats, Scheduler};
