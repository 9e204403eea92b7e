//! Sequential, paced dispatch of files to the analysis invoker.

use std::path::PathBuf;
use std::time::Duration;

use areview_core::{display_name, AnalysisResult, AnalysisStatus, PipelineConfig, SourceFile};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::analysis::AnalysisInvoker;

/// Per-run file accounting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScheduleStats {
    /// Files handed to the scheduler.
    pub total: usize,

    /// Files that could not be read; they get no report entry.
    pub unreadable: usize,

    /// Files below the minimum content length; no entry, no analysis call.
    pub too_small: usize,

    pub succeeded: usize,
    pub failed: usize,

    /// Files answered with the skip notice (analysis disabled).
    pub skipped: usize,
}

impl ScheduleStats {
    /// Files that reached the analysis invoker.
    pub fn analysed(&self) -> usize {
        self.succeeded + self.failed + self.skipped
    }

    fn record(&mut self, status: AnalysisStatus) {
        match status {
            AnalysisStatus::Succeeded => self.succeeded += 1,
            AnalysisStatus::Failed => self.failed += 1,
            AnalysisStatus::Skipped => self.skipped += 1,
        }
    }
}

/// Results in discovery order plus accounting.
#[derive(Debug, Clone)]
pub struct ScheduleOutcome {
    pub results: Vec<AnalysisResult>,
    pub stats: ScheduleStats,
}

/// Drives the analysis invoker over a file list, one file at a time.
pub struct Scheduler<'a> {
    invoker: &'a AnalysisInvoker,
    min_content_len: usize,
    pacing: Duration,
}

impl<'a> Scheduler<'a> {
    pub fn new(invoker: &'a AnalysisInvoker, min_content_len: usize, pacing: Duration) -> Self {
        Self {
            invoker,
            min_content_len,
            pacing,
        }
    }

    pub fn from_config(invoker: &'a AnalysisInvoker, config: &PipelineConfig) -> Self {
        Self::new(invoker, config.min_content_len, config.pacing)
    }

    /// Process `files` in order.
    ///
    /// Unreadable files are logged and dropped. Files whose trimmed content
    /// is shorter than the minimum are dropped without an analysis call.
    /// Every analysis call is followed by the pacing pause, whatever its
    /// outcome.
    pub async fn run(&self, files: &[PathBuf]) -> ScheduleOutcome {
        let total = files.len();
        let mut stats = ScheduleStats {
            total,
            ..ScheduleStats::default()
        };
        let mut results = Vec::with_capacity(total);

        for (i, path) in files.iter().enumerate() {
            let name = display_name(path);
            info!("Analyzing [{}/{}]: {}", i + 1, total, name);

            let file = match SourceFile::load(path).await {
                Ok(file) => file,
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "failed to process file");
                    stats.unreadable += 1;
                    continue;
                }
            };

            let len = file.trimmed_len();
            if len < self.min_content_len {
                debug!(file = %name, len, min = self.min_content_len, "skipping small file");
                stats.too_small += 1;
                continue;
            }

            let result = self.invoker.invoke(&file).await;
            debug!(file = %name, status = result.status.as_str(), "analysis recorded");
            stats.record(result.status);
            results.push(result);

            if !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }
        }

        info!(
            analysed = stats.analysed(),
            succeeded = stats.succeeded,
            failed = stats.failed,
            skipped = stats.skipped,
            too_small = stats.too_small,
            unreadable = stats.unreadable,
            "analysis loop finished"
        );

        ScheduleOutcome { results, stats }
    }
}
