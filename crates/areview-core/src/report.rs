//! Report aggregation and persistence.

use sha2::{Digest, Sha256};
use std::path::Path;

use crate::error::Result;
use crate::model::AnalysisResult;

/// Fixed header at the top of every report.
pub const REPORT_HEADER: &str =
    "# Agentic Refactoring Report\n\nGenerated by Gemini-powered pipeline.\n\n";

/// Delimiter appended after every entry.
pub const ENTRY_DELIMITER: &str = "\n\n---\n\n";

/// The aggregated markdown document for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    content: String,
    entries: usize,
}

impl Report {
    /// Concatenate result bodies in the given order.
    pub fn aggregate(results: &[AnalysisResult]) -> Self {
        let mut content = String::from(REPORT_HEADER);
        for result in results {
            content.push_str(&result.body);
            content.push_str(ENTRY_DELIMITER);
        }
        Self {
            content,
            entries: results.len(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Hex SHA-256 of the rendered document.
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(self.content.as_bytes()))
    }

    /// Write the report, replacing any previous one and creating parent
    /// directories as needed.
    pub async fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, self.content.as_bytes()).await?;
        Ok(())
    }
}
