//! In-memory fakes for the analysis and hosting boundaries (testing only)

use std::collections::HashMap;
use std::sync::Mutex;

use areview_core::{PullRequestRequest, RepositoryIdentity, Result, ReviewError};
use async_trait::async_trait;

use crate::analysis::AnalysisService;
use crate::hosting::{CreatedPullRequest, PullRequestClient};

// ---------------------------------------------------------------------------
// ScriptedAnalysis
// ---------------------------------------------------------------------------

/// [`AnalysisService`] that answers by file name.
///
/// The file name is taken from the `File: <name>` line of the prompt. Files
/// without a scripted answer get a canned markdown review.
#[derive(Debug, Default)]
pub struct ScriptedAnalysis {
    responses: HashMap<String, std::result::Result<String, String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedAnalysis {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, file_name: &str, text: &str) -> Self {
        self.responses
            .insert(file_name.to_string(), Ok(text.to_string()));
        self
    }

    pub fn fail(mut self, file_name: &str, message: &str) -> Self {
        self.responses
            .insert(file_name.to_string(), Err(message.to_string()));
        self
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// File names in the order they were analysed.
    pub fn analysed_files(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter_map(|p| file_name_of(p))
            .collect()
    }
}

fn file_name_of(prompt: &str) -> Option<String> {
    prompt
        .lines()
        .find_map(|l| l.trim().strip_prefix("File: "))
        .map(str::to_string)
}

#[async_trait]
impl AnalysisService for ScriptedAnalysis {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let name = file_name_of(prompt).unwrap_or_default();
        match self.responses.get(&name) {
            Some(Ok(text)) => Ok(text.clone()),
            Some(Err(message)) => Err(ReviewError::AnalysisService(message.clone())),
            None => Ok(format!(
                "## File: {name}\n### Identified Smells\n- None\n\
                 ### Refactored Code\n### Explanation\nClean."
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingPullRequests
// ---------------------------------------------------------------------------

/// [`PullRequestClient`] that records requests and answers with a fixed
/// outcome.
#[derive(Debug)]
pub struct RecordingPullRequests {
    failure: Option<(u16, String)>,
    requests: Mutex<Vec<(RepositoryIdentity, PullRequestRequest)>>,
}

impl Default for RecordingPullRequests {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingPullRequests {
    pub fn new() -> Self {
        Self {
            failure: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer every request with a non-2xx status.
    pub fn failing(status: u16, body: &str) -> Self {
        Self {
            failure: Some((status, body.to_string())),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<(RepositoryIdentity, PullRequestRequest)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PullRequestClient for RecordingPullRequests {
    async fn create_pull_request(
        &self,
        repo: &RepositoryIdentity,
        request: &PullRequestRequest,
    ) -> Result<CreatedPullRequest> {
        let number = {
            let mut requests = self.requests.lock().unwrap();
            requests.push((repo.clone(), request.clone()));
            requests.len() as u64
        };

        if let Some((status, body)) = &self.failure {
            return Err(ReviewError::Hosting {
                status: *status,
                body: body.clone(),
            });
        }

        Ok(CreatedPullRequest {
            number,
            html_url: format!("https://github.com/{}/{}/pull/{}", repo.owner, repo.repo, number),
        })
    }
}
