//! Code-hosting boundary: pull-request creation.

use std::sync::Arc;
use std::time::Duration;

use areview_core::{PipelineConfig, PullRequestRequest, RepositoryIdentity, Result, ReviewError};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{info, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A pull request the hosting provider accepted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedPullRequest {
    pub number: u64,
    pub html_url: String,
}

/// Opens pull requests on the hosting provider.
#[async_trait]
pub trait PullRequestClient: Send + Sync {
    /// Create a pull request. Any response other than `201 Created` is a
    /// [`ReviewError::Hosting`] carrying the status and response body.
    async fn create_pull_request(
        &self,
        repo: &RepositoryIdentity,
        request: &PullRequestRequest,
    ) -> Result<CreatedPullRequest>;
}

/// GitHub REST client (`POST /repos/{owner}/{repo}/pulls`).
pub struct GitHubClient {
    token: String,
    api_url: String,
    client: reqwest::Client,
}

impl GitHubClient {
    pub fn new(token: &str, api_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("areview/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ReviewError::Http(e.to_string()))?;

        Ok(Self {
            token: token.to_string(),
            api_url: api_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl PullRequestClient for GitHubClient {
    async fn create_pull_request(
        &self,
        repo: &RepositoryIdentity,
        request: &PullRequestRequest,
    ) -> Result<CreatedPullRequest> {
        let url = format!("{}/repos/{}/{}/pulls", self.api_url, repo.owner, repo.repo);

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
            .json(request)
            .send()
            .await
            .map_err(|e| ReviewError::Http(e.to_string()))?;

        let status = resp.status();
        if status != StatusCode::CREATED {
            let body = resp.text().await.unwrap_or_default();
            return Err(ReviewError::Hosting {
                status: status.as_u16(),
                body,
            });
        }

        resp.json::<CreatedPullRequest>()
            .await
            .map_err(|e| ReviewError::Http(format!("unexpected pull request response: {e}")))
    }
}

/// Whether pull requests are opened after a successful push.
#[derive(Clone)]
pub enum HostingMode {
    Enabled(Arc<dyn PullRequestClient>),
    Disabled,
}

impl HostingMode {
    /// GitHub-backed when the hosting credential is set, disabled otherwise.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        match config.hosting_credential() {
            Ok(token) => {
                info!("pull request creation enabled");
                Ok(Self::Enabled(Arc::new(GitHubClient::new(
                    token,
                    &config.github_api_url,
                )?)))
            }
            Err(e) => {
                warn!(error = %e, "pull request creation disabled");
                Ok(Self::Disabled)
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, HostingMode::Enabled(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn identity() -> RepositoryIdentity {
        RepositoryIdentity {
            owner: "acme".to_string(),
            repo: "widget".to_string(),
        }
    }

    fn request() -> PullRequestRequest {
        PullRequestRequest {
            title: "[Agentic] Refactoring Suggestions".to_string(),
            body: "report".to_string(),
            head: "Agentic_Pipeline".to_string(),
            base: "main".to_string(),
        }
    }

    #[tokio::test]
    async fn created_pull_request_returns_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/acme/widget/pulls"))
            .and(header("Authorization", "token ghp_test"))
            .and(header("Accept", "application/vnd.github.v3+json"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "number": 7,
                "html_url": "https://github.com/acme/widget/pull/7",
                "state": "open"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GitHubClient::new("ghp_test", &server.uri()).unwrap();
        let created = client
            .create_pull_request(&identity(), &request())
            .await
            .unwrap();
        assert_eq!(created.number, 7);
        assert_eq!(created.html_url, "https://github.com/acme/widget/pull/7");

        let sent = &server.received_requests().await.unwrap()[0];
        let body: serde_json::Value = serde_json::from_slice(&sent.body).unwrap();
        assert_eq!(
            body,
            json!({
                "title": "[Agentic] Refactoring Suggestions",
                "body": "report",
                "head": "Agentic_Pipeline",
                "base": "main"
            })
        );
    }

    #[tokio::test]
    async fn non_created_status_is_hosting_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_string(r#"{"message":"A pull request already exists"}"#),
            )
            .mount(&server)
            .await;

        let client = GitHubClient::new("ghp_test", &server.uri()).unwrap();
        let err = client
            .create_pull_request(&identity(), &request())
            .await
            .unwrap_err();
        match err {
            ReviewError::Hosting { status, body } => {
                assert_eq!(status, 422);
                assert!(body.contains("already exists"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn ok_status_other_than_created_is_still_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let client = GitHubClient::new("ghp_test", &server.uri()).unwrap();
        let err = client
            .create_pull_request(&identity(), &request())
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewError::Hosting { status: 200, .. }));
    }

    #[test]
    fn mode_follows_credential() {
        assert!(!HostingMode::from_config(&PipelineConfig::default())
            .unwrap()
            .is_enabled());
        let config = PipelineConfig {
            github_token: Some("ghp_x".to_string()),
            ..PipelineConfig::default()
        };
        assert!(HostingMode::from_config(&config).unwrap().is_enabled());
    }
}
