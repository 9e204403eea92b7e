//! Analysis dispatch to the language-model service.
//!
//! [`AnalysisInvoker`] turns one source file into exactly one
//! [`AnalysisResult`]. It never returns an error: a missing credential yields
//! a `Skipped` record and a failed service call yields a `Failed` record.

use std::sync::Arc;
use std::time::Duration;

use areview_core::{AnalysisResult, PipelineConfig, Result, ReviewError, SourceFile};
use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info, warn};

/// Body recorded for every file when no analysis credential is configured.
pub const SKIP_NOTICE: &str = "## Analysis Skipped\nMissing API Key.";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// A language model that answers a prompt with free-form text.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Model identifier, for logs.
    fn model_name(&self) -> &str;

    /// Submit a prompt and return the response text verbatim.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Google Gemini `generateContent` client.
pub struct GeminiClient {
    api_key: String,
    model: String,
    endpoint: String,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a client against `base_url`
    /// (normally `https://generativelanguage.googleapis.com`).
    pub fn new(api_key: &str, model: &str, base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("areview/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ReviewError::Http(e.to_string()))?;

        Ok(Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                base_url.trim_end_matches('/'),
                model
            ),
            client,
        })
    }
}

#[async_trait]
impl AnalysisService for GeminiClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let payload = json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }]
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await
            .map_err(|e| ReviewError::AnalysisService(e.without_url().to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ReviewError::AnalysisService(format!(
                "Gemini API error {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| ReviewError::AnalysisService(e.without_url().to_string()))?;

        let text = body["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p["text"].as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            let reason = body["promptFeedback"]["blockReason"]
                .as_str()
                .or_else(|| body["candidates"][0]["finishReason"].as_str())
                .unwrap_or("no candidates returned");
            return Err(ReviewError::AnalysisService(format!(
                "Gemini returned no text: {reason}"
            )));
        }

        Ok(text)
    }
}

/// Whether analysis calls are made at all.
#[derive(Clone)]
pub enum AnalysisMode {
    Enabled(Arc<dyn AnalysisService>),
    Disabled,
}

/// Wraps one file in a prompt and normalises the service outcome.
#[derive(Clone)]
pub struct AnalysisInvoker {
    mode: AnalysisMode,
    extension: String,
}

impl AnalysisInvoker {
    pub fn enabled(service: Arc<dyn AnalysisService>) -> Self {
        Self {
            mode: AnalysisMode::Enabled(service),
            extension: areview_core::config::DEFAULT_EXTENSION.to_string(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            mode: AnalysisMode::Disabled,
            extension: areview_core::config::DEFAULT_EXTENSION.to_string(),
        }
    }

    /// Gemini-backed when the analysis credential is set, disabled otherwise.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let invoker = match config.analysis_credential() {
            Ok(key) => {
                let client = GeminiClient::new(key, &config.model, &config.gemini_base_url)?;
                info!(model = %config.model, "analysis service enabled");
                Self::enabled(Arc::new(client))
            }
            Err(e) => {
                warn!(error = %e, "analysis disabled; every file will get a skip notice");
                Self::disabled()
            }
        };
        Ok(invoker.with_extension(&config.extension))
    }

    /// Source extension, used to tag code fences in the prompt.
    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.mode, AnalysisMode::Enabled(_))
    }

    /// Analyse one file. At most one service call is made.
    pub async fn invoke(&self, file: &SourceFile) -> AnalysisResult {
        let name = file.display_name();
        let service = match &self.mode {
            AnalysisMode::Enabled(service) => service,
            AnalysisMode::Disabled => {
                return AnalysisResult::skipped(&file.path, SKIP_NOTICE.to_string())
            }
        };

        let prompt = build_prompt(&name, &file.content, &self.extension);
        debug!(
            file = %name,
            model = %service.model_name(),
            prompt_len = prompt.len(),
            "sending analysis request"
        );

        match service.generate(&prompt).await {
            Ok(text) => AnalysisResult::succeeded(&file.path, text),
            Err(e) => {
                warn!(file = %name, error = %e, "analysis failed");
                AnalysisResult::failed(&file.path, failure_body(&name, &e))
            }
        }
    }
}

/// Report body for a failed analysis.
pub fn failure_body(file_name: &str, error: &ReviewError) -> String {
    let message = match error {
        ReviewError::AnalysisService(msg) => msg.clone(),
        other => other.to_string(),
    };
    format!("## Error Analyzing {file_name}\n{message}")
}

/// Code-fence tag and human-readable name for a file extension.
fn language_for(extension: &str) -> (&str, &str) {
    match extension {
        "java" => ("java", "Java"),
        "kt" => ("kotlin", "Kotlin"),
        "rs" => ("rust", "Rust"),
        "py" => ("python", "Python"),
        "go" => ("go", "Go"),
        "js" => ("javascript", "JavaScript"),
        "ts" => ("typescript", "TypeScript"),
        "cs" => ("csharp", "C#"),
        "cpp" | "cc" | "hpp" => ("cpp", "C++"),
        other => (other, other),
    }
}

/// Build the review prompt for one file.
pub fn build_prompt(file_name: &str, content: &str, extension: &str) -> String {
    let (fence, language) = language_for(extension);
    format!(
        r#"You are an expert software architect. Analyze the following {language} code for common design smells (e.g., God Class, Long Method, Feature Envy, Duplication).

File: {file_name}

Code:
```{fence}
{content}
```

Task:
1. Identify specific design smells.
2. Provide a refactored version of the code that fixes these smells.
3. Explain the changes.

Output Format (Markdown):
## File: {file_name}
### Identified Smells
- [Smell Name]: Description...
### Refactored Code
```{fence}
// Refactored code here
```
### Explanation
...
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::ScriptedAnalysis;
    use std::path::PathBuf;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source(name: &str, content: &str) -> SourceFile {
        SourceFile {
            path: PathBuf::from("/repo/src").join(name),
            content: content.to_string(),
            size: content.len() as u64,
        }
    }

    #[test]
    fn prompt_embeds_file_and_section_template() {
        let prompt = build_prompt("Widget.java", "class Widget {}", "java");
        assert!(prompt.contains("File: Widget.java"));
        assert!(prompt.contains("```java\nclass Widget {}\n```"));
        assert!(prompt.contains("## File: Widget.java"));
        assert!(prompt.contains("### Identified Smells"));
        assert!(prompt.contains("### Refactored Code"));
        assert!(prompt.contains("### Explanation"));
        assert!(prompt.contains("Java code"));
    }

    #[test]
    fn prompt_uses_fence_for_extension() {
        let prompt = build_prompt("lib.rs", "fn main() {}", "rs");
        assert!(prompt.contains("```rust\nfn main() {}"));
        let prompt = build_prompt("x.zig", "", "zig");
        assert!(prompt.contains("```zig"));
    }

    #[tokio::test]
    async fn disabled_invoker_returns_skip_notice() {
        let invoker = AnalysisInvoker::disabled();
        let result = invoker.invoke(&source("A.java", "class A {}")).await;
        assert_eq!(result.status, areview_core::AnalysisStatus::Skipped);
        assert_eq!(result.body, SKIP_NOTICE);
        assert!(!invoker.is_enabled());
    }

    #[tokio::test]
    async fn success_returns_response_verbatim() {
        let service = Arc::new(ScriptedAnalysis::new().respond("A.java", "not even markdown"));
        let invoker = AnalysisInvoker::enabled(service.clone());

        let result = invoker.invoke(&source("A.java", "class A {}")).await;
        assert_eq!(result.status, areview_core::AnalysisStatus::Succeeded);
        assert_eq!(result.body, "not even markdown");
        assert_eq!(service.call_count(), 1);
    }

    #[tokio::test]
    async fn service_error_becomes_failed_record() {
        let service = Arc::new(ScriptedAnalysis::new().fail("B.java", "quota exceeded"));
        let invoker = AnalysisInvoker::enabled(service.clone());

        let result = invoker.invoke(&source("B.java", "class B {}")).await;
        assert_eq!(result.status, areview_core::AnalysisStatus::Failed);
        assert_eq!(result.body, "## Error Analyzing B.java\nquota exceeded");
        assert_eq!(service.call_count(), 1, "no retries");
    }

    #[test]
    fn from_config_without_key_is_disabled() {
        let invoker = AnalysisInvoker::from_config(&PipelineConfig::default()).unwrap();
        assert!(!invoker.is_enabled());

        let config = PipelineConfig {
            gemini_api_key: Some("k".to_string()),
            ..PipelineConfig::default()
        };
        assert!(AnalysisInvoker::from_config(&config).unwrap().is_enabled());
    }

    #[tokio::test]
    async fn gemini_client_extracts_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {
                        "parts": [
                            { "text": "## File: A.java\n" },
                            { "text": "### Identified Smells" }
                        ]
                    },
                    "finishReason": "STOP"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::new("test-key", "gemini-1.5-flash", &server.uri()).unwrap();
        let text = client.generate("prompt").await.unwrap();
        assert_eq!(text, "## File: A.java\n### Identified Smells");

        let request = &server.received_requests().await.unwrap()[0];
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "prompt");
    }

    #[tokio::test]
    async fn gemini_client_maps_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("RESOURCE_EXHAUSTED"))
            .mount(&server)
            .await;

        let client = GeminiClient::new("k", "gemini-1.5-flash", &server.uri()).unwrap();
        let err = client.generate("prompt").await.unwrap_err();
        match err {
            ReviewError::AnalysisService(msg) => {
                assert!(msg.contains("429"));
                assert!(msg.contains("RESOURCE_EXHAUSTED"));
                assert!(!msg.contains("key="), "API key must not leak: {msg}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn gemini_client_blocked_prompt_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "promptFeedback": { "blockReason": "SAFETY" }
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::new("k", "gemini-1.5-flash", &server.uri()).unwrap();
        let err = client.generate("prompt").await.unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }
}
