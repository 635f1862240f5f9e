//! OpenAI chat completions client

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use ta_core::Provider;
use ta_tokens::TokenEstimator;

use crate::client::{check_status, network_error, require_key, with_retries, Auditor, AuditorOptions, ClientCore};
use crate::error::{AuditError, Result};
use crate::prompt::SYSTEM_PROMPT;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const MAX_OUTPUT_TOKENS: u32 = 4000;
const TEMPERATURE: f32 = 0.3;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn request_body<'a>(model: &'a str, prompt: &'a str) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: [
            Message {
                role: "system",
                content: SYSTEM_PROMPT,
            },
            Message {
                role: "user",
                content: prompt,
            },
        ],
        max_tokens: MAX_OUTPUT_TOKENS,
        temperature: TEMPERATURE,
    }
}

/// Joined content of every choice that has any
fn response_text(response: ChatResponse) -> Result<String> {
    let parts: Vec<String> = response
        .choices
        .into_iter()
        .filter_map(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .collect();
    if parts.is_empty() {
        return Err(AuditError::Parse(
            "Unexpected response structure: no valid content found".to_string(),
        ));
    }
    Ok(parts.join("\n\n"))
}

pub struct OpenAiAuditor {
    core: ClientCore,
    estimator: TokenEstimator,
}

impl OpenAiAuditor {
    pub fn new(api_key: impl Into<String>, options: AuditorOptions) -> Result<Self> {
        let api_key = require_key(api_key, Provider::OpenAi.api_key_var())?;
        let estimator = TokenEstimator::new()
            .map_err(|e| AuditError::Config(format!("Failed to load tokenizer: {e}")))?;
        Ok(Self {
            core: ClientCore::new(api_key, DEFAULT_BASE_URL, options)?,
            estimator,
        })
    }

    async fn send(&self, prompt: &str) -> Result<String> {
        let start = std::time::Instant::now();
        let model = self.core.options.model.as_str();

        let response = self
            .core
            .http
            .post(format!("{}/chat/completions", self.core.base_url))
            .bearer_auth(&self.core.api_key)
            .json(&request_body(model, prompt))
            .send()
            .await
            .map_err(network_error)?;
        let response = check_status(response).await?;

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AuditError::Parse(e.to_string()))?;
        let text = response_text(body)?;

        tracing::debug!(
            model,
            duration_ms = start.elapsed().as_millis() as u64,
            "OpenAI chat completion"
        );
        Ok(text)
    }
}

#[async_trait]
impl Auditor for OpenAiAuditor {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    fn model(&self) -> &str {
        &self.core.options.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let tokens = self.estimator.estimate(prompt) + MAX_OUTPUT_TOKENS as usize;
        self.core.limiter.acquire(self.model(), tokens).await;

        let options = &self.core.options;
        with_retries(options.max_retries, options.retry_delay, move || self.send(prompt)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body() {
        let body = serde_json::to_value(request_body("gpt-4o-mini", "audit this")).unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "audit this");
        assert_eq!(body["max_tokens"], 4000);
    }

    #[test]
    fn test_response_text() {
        let raw = r#"{"choices":[{"message":{"content":"QUESTION 1"}},{"message":{"content":null}},{"message":{"content":"QUESTION 2"}}]}"#;
        let response: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response_text(response).unwrap(), "QUESTION 1\n\nQUESTION 2");
    }

    #[test]
    fn test_empty_response_is_parse_error() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(response_text(response), Err(AuditError::Parse(_))));
    }

    #[test]
    fn test_requires_key() {
        let err = OpenAiAuditor::new("", AuditorOptions::new("gpt-4o-mini"))
            .err()
            .unwrap();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let mut options = AuditorOptions::new("gpt-4o-mini");
        options.base_url = Some("http://127.0.0.1:9".to_string());
        options.max_retries = 0;
        options.timeout = std::time::Duration::from_secs(2);

        let auditor = OpenAiAuditor::new("sk-test", options).unwrap();
        let err = auditor.complete("ping").await.unwrap_err();
        assert!(matches!(err, AuditError::Network(_)));
    }
}
