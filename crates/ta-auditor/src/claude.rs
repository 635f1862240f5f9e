//! Anthropic messages API client

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use ta_core::Provider;
use ta_tokens::TokenEstimator;

use crate::client::{check_status, network_error, require_key, with_retries, Auditor, AuditorOptions, ClientCore};
use crate::error::{AuditError, Result};
use crate::prompt::SYSTEM_PROMPT;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";
const MAX_OUTPUT_TOKENS: u32 = 4000;
const TEMPERATURE: f32 = 0.1;

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

fn request_body<'a>(model: &'a str, prompt: &'a str) -> MessagesRequest<'a> {
    MessagesRequest {
        model,
        max_tokens: MAX_OUTPUT_TOKENS,
        temperature: TEMPERATURE,
        system: SYSTEM_PROMPT,
        messages: [Message {
            role: "user",
            content: prompt,
        }],
    }
}

/// Joined text blocks; tool-use and other block kinds are skipped
fn response_text(response: MessagesResponse) -> Result<String> {
    let parts: Vec<String> = response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect();
    if parts.is_empty() {
        return Err(AuditError::Parse(
            "Unexpected response structure: no valid text blocks found".to_string(),
        ));
    }
    Ok(parts.join("\n\n"))
}

pub struct ClaudeAuditor {
    core: ClientCore,
    estimator: TokenEstimator,
}

impl ClaudeAuditor {
    pub fn new(api_key: impl Into<String>, options: AuditorOptions) -> Result<Self> {
        let api_key = require_key(api_key, Provider::Claude.api_key_var())?;
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
            .post(format!("{}/messages", self.core.base_url))
            .header("x-api-key", &self.core.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request_body(model, prompt))
            .send()
            .await
            .map_err(network_error)?;
        let response = check_status(response).await?;

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AuditError::Parse(e.to_string()))?;
        let text = response_text(body)?;

        tracing::debug!(
            model,
            duration_ms = start.elapsed().as_millis() as u64,
            "Claude message"
        );
        Ok(text)
    }
}

#[async_trait]
impl Auditor for ClaudeAuditor {
    fn provider(&self) -> Provider {
        Provider::Claude
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
