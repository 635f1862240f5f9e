//! Auditor trait and shared HTTP plumbing

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use ta_core::Provider;

use crate::error::{AuditError, Result};
use crate::limiter::RateLimiter;

/// Hosted model that answers an audit prompt
#[async_trait]
pub trait Auditor: Send + Sync {
    fn provider(&self) -> Provider;

    fn model(&self) -> &str;

    /// Send the assembled prompt and return the model's text
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Settings shared by every provider client
#[derive(Debug, Clone)]
pub struct AuditorOptions {
    pub model: String,
    pub max_retries: u32,
    pub timeout: Duration,
    /// First retry delay; doubles each attempt
    pub retry_delay: Duration,
    /// Override for proxies and tests
    pub base_url: Option<String>,
}

impl AuditorOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            max_retries: 3,
            timeout: Duration::from_secs(60),
            retry_delay: Duration::from_secs(1),
            base_url: None,
        }
    }
}

pub(crate) fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AuditError::Config(format!("Failed to build HTTP client: {e}")))
}

/// Fail fast on an empty key
pub(crate) fn require_key(key: impl Into<String>, var: &str) -> Result<String> {
    let key = key.into();
    if key.trim().is_empty() {
        return Err(AuditError::Config(format!("{var} not set")));
    }
    Ok(key)
}

/// Turn a non-success response into a classified error
pub(crate) async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(status = %status, error = %body, "Provider API error");
    Err(AuditError::from_status(status.as_u16(), &body, retry_after))
}

pub(crate) fn network_error(e: reqwest::Error) -> AuditError {
    tracing::warn!(error = %e, "Provider request failed");
    AuditError::Network(e.to_string())
}

/// Run `op`, retrying retryable failures up to `max_retries` times with
/// exponential backoff
pub async fn with_retries<T, F, Fut>(max_retries: u32, base_delay: Duration, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < max_retries => {
                let mut delay = base_delay.saturating_mul(1 << attempt.min(16));
                if let AuditError::RateLimited {
                    retry_after: Some(secs),
                    ..
                } = &e
                {
                    delay = delay.max(Duration::from_secs(*secs));
                }
                attempt += 1;
                tracing::info!(
                    attempt,
                    max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Retrying audit request"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// State common to both clients
#[derive(Debug, Clone)]
pub(crate) struct ClientCore {
    pub http: Client,
    pub api_key: String,
    pub base_url: String,
    pub options: AuditorOptions,
    pub limiter: Arc<RateLimiter>,
}

impl ClientCore {
    pub fn new(api_key: String, default_base: &str, options: AuditorOptions) -> Result<Self> {
        Ok(Self {
            http: http_client(options.timeout)?,
            api_key,
            base_url: options
                .base_url
                .clone()
                .unwrap_or_else(|| default_base.to_string())
                .trim_end_matches('/')
                .to_string(),
            options,
            limiter: Arc::new(RateLimiter::new()),
        })
    }
}
