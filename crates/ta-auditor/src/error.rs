//! Error types for auditor clients.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuditError>;

#[derive(Debug, Error)]
pub enum AuditError {
    /// Missing API key, invalid settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection failed, timeout
    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limited: {message}")]
    RateLimited {
        message: String,
        /// Seconds from the provider's Retry-After header
        retry_after: Option<u64>,
    },

    /// Prompt does not fit the model's context window
    #[error("Context length exceeded: {0}")]
    ContextLength(String),

    /// Non-2xx response
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Invalid JSON, unexpected response format
    #[error("Parse error: {0}")]
    Parse(String),
}

impl AuditError {
    pub fn is_retryable(&self) -> bool {
        match self {
            AuditError::Network(_) | AuditError::RateLimited { .. } => true,
            AuditError::Api { status, .. } => *status >= 500,
            AuditError::Config(_) | AuditError::ContextLength(_) | AuditError::Parse(_) => false,
        }
    }

    /// Suggested recovery for the user
    pub fn hint(&self) -> &'static str {
        match self {
            AuditError::Config(_) => "Set OPENAI_API_KEY or ANTHROPIC_API_KEY for the chosen provider",
            AuditError::Network(_) => "Check internet connection and retry",
            AuditError::RateLimited { .. } => {
                "Wait 60 seconds before retrying, or switch to a model with higher limits"
            }
            AuditError::ContextLength(_) => {
                "Reduce input text size or lower ai.max_prompt_tokens in the config"
            }
            AuditError::Api { status: 401, .. } => "Check API key configuration",
            AuditError::Api { status: 403, .. } => "Verify API permissions and quota",
            AuditError::Api { .. } => "Check API service status and retry",
            AuditError::Parse(_) => "The provider returned an unexpected response; retry or try another model",
        }
    }

    /// Classify a non-success HTTP response
    pub(crate) fn from_status(status: u16, body: &str, retry_after: Option<u64>) -> Self {
        let message = provider_message(body);
        match status {
            429 => AuditError::RateLimited {
                message,
                retry_after,
            },
            400 | 413 if mentions_context_limit(&message) => AuditError::ContextLength(message),
            _ => AuditError::Api { status, message },
        }
    }
}

fn mentions_context_limit(message: &str) -> bool {
    let lower = message.to_lowercase();
    ["context length", "context_length", "too long", "too large"]
        .iter()
        .any(|needle| lower.contains(needle))
}

/// `error.message` from a JSON error body, or the body itself
fn provider_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        let err = AuditError::from_status(429, r#"{"error":{"message":"slow down"}}"#, Some(20));
        assert!(matches!(
            err,
            AuditError::RateLimited { ref message, retry_after: Some(20) } if message == "slow down"
        ));
        assert!(err.is_retryable());

        let err = AuditError::from_status(
            400,
            r#"{"error":{"message":"This model's maximum context length is 8192 tokens"}}"#,
            None,
        );
        assert!(matches!(err, AuditError::ContextLength(_)));
        assert!(!err.is_retryable());

        let err = AuditError::from_status(401, "unauthorized", None);
        assert_eq!(err.hint(), "Check API key configuration");
        assert!(!err.is_retryable());

        assert!(AuditError::from_status(503, "overloaded", None).is_retryable());
    }

    #[test]
    fn test_display() {
        let err = AuditError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "API error (500): boom");
    }
}
