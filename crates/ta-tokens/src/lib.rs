pub mod limits;

use std::sync::Arc;
use tiktoken_rs::CoreBPE;

pub use limits::{limits_for, ModelLimits};

pub const TRUNCATION_MARKER: &str = "[...TRUNCATED...]";

/// Share of the model budget a truncated prompt may use
pub const BUDGET_HEADROOM: f64 = 0.8;

/// Result of fitting text into a token budget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fitted {
    pub text: String,
    pub original_tokens: usize,
    pub truncated: bool,
}

/// Token estimator using tiktoken (cl100k_base encoding)
///
/// Claude models have no public tokenizer; cl100k_base is close enough for
/// budgeting.
#[derive(Clone)]
pub struct TokenEstimator {
    bpe: Arc<CoreBPE>,
}

impl TokenEstimator {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            bpe: Arc::new(tiktoken_rs::cl100k_base()?),
        })
    }

    /// Estimate token count for a single string
    pub fn estimate(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    /// Cut the middle out of `text` so head and tail fit in `max_tokens`
    pub fn truncate_middle(&self, text: &str, max_tokens: usize) -> String {
        let tokens = self.bpe.encode_ordinary(text);
        if tokens.len() <= max_tokens {
            return text.to_string();
        }

        let keep = max_tokens / 2;

        // Token boundaries can split a multi-byte character; shrink until it decodes
        let mut head = &tokens[..keep];
        let head_text = loop {
            match self.bpe.decode(head.to_vec()) {
                Ok(text) => break text,
                Err(_) if !head.is_empty() => head = &head[..head.len() - 1],
                Err(_) => break String::new(),
            }
        };
        let mut tail = &tokens[tokens.len() - keep..];
        let tail_text = loop {
            match self.bpe.decode(tail.to_vec()) {
                Ok(text) => break text,
                Err(_) if !tail.is_empty() => tail = &tail[1..],
                Err(_) => break String::new(),
            }
        };

        format!("{head_text}\n\n{TRUNCATION_MARKER}\n\n{tail_text}")
    }

    /// Leave `text` alone when it fits `budget`; otherwise truncate to the
    /// headroom share of it
    pub fn fit(&self, text: &str, budget: usize) -> Fitted {
        let original_tokens = self.estimate(text);
        if original_tokens <= budget {
            return Fitted {
                text: text.to_string(),
                original_tokens,
                truncated: false,
            };
        }

        let target = (budget as f64 * BUDGET_HEADROOM) as usize;
        tracing::warn!(
            tokens = original_tokens,
            budget,
            target,
            "Prompt exceeds token budget, truncating middle"
        );
        Fitted {
            text: self.truncate_middle(text, target),
            original_tokens,
            truncated: true,
        }
    }
}

impl std::fmt::Debug for TokenEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenEstimator")
            .field("encoding", &"cl100k_base")
            .finish()
    }
}
