//! Compliance audit of redacted tickets by hosted models
//!
//! - `prompt`: the single audit prompt (question table, procedures excerpt)
//! - `client`, `openai`, `claude`: provider clients behind the `Auditor` trait
//! - `parse`: splitting the model's answer into per-question results
//! - `report`: text and JSON reports on disk
//! - `cache`: responses kept on disk for repeated prompts

pub mod cache;
pub mod claude;
pub mod client;
pub mod error;
pub mod limiter;
pub mod openai;
pub mod parse;
pub mod prompt;
pub mod report;

pub use cache::ResponseCache;
pub use claude::ClaudeAuditor;
pub use client::{with_retries, Auditor, AuditorOptions};
pub use error::{AuditError, Result};
pub use limiter::RateLimiter;
pub use openai::OpenAiAuditor;
pub use parse::{parse_response, summarize};
pub use prompt::{PromptAssembler, PROCEDURE_EXCERPT_CHARS, SYSTEM_PROMPT};
pub use report::{render_text, score_line, ReportWriter};
