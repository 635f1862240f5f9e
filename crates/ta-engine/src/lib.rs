//! Extract → redact → assemble → audit

pub mod batch;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use ta_auditor::{
    parse_response, summarize, Auditor, AuditorOptions, ClaudeAuditor, OpenAiAuditor,
    PromptAssembler, ResponseCache,
};
use ta_config::Config;
use ta_core::{AuditReport, Provider, RedactedDocument, SourceDocument};
use ta_security::Redactor;
use ta_sources::{ExtractOptions, ExtractorRegistry};
use ta_tokens::{limits_for, Fitted, TokenEstimator};
use time::OffsetDateTime;

pub use batch::{BatchOptions, BatchSummary, FileOutcome};

/// A document before and after redaction
#[derive(Debug, Clone)]
pub struct RedactionOutcome {
    pub source: SourceDocument,
    pub redacted: RedactedDocument,
}

pub struct Pipeline {
    registry: ExtractorRegistry,
    redactor: Arc<Redactor>,
    assembler: PromptAssembler,
    estimator: TokenEstimator,
    auditor: Option<Arc<dyn Auditor>>,
    cache: Option<ResponseCache>,
    max_prompt_tokens: Option<usize>,
}

impl Pipeline {
    pub fn new(
        registry: ExtractorRegistry,
        redactor: Redactor,
        assembler: PromptAssembler,
    ) -> Result<Self> {
        Ok(Self {
            registry,
            redactor: Arc::new(redactor),
            assembler,
            estimator: TokenEstimator::new()?,
            auditor: None,
            cache: None,
            max_prompt_tokens: None,
        })
    }

    /// Extraction limits, redaction settings, procedures and the response
    /// cache from `config`. No auditor is attached.
    pub fn from_config(config: &Config) -> Result<Self> {
        let registry = ExtractorRegistry::new(ExtractOptions {
            max_pages: config.extraction.max_pages,
            max_file_size_mb: config.extraction.max_file_size_mb,
        });
        let redactor = Redactor::with_settings(config.redaction.settings());
        let assembler = PromptAssembler::from_procedures_file(&config.paths.procedures_file)
            .with_context(|| {
                format!(
                    "reading procedures file {}",
                    config.paths.procedures_file.display()
                )
            })?;

        let mut pipeline =
            Self::new(registry, redactor, assembler)?.with_prompt_budget(config.ai.max_prompt_tokens);
        if config.ai.enable_caching {
            pipeline = pipeline.with_cache(
                ResponseCache::new(&config.paths.cache_dir)
                    .with_max_age(Duration::from_secs(config.ai.cache_max_age_hours * 3600)),
            );
        }
        Ok(pipeline)
    }

    pub fn with_auditor(mut self, auditor: Arc<dyn Auditor>) -> Self {
        self.auditor = Some(auditor);
        self
    }

    /// Reuse stored answers for prompts already sent to the same model
    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Token budget for prompts; the model's per-minute limit when unset
    pub fn with_prompt_budget(mut self, max_tokens: Option<usize>) -> Self {
        self.max_prompt_tokens = max_tokens;
        self
    }

    pub fn redactor(&self) -> &Redactor {
        &self.redactor
    }

    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    pub async fn redact_file(&self, path: &Path) -> Result<RedactionOutcome> {
        let source = self
            .registry
            .extract(path)
            .await
            .with_context(|| format!("extracting {}", path.display()))?;

        let redacted = self.redactor.redact(&source.text);
        tracing::info!(
            path = %path.display(),
            chars = source.text.chars().count(),
            redactions = redacted.total_redactions(),
            "Redacted document"
        );
        Ok(RedactionOutcome { source, redacted })
    }

    /// The audit prompt for `redacted_text`, fitted to the budget for `model`
    pub fn prompt_for(&self, redacted_text: &str, model: &str) -> Fitted {
        let budget = self
            .max_prompt_tokens
            .unwrap_or_else(|| limits_for(model).tpm);
        let prompt = self.assembler.assemble(redacted_text);
        self.estimator.fit(&prompt, budget)
    }

    pub async fn audit_file(&self, path: &Path) -> Result<AuditReport> {
        let outcome = self.redact_file(path).await?;
        self.audit(&outcome).await
    }

    pub async fn audit(&self, outcome: &RedactionOutcome) -> Result<AuditReport> {
        let auditor = self
            .auditor
            .as_ref()
            .context("no auditor configured for this pipeline")?;

        let fitted = self.prompt_for(&outcome.redacted.text, auditor.model());
        tracing::debug!(
            provider = %auditor.provider(),
            model = auditor.model(),
            prompt_tokens = fitted.original_tokens,
            truncated = fitted.truncated,
            "Sending audit prompt"
        );

        let cached = self
            .cache
            .as_ref()
            .and_then(|cache| cache.get(auditor.provider(), auditor.model(), &fitted.text));
        let from_cache = cached.is_some();
        let raw_response = match cached {
            Some(response) => {
                tracing::info!(path = %outcome.source.path, "Using cached audit response");
                response
            }
            None => auditor
                .complete(&fitted.text)
                .await
                .with_context(|| format!("{} audit of {}", auditor.provider(), outcome.source.path))?,
        };
        let results = parse_response(&raw_response);
        let summary = summarize(&raw_response, &results);

        // Only answers that parsed into results are worth replaying
        if let Some(cache) = self.cache.as_ref().filter(|_| !from_cache && !results.is_empty()) {
            if let Err(e) = cache.put(auditor.provider(), auditor.model(), &fitted.text, &raw_response) {
                tracing::warn!(error = %e, "Could not cache audit response");
            }
        }

        Ok(AuditReport {
            id: uuid::Uuid::new_v4().to_string(),
            provider: auditor.provider().to_string(),
            model: auditor.model().to_string(),
            source_path: outcome.source.path.clone(),
            document_hash: outcome.source.content_hash.clone(),
            redaction: outcome.redacted.statistics.clone(),
            prompt_truncated: fitted.truncated,
            raw_response,
            results,
            summary,
            created_at: OffsetDateTime::now_utc(),
        })
    }
}

/// Provider client from config; `model` overrides the configured one
pub fn build_auditor(
    config: &Config,
    provider: Provider,
    model: Option<&str>,
) -> Result<Arc<dyn Auditor>> {
    let model = match model {
        Some(m) => m.to_string(),
        None if provider == config.ai.provider => config.ai.model().to_string(),
        None => provider.default_model().to_string(),
    };
    let mut options = AuditorOptions::new(model);
    options.max_retries = config.ai.max_retries;
    options.timeout = std::time::Duration::from_secs(config.ai.timeout_secs);

    let key = config
        .ai
        .api_key(provider)
        .with_context(|| format!("{} is not set", provider.api_key_var()))?
        .to_string();

    let auditor: Arc<dyn Auditor> = match provider {
        Provider::OpenAi => Arc::new(OpenAiAuditor::new(key, options)?),
        Provider::Claude => Arc::new(ClaudeAuditor::new(key, options)?),
    };
    Ok(auditor)
}
