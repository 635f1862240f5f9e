use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use ta_core::{Category, Provider};
use ta_security::{BusinessLexicon, RedactionSettings};

/// Configuration for ticket-audit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub redaction: RedactionConfig,

    #[serde(default)]
    pub extraction: ExtractionConfig,

    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedactionConfig {
    /// Categories that are never applied
    #[serde(default)]
    pub disabled: Vec<Category>,

    #[serde(default)]
    pub lexicon: BusinessLexicon,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<usize>,

    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub provider: Provider,

    /// Falls back to the provider's default model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_prompt_tokens: Option<usize>,

    /// Reuse responses for prompts already sent to the same model
    #[serde(default = "default_enable_caching")]
    pub enable_caching: bool,

    #[serde(default = "default_cache_max_age_hours")]
    pub cache_max_age_hours: u64,

    // Keys come from the environment only
    #[serde(skip)]
    pub openai_api_key: Option<String>,

    #[serde(skip)]
    pub anthropic_api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,

    #[serde(default = "default_procedures_file")]
    pub procedures_file: PathBuf,

    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_pages: None,
            max_file_size_mb: default_max_file_size_mb(),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: None,
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
            max_prompt_tokens: None,
            enable_caching: default_enable_caching(),
            cache_max_age_hours: default_cache_max_age_hours(),
            openai_api_key: None,
            anthropic_api_key: None,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            reports_dir: default_reports_dir(),
            procedures_file: default_procedures_file(),
            cache_dir: default_cache_dir(),
        }
    }
}

fn default_max_file_size_mb() -> u64 {
    50
}

fn default_max_retries() -> u32 {
    3
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_enable_caching() -> bool {
    true
}

fn default_cache_max_age_hours() -> u64 {
    24
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("cache")
}

fn default_reports_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_procedures_file() -> PathBuf {
    PathBuf::from("incident_handling_procedures.txt")
}

impl RedactionConfig {
    pub fn enabled_categories(&self) -> BTreeSet<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| !self.disabled.contains(c))
            .collect()
    }

    pub fn settings(&self) -> RedactionSettings {
        RedactionSettings {
            enabled: self.enabled_categories(),
            lexicon: self.lexicon.clone(),
        }
    }
}

impl AiConfig {
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    pub fn api_key(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::OpenAi => self.openai_api_key.as_deref(),
            Provider::Claude => self.anthropic_api_key.as_deref(),
        }
    }
}

/// Outcome of `Config::validate`
#[derive(Debug, Default)]
pub struct Validation {
    /// Problems that block an audit
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
}

impl Validation {
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }
}

fn parse_categories(value: &str) -> anyhow::Result<Vec<Category>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<Category>().map_err(anyhow::Error::from))
        .collect()
}

impl Config {
    /// Load config from default location or create default if not found,
    /// then apply environment overrides
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let content = toml::to_string_pretty(&config)?;
            std::fs::write(path, content)?;
            tracing::info!(path = %path.display(), "Created default config");
            Ok(config)
        }
    }

    /// Get config file path
    pub fn config_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "ticket-audit", "ticket-audit") {
            dirs.config_dir().join("config.toml")
        } else {
            PathBuf::from("~/.ticket-audit/config.toml")
        }
    }

    /// Apply overrides from `lookup` (the process environment in `load`)
    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("TICKET_AUDIT_CATEGORIES") {
            let active = parse_categories(&value).context("TICKET_AUDIT_CATEGORIES")?;
            self.redaction.disabled = Category::ALL
                .into_iter()
                .filter(|c| !active.contains(c))
                .collect();
        }
        if let Some(value) = lookup("TICKET_AUDIT_DISABLED_CATEGORIES") {
            for category in parse_categories(&value).context("TICKET_AUDIT_DISABLED_CATEGORIES")? {
                if !self.redaction.disabled.contains(&category) {
                    self.redaction.disabled.push(category);
                }
            }
        }
        if let Some(value) = lookup("TICKET_AUDIT_PROVIDER") {
            self.ai.provider = value
                .parse()
                .map_err(anyhow::Error::msg)
                .context("TICKET_AUDIT_PROVIDER")?;
        }
        if let Some(value) = lookup("TICKET_AUDIT_MODEL").filter(|v| !v.trim().is_empty()) {
            self.ai.model = Some(value);
        }

        let key = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(value) = key("OPENAI_API_KEY") {
            self.ai.openai_api_key = Some(value);
        }
        if let Some(value) = key("ANTHROPIC_API_KEY") {
            self.ai.anthropic_api_key = Some(value);
        }
        Ok(())
    }

    pub fn validate(&self) -> Validation {
        let mut result = Validation::default();

        if self.ai.api_key(self.ai.provider).is_none() {
            result.issues.push(format!(
                "{} is not set; audits with provider '{}' will fail",
                self.ai.provider.api_key_var(),
                self.ai.provider
            ));
        }
        for other in [Provider::OpenAi, Provider::Claude] {
            if other != self.ai.provider && self.ai.api_key(other).is_none() {
                result
                    .warnings
                    .push(format!("{} is not set", other.api_key_var()));
            }
        }
        if !self.paths.procedures_file.exists() {
            result.warnings.push(format!(
                "procedures file {} not found; prompts will carry no procedure reference",
                self.paths.procedures_file.display()
            ));
        }
        if self.redaction.enabled_categories().is_empty() {
            result
                .warnings
                .push("all redaction categories are disabled".to_string());
        }
        if self.extraction.max_file_size_mb == 0 {
            result
                .issues
                .push("extraction.max_file_size_mb must be greater than 0".to_string());
        }
        if self.ai.enable_caching && self.ai.cache_max_age_hours == 0 {
            result
                .warnings
                .push("ai.cache_max_age_hours is 0; cached responses never match".to_string());
        }
        if self.ai.max_prompt_tokens == Some(0) {
            result
                .issues
                .push("ai.max_prompt_tokens must be greater than 0".to_string());
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.extraction.max_file_size_mb, 50);
        assert_eq!(config.ai.provider, Provider::OpenAi);
        assert_eq!(config.ai.max_retries, 3);
        assert_eq!(config.ai.model(), "gpt-4o-mini");
        assert_eq!(config.redaction.enabled_categories().len(), Category::ALL.len());
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        config.ai.openai_api_key = Some("sk-test".to_string());
        let toml_str = toml::to_string(&config).unwrap();
        assert!(!toml_str.contains("sk-test"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.ai.timeout_secs, config.ai.timeout_secs);
        assert_eq!(parsed.redaction.lexicon, config.redaction.lexicon);
        assert!(parsed.ai.openai_api_key.is_none());
    }

    #[test]
    fn test_partial_file() {
        let parsed: Config = toml::from_str(
            r#"
[redaction]
disabled = ["NAME", "IP"]

[ai]
provider = "claude"
"#,
        )
        .unwrap();
        let enabled = parsed.redaction.enabled_categories();
        assert!(!enabled.contains(&Category::Name));
        assert!(!enabled.contains(&Category::Ip));
        assert!(enabled.contains(&Category::Phone));
        assert_eq!(parsed.ai.model(), "claude-3-5-sonnet-20241022");
        assert_eq!(parsed.paths.reports_dir, PathBuf::from("reports"));
        assert_eq!(parsed.paths.cache_dir, PathBuf::from("cache"));
        assert!(parsed.ai.enable_caching);
        assert_eq!(parsed.ai.cache_max_age_hours, 24);
    }

    #[test]
    fn test_env_active_categories() {
        let mut config = Config::default();
        config
            .apply_env(env(&[("TICKET_AUDIT_CATEGORIES", "phone, email")]))
            .unwrap();
        let enabled: Vec<Category> = config.redaction.enabled_categories().into_iter().collect();
        assert_eq!(enabled, vec![Category::Email, Category::Phone]);
    }

    #[test]
    fn test_env_disabled_and_keys() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("TICKET_AUDIT_DISABLED_CATEGORIES", "names"),
                ("TICKET_AUDIT_PROVIDER", "anthropic"),
                ("TICKET_AUDIT_MODEL", "claude-3-haiku-20240307"),
                ("ANTHROPIC_API_KEY", "key"),
                ("OPENAI_API_KEY", "  "),
            ]))
            .unwrap();
        assert!(!config.redaction.settings().enabled.contains(&Category::Name));
        assert_eq!(config.ai.provider, Provider::Claude);
        assert_eq!(config.ai.model(), "claude-3-haiku-20240307");
        assert_eq!(config.ai.api_key(Provider::Claude), Some("key"));
        assert_eq!(config.ai.api_key(Provider::OpenAi), None);
    }

    #[test]
    fn test_env_rejects_unknown_category() {
        let mut config = Config::default();
        let err = config
            .apply_env(env(&[("TICKET_AUDIT_CATEGORIES", "phone,ssn")]))
            .unwrap_err();
        assert!(format!("{err:#}").contains("TICKET_AUDIT_CATEGORIES"));
    }

    #[test]
    fn test_validate() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.paths.procedures_file = dir.path().join("missing.txt");

        let report = config.validate();
        assert!(!report.is_ok());
        assert!(report.issues[0].contains("OPENAI_API_KEY"));
        assert!(report.warnings.iter().any(|w| w.contains("missing.txt")));

        let procedures = dir.path().join("procedures.txt");
        std::fs::write(&procedures, "Acknowledge within 15 minutes").unwrap();
        config.paths.procedures_file = procedures;
        config.ai.openai_api_key = Some("sk-test".to_string());
        let report = config.validate();
        assert!(report.is_ok());
        assert!(!report.warnings.iter().any(|w| w.contains("procedures")));

        config.ai.cache_max_age_hours = 0;
        assert!(config.validate().warnings.iter().any(|w| w.contains("cache_max_age_hours")));
        config.ai.enable_caching = false;
        assert!(!config.validate().warnings.iter().any(|w| w.contains("cache_max_age_hours")));
    }

    #[test]
    fn test_load_creates_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.ai.max_retries, 3);

        std::fs::write(&path, "[extraction]\nmax_pages = 2\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.extraction.max_pages, Some(2));
    }
}
