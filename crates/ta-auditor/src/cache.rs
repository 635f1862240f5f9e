//! On-disk cache of model responses

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use ta_core::{Provider, Result};
use time::OffsetDateTime;

pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Serialize, Deserialize)]
struct Entry {
    provider: String,
    model: String,
    /// Unix seconds
    created_at: i64,
    response: String,
}

/// One JSON file per prompt, named by the blake3 of provider, model and prompt
#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
    max_age: Duration,
}

impl ResponseCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_age: DEFAULT_MAX_AGE,
        }
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn key(provider: Provider, model: &str, prompt: &str) -> String {
        let provider = provider.to_string();
        let mut hasher = blake3::Hasher::new();
        for part in [provider.as_str(), model, prompt] {
            hasher.update(part.as_bytes());
            hasher.update(&[0]);
        }
        hasher.finalize().to_hex().to_string()
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// The stored response, unless missing, unreadable or older than the max age
    pub fn get(&self, provider: Provider, model: &str, prompt: &str) -> Option<String> {
        let path = self.entry_path(&Self::key(provider, model, prompt));
        let content = std::fs::read_to_string(&path).ok()?;
        let entry: Entry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Ignoring corrupt cache entry");
                return None;
            }
        };

        let age = OffsetDateTime::now_utc().unix_timestamp() - entry.created_at;
        if age < 0 || age as u64 >= self.max_age.as_secs() {
            tracing::debug!(path = %path.display(), age_secs = age, "Cache entry expired");
            let _ = std::fs::remove_file(&path);
            return None;
        }
        Some(entry.response)
    }

    pub fn put(&self, provider: Provider, model: &str, prompt: &str, response: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let entry = Entry {
            provider: provider.to_string(),
            model: model.to_string(),
            created_at: OffsetDateTime::now_utc().unix_timestamp(),
            response: response.to_string(),
        };
        let path = self.entry_path(&Self::key(provider, model, prompt));
        std::fs::write(&path, serde_json::to_string(&entry)?)?;
        Ok(())
    }
}
