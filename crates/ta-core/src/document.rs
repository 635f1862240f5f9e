//! Extracted source document

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Plain text pulled out of a ticket export, before redaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    pub id: String,
    pub path: String,
    pub text: String,
    pub page_count: usize,
    pub size_bytes: usize,
    pub content_hash: String,
    #[serde(with = "time::serde::timestamp")]
    pub extracted_at: OffsetDateTime,
}

impl SourceDocument {
    pub fn new(path: impl Into<String>, text: String, page_count: usize) -> Self {
        let content_hash = blake3::hash(text.as_bytes()).to_hex().to_string();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            path: path.into(),
            size_bytes: text.len(),
            text,
            page_count,
            content_hash,
            extracted_at: OffsetDateTime::now_utc(),
        }
    }

    /// File name without directories, for report prefixes
    pub fn file_stem(&self) -> String {
        std::path::Path::new(&self.path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document")
            .to_string()
    }
}
