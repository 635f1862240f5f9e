use std::path::Path;

use async_trait::async_trait;
use ta_core::{Error, Result, SourceDocument};

use crate::handler::{has_extension, ExtractOptions, Extractor};

/// Plain-text ticket exports (.txt, .md, .log)
pub struct TextExtractor;

#[async_trait]
impl Extractor for TextExtractor {
    fn name(&self) -> &'static str {
        "text"
    }

    fn can_handle(&self, path: &Path) -> bool {
        has_extension(path, &["txt", "md", "log"])
    }

    async fn extract(&self, path: &Path, _options: &ExtractOptions) -> Result<SourceDocument> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            Error::Extraction(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(path = %path.display(), "File is not valid UTF-8, replacing invalid bytes");
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };

        Ok(SourceDocument::new(path.display().to_string(), text, 1))
    }
}
