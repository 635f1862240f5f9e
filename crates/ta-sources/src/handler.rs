//! Extractor trait and registry

use std::path::Path;

use async_trait::async_trait;
use ta_core::{Error, Result, SourceDocument};

use crate::pdf::PdfExtractor;
use crate::text::TextExtractor;

/// Limits applied while extracting
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Only the first N pages of a PDF are read
    pub max_pages: Option<usize>,
    pub max_file_size_mb: u64,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_pages: None,
            max_file_size_mb: 50,
        }
    }
}

/// Trait for turning a ticket export into plain text
#[async_trait]
pub trait Extractor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Check if this extractor can handle the given path
    fn can_handle(&self, path: &Path) -> bool;

    async fn extract(&self, path: &Path, options: &ExtractOptions) -> Result<SourceDocument>;
}

pub(crate) fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn Extractor>>,
    options: ExtractOptions,
}

impl ExtractorRegistry {
    /// PDF and plain-text extractors
    pub fn new(options: ExtractOptions) -> Self {
        Self {
            extractors: vec![Box::new(PdfExtractor), Box::new(TextExtractor)],
            options,
        }
    }

    /// First extractor that accepts `path`
    pub fn find(&self, path: &Path) -> Option<&dyn Extractor> {
        self.extractors
            .iter()
            .find(|e| e.can_handle(path))
            .map(|e| e.as_ref())
    }

    pub fn supports(&self, path: &Path) -> bool {
        self.find(path).is_some()
    }

    pub async fn extract(&self, path: &Path) -> Result<SourceDocument> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|_| Error::FileNotFound(path.display().to_string()))?;
        if !metadata.is_file() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }

        const MB: u64 = 1024 * 1024;
        if metadata.len() > self.options.max_file_size_mb.saturating_mul(MB) {
            return Err(Error::FileTooLarge {
                path: path.display().to_string(),
                size_mb: metadata.len().div_ceil(MB),
                limit_mb: self.options.max_file_size_mb,
            });
        }

        let extractor = self
            .find(path)
            .ok_or_else(|| Error::UnsupportedDocument(path.display().to_string()))?;

        tracing::debug!(
            extractor = extractor.name(),
            path = %path.display(),
            bytes = metadata.len(),
            "Extracting document"
        );
        extractor.extract(path, &self.options).await
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new(ExtractOptions::default())
    }
}
