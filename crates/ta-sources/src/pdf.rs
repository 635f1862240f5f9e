use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lopdf::Document;
use ta_core::{Error, Result, SourceDocument};

use crate::handler::{has_extension, ExtractOptions, Extractor};

/// Page-by-page PDF text extraction
pub struct PdfExtractor;

#[async_trait]
impl Extractor for PdfExtractor {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn can_handle(&self, path: &Path) -> bool {
        has_extension(path, &["pdf"])
    }

    async fn extract(&self, path: &Path, options: &ExtractOptions) -> Result<SourceDocument> {
        let owned: PathBuf = path.to_path_buf();
        let max_pages = options.max_pages;

        // lopdf is synchronous and CPU-bound
        let (text, pages) = tokio::task::spawn_blocking(move || read_pages(&owned, max_pages))
            .await
            .map_err(|e| Error::Other(e.into()))??;

        Ok(SourceDocument::new(path.display().to_string(), text, pages))
    }
}

/// Returns the joined text of non-empty pages and the number of pages read
fn read_pages(path: &Path, max_pages: Option<usize>) -> Result<(String, usize)> {
    let document = Document::load(path).map_err(|e| {
        Error::Extraction(format!("Failed to open PDF {}: {}", path.display(), e))
    })?;

    let numbers: Vec<u32> = document
        .get_pages()
        .into_keys()
        .take(max_pages.unwrap_or(usize::MAX))
        .collect();

    let mut chunks = Vec::with_capacity(numbers.len());
    for number in &numbers {
        match document.extract_text(&[*number]) {
            Ok(text) if !text.trim().is_empty() => chunks.push(text),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), page = number, error = %e, "Skipping unreadable page");
            }
        }
    }

    tracing::debug!(
        path = %path.display(),
        pages = numbers.len(),
        with_text = chunks.len(),
        "PDF extracted"
    );
    Ok((chunks.join("\n"), numbers.len()))
}
