//! PDF text extraction.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::MediaError;

/// Source of per-page text for a document.
pub trait PageSource: Send + Sync {
    /// Open `path` and return each page's text in page order.
    ///
    /// `None` marks a page whose text could not be extracted. Fails only when
    /// the document itself cannot be opened.
    fn page_texts(&self, path: &Path) -> Result<Vec<Option<String>>, MediaError>;
}

/// `PageSource` backed by `lopdf`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfSource;

impl PageSource for LopdfSource {
    fn page_texts(&self, path: &Path) -> Result<Vec<Option<String>>, MediaError> {
        let document = lopdf::Document::load(path)
            .map_err(|e| MediaError::UnreadableDocument(format!("{}: {}", path.display(), e)))?;

        let pages = document
            .get_pages()
            .keys()
            .map(|&number| match document.extract_text(&[number]) {
                Ok(text) => Some(text),
                Err(e) => {
                    tracing::debug!(page = number, error = %e, "Page has no extractable text");
                    None
                }
            })
            .collect();
        Ok(pages)
    }
}

/// Concatenates the text of every page of a document.
#[derive(Clone)]
pub struct PdfExtractor {
    source: Arc<dyn PageSource>,
}

impl PdfExtractor {
    pub fn new(source: Arc<dyn PageSource>) -> Self {
        Self { source }
    }

    /// Page-order concatenation of all page text.
    pub async fn extract(&self, path: PathBuf) -> Result<String, MediaError> {
        let source = Arc::clone(&self.source);
        let pages = tokio::task::spawn_blocking(move || source.page_texts(&path))
            .await
            .map_err(|e| MediaError::UnreadableDocument(format!("extraction task failed: {}", e)))??;

        tracing::info!(pages = pages.len(), "Extracted PDF text");
        Ok(pages.into_iter().map(Option::unwrap_or_default).collect())
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new(Arc::new(LopdfSource))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    struct FixedPages(Vec<Option<&'static str>>);

    impl PageSource for FixedPages {
        fn page_texts(&self, _path: &Path) -> Result<Vec<Option<String>>, MediaError> {
            Ok(self.0.iter().map(|p| p.map(str::to_string)).collect())
        }
    }

    #[tokio::test]
    async fn test_pages_concatenate_in_order() {
        let extractor = PdfExtractor::new(Arc::new(FixedPages(vec![
            Some("a"),
            Some(""),
            Some("c"),
        ])));
        let text = extractor.extract(PathBuf::from("doc.pdf")).await.unwrap();
        assert_eq!(text, "ac");
    }

    #[tokio::test]
    async fn test_failed_page_contributes_nothing() {
        let extractor =
            PdfExtractor::new(Arc::new(FixedPages(vec![Some("first "), None, Some("last")])));
        let text = extractor.extract(PathBuf::from("doc.pdf")).await.unwrap();
        assert_eq!(text, "first last");
    }

    #[tokio::test]
    async fn test_garbage_file_is_unreadable() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"this is not a pdf").unwrap();

        let err = PdfExtractor::default()
            .extract(file.path().to_path_buf())
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::UnreadableDocument(_)));
    }

    #[tokio::test]
    async fn test_missing_file_is_unreadable() {
        let err = PdfExtractor::default()
            .extract(PathBuf::from("/nonexistent/report.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::UnreadableDocument(_)));
    }
}
