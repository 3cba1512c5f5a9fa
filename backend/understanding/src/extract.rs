//! Text extraction selection: local text layer first, remote OCR as fallback.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use paperforge_core::{OcrProvider, PaperError, TextExtractor};

/// Where the document text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSource {
    Local,
    RemoteOcr,
}

impl TextSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextSource::Local => "local",
            TextSource::RemoteOcr => "remote_ocr",
        }
    }
}

/// Outcome of the local attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalExtraction {
    Text(String),
    NeedsRemoteOcr,
}

#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub text: String,
    pub source: TextSource,
}

/// Whether locally extracted text is long enough to trust.
pub fn is_sufficient(text: &str, min_chars: usize) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && trimmed.chars().count() > min_chars
}

pub struct TextSelector {
    local: Arc<dyn TextExtractor>,
    ocr: Arc<dyn OcrProvider>,
    min_chars: usize,
}

impl TextSelector {
    pub fn new(local: Arc<dyn TextExtractor>, ocr: Arc<dyn OcrProvider>, min_chars: usize) -> Self {
        Self {
            local,
            ocr,
            min_chars,
        }
    }

    /// Try the local extractor. Tool failures are logged and mapped to
    /// `NeedsRemoteOcr`, never returned.
    pub async fn try_local(&self, pdf_path: &Path) -> LocalExtraction {
        info!(extractor = %self.local.name(), "Attempting local text extraction");
        match self.local.extract(pdf_path).await {
            Ok(text) if is_sufficient(&text, self.min_chars) => {
                info!(chars = text.trim().chars().count(), "Extracted text locally");
                LocalExtraction::Text(text)
            }
            Ok(text) => {
                info!(
                    chars = text.trim().chars().count(),
                    threshold = self.min_chars,
                    "Local text too short; likely a scanned document"
                );
                LocalExtraction::NeedsRemoteOcr
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Local extraction failed, likely an image-only PDF");
                LocalExtraction::NeedsRemoteOcr
            }
        }
    }

    /// Full extraction: local first, then exactly one remote OCR call when needed.
    pub async fn extract(&self, pdf_path: &Path) -> Result<ExtractedText, PaperError> {
        let (text, source) = match self.try_local(pdf_path).await {
            LocalExtraction::Text(text) => (text, TextSource::Local),
            LocalExtraction::NeedsRemoteOcr => {
                info!(provider = %self.ocr.name(), "Falling back to remote OCR");
                let text = self.ocr.transcribe(pdf_path).await.map_err(|e| {
                    PaperError::OcrService {
                        provider: self.ocr.name().to_string(),
                        message: format!("{e:#}"),
                    }
                })?;
                (text, TextSource::RemoteOcr)
            }
        };

        if text.trim().is_empty() {
            return Err(PaperError::EmptyText);
        }
        Ok(ExtractedText { text, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockOcrProvider, MockTextExtractor};

    fn selector(local: &Arc<MockTextExtractor>, ocr: &Arc<MockOcrProvider>) -> TextSelector {
        TextSelector::new(local.clone(), ocr.clone(), 20)
    }

    #[test]
    fn sufficiency_uses_trimmed_char_count() {
        assert!(!is_sufficient("", 20));
        assert!(!is_sufficient("   \n\t ", 20));
        assert!(!is_sufficient(&"a".repeat(20), 20));
        assert!(is_sufficient(&format!("  {}  ", "a".repeat(21)), 20));
        // multi-byte characters count once
        assert!(!is_sufficient(&"é".repeat(15), 20));
    }

    #[tokio::test]
    async fn long_local_text_never_calls_ocr() {
        let local = Arc::new(MockTextExtractor::with_text("Invoice #42 from Acme Corp, total due 100$"));
        let ocr = Arc::new(MockOcrProvider::with_text("should not be used"));
        let result = selector(&local, &ocr).extract(Path::new("a.pdf")).await.unwrap();
        assert_eq!(result.source, TextSource::Local);
        assert!(result.text.starts_with("Invoice #42"));
        assert_eq!(ocr.calls(), 0);
        assert_eq!(local.calls(), 1);
    }

    #[tokio::test]
    async fn short_local_text_falls_back_once_and_keeps_ocr_verbatim() {
        let local = Arc::new(MockTextExtractor::with_text("  page 1  "));
        let ocr = Arc::new(MockOcrProvider::with_text(" ok "));
        let result = selector(&local, &ocr).extract(Path::new("a.pdf")).await.unwrap();
        assert_eq!(result.source, TextSource::RemoteOcr);
        // no minimum length applied to the remote result
        assert_eq!(result.text, " ok ");
        assert_eq!(ocr.calls(), 1);
    }

    #[tokio::test]
    async fn local_tool_failure_falls_back_silently() {
        let local = Arc::new(MockTextExtractor::failing("Syntax Error: Couldn't read xref table"));
        let ocr = Arc::new(MockOcrProvider::with_text("Scanned letter from the bank"));
        let result = selector(&local, &ocr).extract(Path::new("a.pdf")).await.unwrap();
        assert_eq!(result.source, TextSource::RemoteOcr);
        assert_eq!(ocr.calls(), 1);
    }

    #[tokio::test]
    async fn blank_everywhere_is_empty_text_error() {
        let local = Arc::new(MockTextExtractor::with_text(""));
        let ocr = Arc::new(MockOcrProvider::with_text("  \n "));
        let err = selector(&local, &ocr).extract(Path::new("a.pdf")).await.unwrap_err();
        assert!(matches!(err, PaperError::EmptyText));
    }

    #[tokio::test]
    async fn ocr_failure_is_ocr_service_error() {
        let local = Arc::new(MockTextExtractor::with_text(""));
        let ocr = Arc::new(MockOcrProvider::failing("quota exceeded"));
        let err = selector(&local, &ocr).extract(Path::new("a.pdf")).await.unwrap_err();
        match err {
            PaperError::OcrService { provider, message } => {
                assert_eq!(provider, "mock-ocr");
                assert!(message.contains("quota exceeded"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
