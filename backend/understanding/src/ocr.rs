//! Optical Character Recognition (OCR)
//!
//! Remote transcription of scanned PDFs through Gemini, used when the PDF
//! carries no usable text layer.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use paperforge_core::OcrProvider;

use crate::gemini::{GeminiClient, Part};

pub const OCR_PROMPT: &str = "Transcribe the full text content of this document. \
Do not summarize or add any extra commentary, just return the raw text.";

#[async_trait]
impl OcrProvider for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn transcribe(&self, pdf_path: &Path) -> Result<String> {
        let display_name = pdf_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        info!(file = %display_name, model = %self.model(), "Sending document to Gemini for OCR");

        let bytes = tokio::fs::read(pdf_path)
            .await
            .with_context(|| format!("Failed to read {}", pdf_path.display()))?;
        let (attachment, uploaded) = self.attach(bytes, "application/pdf", &display_name).await?;

        let result = self
            .generate(vec![Part::text(OCR_PROMPT), attachment], None, None)
            .await;

        if let Some(name) = uploaded {
            self.delete_file(&name).await;
        }

        let text = result?;
        info!(chars = text.chars().count(), "Received OCR text from Gemini");
        Ok(text)
    }
}
