use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

/// Trait for language-model providers used by the document analyzer.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., "gemini", "mock").
    fn name(&self) -> &str;

    /// Send a completion request and return the response text.
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse>;
}

/// Request to an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    /// `None` keeps the provider's default sampling temperature.
    pub temperature: Option<f32>,
}

/// Response from an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub latency_ms: u64,
}

/// Remote OCR: transcribe the full text of a PDF.
#[async_trait]
pub trait OcrProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Returns the transcription as received, possibly empty.
    async fn transcribe(&self, pdf_path: &Path) -> Result<String>;
}

/// Local text extraction from a PDF's embedded text layer.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    fn name(&self) -> &str;

    /// Returns the raw extracted text. Errors when the tool fails to run or
    /// exits unsuccessfully.
    async fn extract(&self, pdf_path: &Path) -> Result<String>;
}
