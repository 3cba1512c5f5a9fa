//! Canned providers for tests and dry runs.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use paperforge_core::{LlmProvider, LlmRequest, LlmResponse, OcrProvider, TextExtractor};

/// An LLM provider that returns a fixed response (or a fixed error).
pub struct MockLlmProvider {
    name: String,
    response: Result<String, String>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl MockLlmProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            response: Ok("{}".to_string()),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Ok(response.into());
        self
    }

    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.response = Err(message.into());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok().and_then(|p| p.clone())
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut slot) = self.last_prompt.lock() {
            *slot = Some(request.user_prompt.clone());
        }
        match &self.response {
            Ok(content) => Ok(LlmResponse {
                content: content.clone(),
                provider: self.name.clone(),
                model: "mock".to_string(),
                latency_ms: 0,
            }),
            Err(message) => Err(anyhow!(message.clone())),
        }
    }
}

/// Remote OCR stand-in.
pub struct MockOcrProvider {
    response: Result<String, String>,
    calls: AtomicUsize,
}

impl MockOcrProvider {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            response: Ok(text.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            response: Err(message.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OcrProvider for MockOcrProvider {
    fn name(&self) -> &str {
        "mock-ocr"
    }

    async fn transcribe(&self, _pdf_path: &Path) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone().map_err(|m| anyhow!(m))
    }
}

/// Local extractor stand-in.
pub struct MockTextExtractor {
    response: Result<String, String>,
    calls: AtomicUsize,
}

impl MockTextExtractor {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            response: Ok(text.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            response: Err(message.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextExtractor for MockTextExtractor {
    fn name(&self) -> &str {
        "mock-extractor"
    }

    async fn extract(&self, _pdf_path: &Path) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone().map_err(|m| anyhow!(m))
    }
}
