//! Document analysis: classify extracted text through an LLM provider.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use paperforge_core::{AnalysisResult, LanguageMode, LlmProvider, LlmRequest, PaperError};

use crate::prompt::build_analysis_prompt;

pub struct DocumentAnalyzer {
    provider: Arc<dyn LlmProvider>,
    language: LanguageMode,
}

impl DocumentAnalyzer {
    pub fn new(provider: Arc<dyn LlmProvider>, language: LanguageMode) -> Self {
        Self { provider, language }
    }

    /// Send the text for classification. No retries: provider failures
    /// surface as `AnalysisService`, unusable replies as `MalformedAnalysis`.
    pub async fn analyze(&self, text: &str) -> Result<AnalysisResult, PaperError> {
        info!(
            provider = %self.provider.name(),
            language = %self.language,
            "Sending text for analysis"
        );

        let request = LlmRequest {
            system_prompt: String::new(),
            user_prompt: build_analysis_prompt(self.language, text),
            temperature: None,
        };

        let response = self.provider.complete(&request).await.map_err(|e| {
            PaperError::AnalysisService {
                provider: self.provider.name().to_string(),
                message: format!("{e:#}"),
            }
        })?;

        debug!(
            latency_ms = response.latency_ms,
            raw = %response.content,
            "Raw analysis response"
        );

        let value = extract_json_object(&response.content)?;
        Ok(AnalysisResult::from_json(&value))
    }
}

/// Parse the span from the first `{` to the last `}` (inclusive) as JSON.
pub fn extract_json_object(raw: &str) -> Result<Value, PaperError> {
    let malformed = |reason: String| PaperError::MalformedAnalysis {
        reason,
        raw: raw.to_string(),
    };

    let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) else {
        return Err(malformed("no JSON object found in response".to_string()));
    };
    if end < start {
        return Err(malformed("no JSON object found in response".to_string()));
    }

    let value: Value = serde_json::from_str(&raw[start..=end])
        .map_err(|e| malformed(format!("invalid JSON: {e}")))?;
    if !value.is_object() {
        return Err(malformed("response JSON is not an object".to_string()));
    }
    Ok(value)
}
