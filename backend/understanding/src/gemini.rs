//! Gemini `generateContent` client.
//!
//! Serves both the analysis path (text prompt) and remote OCR (PDF attached
//! as inline data, or through the Files API when too large to inline).

use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use paperforge_config::GeminiSettings;
use paperforge_core::{LlmProvider, LlmRequest, LlmResponse};

/// Limit on the whole `generateContent` request body.
pub const MAX_INLINE_BYTES: usize = 20 * 1024 * 1024;

/// Room left in the request for the prompt and JSON framing.
const REQUEST_OVERHEAD_BYTES: usize = 64 * 1024;

/// Whether a file of `len` raw bytes, once base64 encoded, still fits in a
/// single request.
fn fits_inline(len: usize) -> bool {
    base64::encoded_len(len, true)
        .is_some_and(|encoded| encoded + REQUEST_OVERHEAD_BYTES <= MAX_INLINE_BYTES)
}

pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }

    pub fn from_settings(api_key: &str, settings: &GeminiSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            model: settings.model.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run one `generateContent` call and return the concatenated text parts.
    pub(crate) async fn generate(
        &self,
        parts: Vec<Part>,
        system_prompt: Option<&str>,
        temperature: Option<f32>,
    ) -> Result<String> {
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            system_instruction: system_prompt
                .filter(|s| !s.is_empty())
                .map(|s| SystemInstruction {
                    parts: vec![Part::text(s)],
                }),
            generation_config: temperature.map(|t| GenerationConfig { temperature: t }),
        };

        debug!(model = %self.model, "Sending request to Gemini");

        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Gemini HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            bail!("Gemini returned {}: {}", status, error_body);
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .context("Failed to parse Gemini response")?;

        let Some(candidate) = parsed.candidates.into_iter().next() else {
            let reason = parsed
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            bail!("Gemini returned no content: {reason}");
        };

        Ok(candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default())
    }

    /// Attach a file, inline when small enough, otherwise via an upload that
    /// the caller must release with [`GeminiClient::delete_file`].
    pub(crate) async fn attach(
        &self,
        bytes: Vec<u8>,
        mime_type: &str,
        display_name: &str,
    ) -> Result<(Part, Option<String>)> {
        if fits_inline(bytes.len()) {
            return Ok((Part::inline(mime_type, STANDARD.encode(&bytes)), None));
        }

        info!(
            bytes = bytes.len(),
            file = %display_name,
            "File too large to inline; uploading to Gemini Files API"
        );
        let uploaded = self.upload_file(bytes, mime_type).await?;
        let part = Part::file(&uploaded.mime_type, &uploaded.uri);
        Ok((part, Some(uploaded.name)))
    }

    async fn upload_file(&self, bytes: Vec<u8>, mime_type: &str) -> Result<UploadedFile> {
        let response = self
            .client
            .post(format!("{}/files?uploadType=media", self.upload_base()))
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", mime_type)
            .body(bytes)
            .send()
            .await
            .context("Gemini file upload failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            bail!("Gemini file upload returned {}: {}", status, error_body);
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .context("Failed to parse Gemini upload response")?;
        Ok(parsed.file)
    }

    /// Remove an uploaded file. Failures are logged, not returned.
    pub(crate) async fn delete_file(&self, name: &str) {
        let result = self
            .client
            .delete(format!("{}/{}", self.base_url, name))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await;
        match result {
            Ok(resp) if resp.status().is_success() => {
                info!(file = %name, "Deleted uploaded file from Gemini")
            }
            Ok(resp) => warn!(file = %name, status = %resp.status(), "Failed to delete uploaded file"),
            Err(e) => warn!(file = %name, error = %e, "Failed to delete uploaded file"),
        }
    }

    /// Fetch the model descriptor; proves the key and model name are accepted.
    pub async fn check_model(&self) -> Result<String> {
        let response = self
            .client
            .get(format!("{}/models/{}", self.base_url, self.model))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .context("Gemini HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            bail!("Gemini returned {}: {}", status, error_body);
        }

        let model: ModelInfo = response
            .json()
            .await
            .context("Failed to parse Gemini model info")?;
        Ok(model.display_name.unwrap_or(model.name))
    }

    /// `https://host/v1beta` -> `https://host/upload/v1beta`
    fn upload_base(&self) -> String {
        match self.base_url.rsplit_once('/') {
            Some((origin, version)) => format!("{origin}/upload/{version}"),
            None => format!("{}/upload", self.base_url),
        }
    }
}

#[async_trait]
impl LlmProvider for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let start = Instant::now();
        let content = self
            .generate(
                vec![Part::text(&request.user_prompt)],
                Some(&request.system_prompt),
                request.temperature,
            )
            .await?;

        Ok(LlmResponse {
            content,
            provider: "gemini".to_string(),
            model: self.model.clone(),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_data: Option<FileData>,
}

impl Part {
    pub(crate) fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            inline_data: None,
            file_data: None,
        }
    }

    fn inline(mime_type: &str, data: String) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.to_string(),
                data,
            }),
            file_data: None,
        }
    }

    fn file(mime_type: &str, uri: &str) -> Self {
        Self {
            text: None,
            inline_data: None,
            file_data: Some(FileData {
                mime_type: mime_type.to_string(),
                file_uri: uri.to_string(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileData {
    mime_type: String,
    file_uri: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelInfo {
    name: String,
    display_name: Option<String>,
}

#[derive(Deserialize)]
struct UploadResponse {
    file: UploadedFile,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadedFile {
    name: String,
    uri: String,
    mime_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_in_gemini_shape() {
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user".into(),
                parts: vec![Part::text("hi"), Part::inline("application/pdf", "AAAA".into())],
            }],
            system_instruction: None,
            generation_config: Some(GenerationConfig { temperature: 0.5 }),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(
            json["contents"][0]["parts"][1]["inlineData"]["mimeType"],
            "application/pdf"
        );
        assert_eq!(json["generationConfig"]["temperature"], 0.5);
        assert!(json.get("systemInstruction").is_none());
    }

    #[test]
    fn response_text_parts_parse() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"world"}]}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        let text: String = parsed.candidates[0]
            .content
            .as_ref()
            .unwrap()
            .parts
            .iter()
            .filter_map(|p| p.text.clone())
            .collect();
        assert_eq!(text, "Hello world");
    }

    #[test]
    fn blocked_response_has_feedback() {
        let raw = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.candidates.is_empty());
        assert_eq!(parsed.prompt_feedback.unwrap().block_reason.as_deref(), Some("SAFETY"));
    }

    #[test]
    fn inline_limit_counts_encoded_size() {
        assert!(fits_inline(1024 * 1024));
        assert!(fits_inline(14 * 1024 * 1024));
        assert!(!fits_inline(16 * 1024 * 1024));
        assert!(!fits_inline(MAX_INLINE_BYTES));
    }

    #[tokio::test]
    async fn sixteen_mib_pdf_takes_upload_path() {
        // Nothing listens here, so reaching the upload surfaces as an error.
        let client = GeminiClient::new("k", "m").with_base_url("http://127.0.0.1:9/v1beta");
        let err = client
            .attach(vec![0u8; 16 * 1024 * 1024], "application/pdf", "big.pdf")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("upload"));

        let (part, uploaded) = client
            .attach(vec![0u8; 1024], "application/pdf", "small.pdf")
            .await
            .unwrap();
        assert!(uploaded.is_none());
        assert!(serde_json::to_value(&part).unwrap().get("inlineData").is_some());
    }

    #[test]
    fn upload_base_inserts_upload_segment() {
        let client = GeminiClient::new("k", "m");
        assert_eq!(
            client.upload_base(),
            "https://generativelanguage.googleapis.com/upload/v1beta"
        );
        let local = GeminiClient::new("k", "m").with_base_url("http://127.0.0.1:8080/v1beta/");
        assert_eq!(local.upload_base(), "http://127.0.0.1:8080/upload/v1beta");
    }
}
