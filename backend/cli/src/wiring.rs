use std::sync::Arc;

use anyhow::Result;

use paperforge_config::{AppConfig, RebuilderMode};
use paperforge_pipeline::Pipeline;
use paperforge_sandbox::{DockerOcrmypdf, NativeOcrmypdf, PdfRebuilder, RebuildTool, WorkspaceMount};
use paperforge_understanding::{DocumentAnalyzer, GeminiClient, PdfToText, TextSelector};

/// Gemini serves both remote OCR and analysis.
pub fn build_pipeline(config: Arc<AppConfig>) -> Result<Pipeline> {
    let gemini = Arc::new(GeminiClient::from_settings(&config.api_key, &config.gemini)?);

    let selector = TextSelector::new(
        Arc::new(PdfToText::new(&config.extraction.pdftotext_bin)),
        gemini.clone(),
        config.extraction.min_text_chars,
    );
    let analyzer = DocumentAnalyzer::new(gemini, config.language);
    let rebuilder = PdfRebuilder::new(rebuild_tool(&config));

    Ok(Pipeline::new(config, selector, analyzer, rebuilder))
}

pub fn rebuild_tool(config: &AppConfig) -> Arc<dyn RebuildTool> {
    match config.rebuilder.mode {
        RebuilderMode::Docker => Arc::new(DockerOcrmypdf::new(
            &config.rebuilder.image,
            WorkspaceMount::new(&config.host_working_dir, &config.folders.working),
        )),
        RebuilderMode::Native => Arc::new(NativeOcrmypdf::new(&config.rebuilder.binary)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    async fn config(pairs: &[(&str, &str)]) -> AppConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        paperforge_config::load_with(&env, None).await.unwrap()
    }

    #[tokio::test]
    async fn rebuilder_follows_configured_mode() {
        let docker = config(&[("GEMINI_API_KEY", "k")]).await;
        assert_eq!(rebuild_tool(&docker).name(), "docker-ocrmypdf");

        let native = config(&[("GEMINI_API_KEY", "k"), ("PAPERFORGE_REBUILDER", "native")]).await;
        assert_eq!(rebuild_tool(&native).name(), "ocrmypdf");
    }

    #[tokio::test]
    async fn pipeline_builds_without_network() {
        let cfg = config(&[("GEMINI_API_KEY", "k"), ("OUTPUT_LANGUAGE", "french")]).await;
        let pipeline = build_pipeline(Arc::new(cfg)).unwrap();
        assert_eq!(pipeline.config().language.as_str(), "french");
    }
}
