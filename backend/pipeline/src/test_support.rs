//! Shared fixtures: a temp folder layout and a pipeline wired to mocks.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use paperforge_config::AppConfig;
use paperforge_sandbox::{PdfRebuilder, RebuildInvocation, RebuildTool, ToolOutput};
use paperforge_understanding::mock::{MockLlmProvider, MockOcrProvider, MockTextExtractor};
use paperforge_understanding::{DocumentAnalyzer, TextSelector};

use crate::orchestrator::Pipeline;

pub const LOCAL_TEXT: &str = "ACME CORP\nInvoice #2024-118\nDate: March 1, 2024\nTotal due: $1,250.00";
pub const ACME_RESPONSE: &str = r#"{"doc_date":"2024-03-01","sender":"Acme Corp","doc_type":"Invoice","tags":["billing","q1"],"new_filename":"x"}"#;

/// Copies input to output, or exits non-zero.
pub struct CopyTool {
    pub exit_code: i32,
}

#[async_trait]
impl RebuildTool for CopyTool {
    fn name(&self) -> &str {
        "copy"
    }

    async fn run(&self, invocation: &RebuildInvocation) -> anyhow::Result<ToolOutput> {
        if self.exit_code == 0 {
            std::fs::copy(&invocation.input, &invocation.output)?;
        }
        Ok(ToolOutput {
            exit_code: Some(self.exit_code),
            stdout: String::new(),
            stderr: if self.exit_code == 0 { String::new() } else { "ocrmypdf: error".into() },
        })
    }

    async fn check(&self) -> anyhow::Result<String> {
        Ok("copy".into())
    }
}

pub struct Fixture {
    _dir: tempfile::TempDir,
    pub config: Arc<AppConfig>,
}

pub async fn fixture(language: &str) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let env: HashMap<String, String> = [
        ("GEMINI_API_KEY", "AIza-test".to_string()),
        ("OUTPUT_LANGUAGE", language.to_string()),
        ("PAPERFORGE_INBOX", root.join("inbox").display().to_string()),
        ("PAPERFORGE_PROCESSED", root.join("processed").display().to_string()),
        ("PAPERFORGE_ERROR", root.join("error").display().to_string()),
        ("PAPERFORGE_WORKING", root.join("tmp").display().to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    let config = paperforge_config::load_with(&env, None).await.unwrap();
    crate::fs_ops::ensure_folders(&config.folders).await.unwrap();
    Fixture {
        _dir: dir,
        config: Arc::new(config),
    }
}

pub fn pipeline(fx: &Fixture, llm: Arc<MockLlmProvider>, tool_exit: i32) -> Pipeline {
    let selector = TextSelector::new(
        Arc::new(MockTextExtractor::with_text(LOCAL_TEXT)),
        Arc::new(MockOcrProvider::with_text("unused")),
        fx.config.extraction.min_text_chars,
    );
    let analyzer = DocumentAnalyzer::new(llm, fx.config.language);
    let rebuilder = PdfRebuilder::new(Arc::new(CopyTool { exit_code: tool_exit }));
    Pipeline::new(fx.config.clone(), selector, analyzer, rebuilder)
        .with_clock(|| NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
}

pub fn drop_in_inbox(fx: &Fixture, name: &str) -> PathBuf {
    let path = fx.config.folders.inbox.join(name);
    std::fs::write(&path, b"%PDF-1.4 scan").unwrap();
    path
}

pub fn dir_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
