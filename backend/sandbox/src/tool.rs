//! External rebuild tool abstraction.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use paperforge_core::NormalizedMetadata;

/// One rebuild request: read `input`, write `output`, emit recognized text
/// into `sidecar`, embed `metadata` as document info.
#[derive(Debug, Clone)]
pub struct RebuildInvocation {
    pub input: PathBuf,
    pub output: PathBuf,
    pub sidecar: PathBuf,
    pub metadata: NormalizedMetadata,
}

impl RebuildInvocation {
    /// OCRmyPDF arguments shared by every launcher.
    pub fn ocrmypdf_args(&self) -> Vec<String> {
        vec![
            "--output-type".to_string(),
            "pdfa".to_string(),
            "--redo-ocr".to_string(),
            "--title".to_string(),
            self.metadata.title.clone(),
            "--author".to_string(),
            self.metadata.author.clone(),
            "--subject".to_string(),
            self.metadata.subject.clone(),
            "--keywords".to_string(),
            self.metadata.keywords.clone(),
            "--sidecar".to_string(),
            self.sidecar.to_string_lossy().into_owned(),
            self.input.to_string_lossy().into_owned(),
            self.output.to_string_lossy().into_owned(),
        ]
    }
}

/// Captured result of a finished tool process.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[async_trait]
pub trait RebuildTool: Send + Sync {
    fn name(&self) -> &str;

    /// Run the tool to completion. `Err` only when the process could not be
    /// launched; a non-zero exit is reported through [`ToolOutput`].
    async fn run(&self, invocation: &RebuildInvocation) -> Result<ToolOutput>;

    /// Probe that the tool is installed and reachable.
    async fn check(&self) -> Result<String>;
}

/// Spawn `program args..` and capture its output.
pub async fn run_command(program: &str, args: &[String]) -> Result<ToolOutput> {
    debug!(program = %program, args = ?args, "Running external tool");
    let output = tokio::process::Command::new(program)
        .args(args)
        .output()
        .await
        .with_context(|| format!("Failed to run {program}"))?;

    Ok(ToolOutput {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}
