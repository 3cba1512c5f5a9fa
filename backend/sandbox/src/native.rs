//! OCRmyPDF installed on the local machine.

use anyhow::{Result, bail};
use async_trait::async_trait;
use tracing::info;

use crate::tool::{RebuildInvocation, RebuildTool, ToolOutput, run_command};

pub struct NativeOcrmypdf {
    binary: String,
}

impl NativeOcrmypdf {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for NativeOcrmypdf {
    fn default() -> Self {
        Self::new("ocrmypdf")
    }
}

#[async_trait]
impl RebuildTool for NativeOcrmypdf {
    fn name(&self) -> &str {
        "ocrmypdf"
    }

    async fn run(&self, invocation: &RebuildInvocation) -> Result<ToolOutput> {
        info!(binary = %self.binary, "Running OCRmyPDF");
        run_command(&self.binary, &invocation.ocrmypdf_args()).await
    }

    async fn check(&self) -> Result<String> {
        let output = run_command(&self.binary, &["--version".to_string()]).await?;
        if !output.success() {
            bail!("{} --version failed: {}", self.binary, output.stderr.trim());
        }
        Ok(format!("{} {}", self.binary, output.stdout.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn check_fails_for_missing_binary() {
        let tool = NativeOcrmypdf::new("/nonexistent/ocrmypdf");
        assert!(tool.check().await.is_err());
    }
}
