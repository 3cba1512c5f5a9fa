//! Local text extraction with poppler's `pdftotext`.

use std::path::Path;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use paperforge_core::TextExtractor;

pub struct PdfToText {
    binary: String,
}

impl PdfToText {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// First line of `pdftotext -v`, which poppler prints to stderr.
    pub async fn version(&self) -> Result<String> {
        let output = Command::new(&self.binary)
            .arg("-v")
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.binary))?;
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stderr
            .lines()
            .chain(stdout.lines())
            .find(|l| !l.trim().is_empty())
            .unwrap_or("unknown version")
            .trim()
            .to_string())
    }
}

impl Default for PdfToText {
    fn default() -> Self {
        Self::new("pdftotext")
    }
}

#[async_trait]
impl TextExtractor for PdfToText {
    fn name(&self) -> &str {
        "pdftotext"
    }

    /// Runs `pdftotext -layout <file> -` and returns stdout.
    async fn extract(&self, pdf_path: &Path) -> Result<String> {
        debug!(binary = %self.binary, file = %pdf_path.display(), "Running local text extraction");

        let output = Command::new(&self.binary)
            .arg("-layout")
            .arg(pdf_path)
            .arg("-")
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.binary))?;

        if !output.status.success() {
            bail!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary_is_an_error() {
        let extractor = PdfToText::new("paperforge-no-such-binary");
        let err = extractor
            .extract(Path::new("/tmp/none.pdf"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("paperforge-no-such-binary"));
    }
}
