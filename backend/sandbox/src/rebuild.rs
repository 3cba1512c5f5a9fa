//! In-place PDF rebuild: re-OCR to PDF/A and embed document info.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::anyhow;
use tracing::{error, info, warn};

use paperforge_core::{NormalizedMetadata, PaperError};

use crate::tool::{RebuildInvocation, RebuildTool};

/// `<dir>/<name>.txt`, the recognized-text sidecar next to a working file.
pub fn sidecar_path(working_path: &Path) -> Option<PathBuf> {
    let name = working_path.file_name()?.to_string_lossy();
    Some(working_path.with_file_name(format!("{name}.txt")))
}

/// `<dir>/processed_<name>`, where the tool writes its output.
pub fn output_path(working_path: &Path) -> Option<PathBuf> {
    let name = working_path.file_name()?.to_string_lossy();
    Some(working_path.with_file_name(format!("processed_{name}")))
}

pub struct PdfRebuilder {
    tool: Arc<dyn RebuildTool>,
}

impl PdfRebuilder {
    pub fn new(tool: Arc<dyn RebuildTool>) -> Self {
        Self { tool }
    }

    /// Replace the file at `working_path` with a rebuilt, metadata-embedded
    /// version. The path is unchanged on success.
    ///
    /// On a failed run the partial output is removed; the working file and
    /// sidecar stay in place for the caller to relocate.
    pub async fn rebuild(
        &self,
        working_path: &Path,
        ocr_text: &str,
        metadata: &NormalizedMetadata,
    ) -> Result<(), PaperError> {
        let (Some(sidecar), Some(output)) = (sidecar_path(working_path), output_path(working_path))
        else {
            return Err(PaperError::Other(anyhow!(
                "working path {} has no file name",
                working_path.display()
            )));
        };

        info!(tool = %self.tool.name(), file = %working_path.display(), "Building final PDF and embedding metadata");
        tokio::fs::write(&sidecar, ocr_text).await?;

        let invocation = RebuildInvocation {
            input: working_path.to_path_buf(),
            output: output.clone(),
            sidecar: sidecar.clone(),
            metadata: metadata.clone(),
        };

        let result = match self.tool.run(&invocation).await {
            Ok(result) => result,
            Err(e) => {
                remove_if_exists(&output).await;
                return Err(PaperError::Rebuild {
                    exit_code: None,
                    stdout: String::new(),
                    stderr: format!("{e:#}"),
                });
            }
        };

        if !result.success() {
            error!(
                exit_code = ?result.exit_code,
                stdout = %result.stdout.trim(),
                stderr = %result.stderr.trim(),
                "PDF rebuild failed"
            );
            remove_if_exists(&output).await;
            return Err(PaperError::Rebuild {
                exit_code: result.exit_code,
                stdout: result.stdout,
                stderr: result.stderr,
            });
        }

        if !tokio::fs::try_exists(&output).await.unwrap_or(false) {
            return Err(PaperError::Rebuild {
                exit_code: result.exit_code,
                stdout: result.stdout,
                stderr: format!("no output written to {}", output.display()),
            });
        }

        tokio::fs::remove_file(&sidecar).await?;
        tokio::fs::remove_file(working_path).await?;
        tokio::fs::rename(&output, working_path).await?;
        info!(file = %working_path.display(), "Final PDF created");
        Ok(())
    }
}

async fn remove_if_exists(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => info!(file = %path.display(), "Removed partial rebuild output"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(file = %path.display(), error = %e, "Failed to remove partial rebuild output"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::ToolOutput;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Writes a fixed payload to the output path, or fails like OCRmyPDF.
    struct FakeTool {
        exit_code: Option<i32>,
        write_output: bool,
        seen: Mutex<Vec<RebuildInvocation>>,
    }

    impl FakeTool {
        fn new(exit_code: Option<i32>, write_output: bool) -> Arc<Self> {
            Arc::new(Self { exit_code, write_output, seen: Mutex::new(Vec::new()) })
        }
    }

    #[async_trait]
    impl RebuildTool for FakeTool {
        fn name(&self) -> &str {
            "fake"
        }

        async fn run(&self, invocation: &RebuildInvocation) -> anyhow::Result<ToolOutput> {
            let sidecar = std::fs::read_to_string(&invocation.sidecar)?;
            assert_eq!(sidecar, "recognized text");
            self.seen.lock().unwrap().push(invocation.clone());
            if self.write_output {
                std::fs::write(&invocation.output, b"%PDF-1.7 rebuilt")?;
            }
            Ok(ToolOutput {
                exit_code: self.exit_code,
                stdout: String::new(),
                stderr: if self.exit_code == Some(0) { String::new() } else { "PriorOcrFoundError".into() },
            })
        }

        async fn check(&self) -> anyhow::Result<String> {
            Ok("fake".into())
        }
    }

    fn metadata() -> NormalizedMetadata {
        NormalizedMetadata {
            title: "Invoice".into(),
            author: "Acme Corp".into(),
            subject: "Acme Corp - Invoice".into(),
            keywords: "billing".into(),
        }
    }

    #[test]
    fn derived_paths_sit_next_to_working_file() {
        let working = Path::new("/docs/tmp/scan.pdf");
        assert_eq!(sidecar_path(working).unwrap(), Path::new("/docs/tmp/scan.pdf.txt"));
        assert_eq!(output_path(working).unwrap(), Path::new("/docs/tmp/processed_scan.pdf"));
    }

    #[tokio::test]
    async fn success_replaces_file_in_place_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let working = dir.path().join("scan.pdf");
        std::fs::write(&working, b"%PDF-1.4 original").unwrap();

        let tool = FakeTool::new(Some(0), true);
        let rebuilder = PdfRebuilder::new(tool.clone());
        rebuilder.rebuild(&working, "recognized text", &metadata()).await.unwrap();

        assert_eq!(std::fs::read(&working).unwrap(), b"%PDF-1.7 rebuilt");
        assert!(!dir.path().join("scan.pdf.txt").exists());
        assert!(!dir.path().join("processed_scan.pdf").exists());
        assert_eq!(tool.seen.lock().unwrap()[0].metadata.title, "Invoice");
    }

    #[tokio::test]
    async fn non_zero_exit_leaves_working_file_and_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let working = dir.path().join("scan.pdf");
        std::fs::write(&working, b"%PDF-1.4 original").unwrap();

        let rebuilder = PdfRebuilder::new(FakeTool::new(Some(6), true));
        let err = rebuilder
            .rebuild(&working, "recognized text", &metadata())
            .await
            .unwrap_err();

        match err {
            PaperError::Rebuild { exit_code, stderr, .. } => {
                assert_eq!(exit_code, Some(6));
                assert!(stderr.contains("PriorOcrFoundError"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(std::fs::read(&working).unwrap(), b"%PDF-1.4 original");
        assert!(dir.path().join("scan.pdf.txt").exists());
        assert!(!dir.path().join("processed_scan.pdf").exists());
    }

    #[tokio::test]
    async fn success_without_output_is_rebuild_error() {
        let dir = tempfile::tempdir().unwrap();
        let working = dir.path().join("scan.pdf");
        std::fs::write(&working, b"%PDF-1.4 original").unwrap();

        let rebuilder = PdfRebuilder::new(FakeTool::new(Some(0), false));
        let err = rebuilder
            .rebuild(&working, "recognized text", &metadata())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "rebuild");
        assert!(working.exists());
    }
}
