//! OCRmyPDF in a throwaway Docker container.
//!
//! The working directory is bind-mounted at the same path it has inside the
//! pipeline's own filesystem, so working paths are passed to the container
//! unchanged. When the pipeline itself runs in a container, `host` is the
//! host-side path of that same directory.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use async_trait::async_trait;
use tracing::info;

use crate::tool::{RebuildInvocation, RebuildTool, ToolOutput, run_command};

/// Host ↔ container path mapping for the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceMount {
    pub host: PathBuf,
    pub container: PathBuf,
}

impl WorkspaceMount {
    pub fn new(host: impl Into<PathBuf>, container: impl Into<PathBuf>) -> Self {
        Self {
            host: host.into(),
            container: container.into(),
        }
    }

    /// `-v` argument value.
    pub fn volume_arg(&self) -> String {
        format!("{}:{}", self.host.display(), self.container.display())
    }

    /// Whether a pipeline-side path is visible inside the container.
    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.container)
    }
}

pub struct DockerOcrmypdf {
    image: String,
    mount: WorkspaceMount,
}

impl DockerOcrmypdf {
    pub fn new(image: impl Into<String>, mount: WorkspaceMount) -> Self {
        Self {
            image: image.into(),
            mount,
        }
    }

    pub fn command_args(&self, invocation: &RebuildInvocation) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            "--rm".to_string(),
            "-v".to_string(),
            self.mount.volume_arg(),
            self.image.clone(),
        ];
        args.extend(invocation.ocrmypdf_args());
        args
    }
}

#[async_trait]
impl RebuildTool for DockerOcrmypdf {
    fn name(&self) -> &str {
        "docker-ocrmypdf"
    }

    async fn run(&self, invocation: &RebuildInvocation) -> Result<ToolOutput> {
        for path in [&invocation.input, &invocation.output, &invocation.sidecar] {
            if !self.mount.contains(path) {
                bail!(
                    "Path {} is outside the mounted working directory {}",
                    path.display(),
                    self.mount.container.display()
                );
            }
        }

        info!(image = %self.image, mount = %self.mount.volume_arg(), "Starting OCRmyPDF container");
        run_command("docker", &self.command_args(invocation)).await
    }

    async fn check(&self) -> Result<String> {
        let args = vec![
            "image".to_string(),
            "inspect".to_string(),
            "--format".to_string(),
            "{{.Id}}".to_string(),
            self.image.clone(),
        ];
        let output = run_command("docker", &args).await?;
        if !output.success() {
            bail!(
                "docker image {} not available: {}",
                self.image,
                output.stderr.trim()
            );
        }
        let id = output.stdout.trim();
        if id.is_empty() {
            bail!("docker image inspect returned no id for {}", self.image);
        }
        Ok(format!("{} ({id})", self.image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperforge_core::NormalizedMetadata;

    fn invocation(root: &str) -> RebuildInvocation {
        RebuildInvocation {
            input: PathBuf::from(format!("{root}/scan.pdf")),
            output: PathBuf::from(format!("{root}/processed_scan.pdf")),
            sidecar: PathBuf::from(format!("{root}/scan.pdf.txt")),
            metadata: NormalizedMetadata {
                title: "Facture".into(),
                author: "Bell".into(),
                subject: "Bell - Facture".into(),
                keywords: "".into(),
            },
        }
    }

    #[test]
    fn command_mounts_working_dir_before_image() {
        let tool = DockerOcrmypdf::new(
            "jbarlow83/ocrmypdf",
            WorkspaceMount::new("/srv/paperforge/tmp", "/docs/tmp"),
        );
        let args = tool.command_args(&invocation("/docs/tmp"));
        assert_eq!(
            &args[..5],
            ["run", "--rm", "-v", "/srv/paperforge/tmp:/docs/tmp", "jbarlow83/ocrmypdf"]
        );
        assert_eq!(args[5], "--output-type");
        assert_eq!(args.last().map(String::as_str), Some("/docs/tmp/processed_scan.pdf"));
    }

    #[test]
    fn mount_containment_is_component_wise() {
        let mount = WorkspaceMount::new("/host", "/docs/tmp");
        assert!(mount.contains(Path::new("/docs/tmp/a.pdf")));
        assert!(!mount.contains(Path::new("/docs/tmpfoo/a.pdf")));
        assert!(!mount.contains(Path::new("/docs/inbox/a.pdf")));
    }

    #[tokio::test]
    async fn paths_outside_mount_are_rejected_before_launch() {
        let tool = DockerOcrmypdf::new("img", WorkspaceMount::new("/host", "/docs/tmp"));
        let err = tool.run(&invocation("/elsewhere")).await.unwrap_err();
        assert!(err.to_string().contains("outside the mounted working directory"));
    }
}
