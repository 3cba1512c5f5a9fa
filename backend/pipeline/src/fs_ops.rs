use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use paperforge_config::FolderLayout;

/// Create the inbox, processed, error, and working folders if absent.
pub async fn ensure_folders(folders: &FolderLayout) -> Result<()> {
    for folder in folders.all() {
        if !tokio::fs::try_exists(folder).await.unwrap_or(false) {
            info!(folder = %folder.display(), "Creating directory");
        }
        tokio::fs::create_dir_all(folder)
            .await
            .with_context(|| format!("Failed to create {}", folder.display()))?;
    }
    Ok(())
}

/// Move a file, falling back to copy + remove when a rename is not possible
/// (e.g. inbox and working folder on different mounts). Overwrites `to`.
pub async fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    match tokio::fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(e),
        Err(e) => {
            debug!(
                from = %from.display(),
                to = %to.display(),
                error = %e,
                "Rename failed, copying instead"
            );
            tokio::fs::copy(from, to).await?;
            tokio::fs::remove_file(from).await
        }
    }
}
