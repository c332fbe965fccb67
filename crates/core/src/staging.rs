use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    format::format_frame_name,
};

/// A scratch directory whose contents are fully owned by one run.
///
/// All filesystem side effects of acquisition, staging and cleanup go through
/// this type.
#[derive(Debug, Clone)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    pub async fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.path).await?;
        Ok(())
    }

    /// Entries currently in the directory, sorted by name.
    pub async fn list(&self) -> Result<Vec<PathBuf>> {
        let mut entries = fs::read_dir(&self.path).await?;
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            paths.push(entry.path());
        }
        paths.sort();
        Ok(paths)
    }

    /// Delete every entry, keeping the directory itself.
    pub async fn purge(&self) -> Result<usize> {
        let entries = self.list().await?;
        for path in &entries {
            // Symlinks are removed as links, never followed.
            if fs::symlink_metadata(path).await?.is_dir() {
                fs::remove_dir_all(path).await?;
            } else {
                fs::remove_file(path).await?;
            }
        }
        Ok(entries.len())
    }

    /// Copy `source` into the directory under `name`.
    pub async fn copy_in(&self, source: &Path, name: &str) -> Result<PathBuf> {
        let dest = self.join(name);
        fs::copy(source, &dest).await?;
        Ok(dest)
    }

    /// Remove the directory and everything in it. Missing is not an error.
    pub async fn remove(&self) -> Result<()> {
        match fs::remove_dir_all(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Populate `staging` with `imgNNN.jpg` copies of `images`, in order.
///
/// The directory is purged first so no frame from an earlier run survives.
/// Any failure is fatal: a missing frame would break the encoder's input
/// sequence.
pub async fn stage_frames(staging: &ScratchDir, images: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let staging_failed = |path: &Path, e: Error| Error::StagingFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    staging
        .ensure()
        .await
        .map_err(|e| staging_failed(staging.path(), e))?;
    let purged = staging
        .purge()
        .await
        .map_err(|e| staging_failed(staging.path(), e))?;
    if purged > 0 {
        debug!(purged, dir = %staging.path().display(), "purged stale staging entries");
    }

    let mut frames = Vec::with_capacity(images.len());
    for (i, image) in images.iter().enumerate() {
        let frame = staging
            .copy_in(image, &format_frame_name(i + 1))
            .await
            .map_err(|e| staging_failed(image, e))?;
        frames.push(frame);
    }

    info!(frames = frames.len(), dir = %staging.path().display(), "staged frames");
    Ok(frames)
}
