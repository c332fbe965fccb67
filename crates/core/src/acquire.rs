use std::{collections::HashSet, path::PathBuf};

use tracing::{debug, info, warn};

use crate::{
    error::{Error, Result},
    format::{format_image_name, now_millis},
    services::{ImageDownloader, ImageSearch},
    staging::ScratchDir,
};

/// Bounds on a single acquisition.
#[derive(Debug, Clone, Copy)]
pub struct AcquireLimits {
    pub count: usize,
    pub page_size: u32,
    /// Scanning stops once the 1-based offset reaches this value.
    pub max_offset: u32,
}

/// Download up to `limits.count` images for `subject` into `dir`.
///
/// Pages are scanned from offset 1 until enough images are collected, a page
/// comes back empty, or the offset ceiling is reached. Failed candidates are
/// skipped. Returns paths in download order; fails with [`Error::NoImages`]
/// when nothing at all could be downloaded. A search error is fatal only
/// while nothing has been collected yet.
pub async fn acquire_images(
    search: &dyn ImageSearch,
    downloader: &dyn ImageDownloader,
    subject: &str,
    dir: &ScratchDir,
    limits: AcquireLimits,
) -> Result<Vec<PathBuf>> {
    if limits.count == 0 || limits.page_size == 0 {
        return Err(Error::InvalidConfig {
            reason: "image count and page size must be at least 1".to_string(),
        });
    }

    dir.ensure().await?;

    let run_stamp = now_millis();
    let mut images: Vec<PathBuf> = Vec::with_capacity(limits.count);
    let mut seen: HashSet<String> = HashSet::new();
    let mut offset: u32 = 1;
    let mut seq: usize = 0;

    'pages: while images.len() < limits.count && offset < limits.max_offset {
        let candidates = match search.search(subject, offset, limits.page_size).await {
            Ok(candidates) => candidates,
            // Keep what earlier pages produced.
            Err(e) if !images.is_empty() => {
                warn!(offset, error = %e, "image search failed, keeping partial result");
                break;
            }
            Err(e) => return Err(e),
        };
        debug!(offset, results = candidates.len(), "image search page");

        if candidates.is_empty() {
            break;
        }

        for url in candidates {
            if images.len() >= limits.count {
                break 'pages;
            }
            if !seen.insert(url.clone()) {
                debug!(%url, "skipping duplicate candidate");
                continue;
            }

            seq += 1;
            let dest = dir.join(&format_image_name(run_stamp, seq));
            match downloader.download(&url, &dest).await {
                Ok(()) => images.push(dest),
                Err(e) => warn!(%url, error = %e, "image download failed, skipping"),
            }
        }

        offset = offset.saturating_add(limits.page_size);
    }

    if images.is_empty() {
        return Err(Error::NoImages {
            subject: subject.to_string(),
        });
    }

    if images.len() < limits.count {
        warn!(
            wanted = limits.count,
            got = images.len(),
            "search exhausted before reaching the requested image count"
        );
    }
    info!(images = images.len(), "acquired images");

    Ok(images)
}
