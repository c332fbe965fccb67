use std::{
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::fs;

use crate::{
    config::PipelineConfig,
    error::{Error, Result},
    services::BlobStore,
};

/// Blob store backed by a local directory served under `public_base_url`.
pub struct LocalBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), key)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, bytes: Vec<u8>, key: &str) -> Result<String> {
        let relative = checked_key(key)?;
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, bytes).await?;
        Ok(self.url_for(key))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        if !fs::try_exists(&self.root).await? {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        let mut pending = vec![self.root.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                    continue;
                }
                let Ok(relative) = path.strip_prefix(&self.root) else {
                    continue;
                };
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }

        keys.sort();
        Ok(keys.iter().map(|k| self.url_for(k)).collect())
    }
}

fn checked_key(key: &str) -> Result<&Path> {
    let path = Path::new(key);
    let safe = !key.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if !safe {
        return Err(Error::UploadFailed {
            key: key.to_string(),
            reason: "key must be a relative path without '..'".to_string(),
        });
    }
    Ok(path)
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    blobs: Vec<ListedBlob>,
}

#[derive(Debug, Deserialize)]
struct ListedBlob {
    url: String,
}

pub const DEFAULT_BLOB_API_URL: &str = "https://blob.vercel-storage.com";

/// Blob store speaking a bearer-token PUT/GET HTTP API.
pub struct HttpBlobStore {
    api_url: String,
    token: String,
    client: reqwest::Client,
}

impl HttpBlobStore {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            api_url: api_url.into(),
            token: token.into(),
            client,
        }
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn put(&self, bytes: Vec<u8>, key: &str) -> Result<String> {
        checked_key(key)?;
        let response = self
            .client
            .put(format!("{}/{}", self.api_url.trim_end_matches('/'), key))
            .header("Authorization", format!("Bearer {}", self.token))
            .header("x-content-type", "video/mp4")
            .header("x-add-random-suffix", "0")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::UploadFailed {
                key: key.to_string(),
                reason: format!("{status}: {body}"),
            });
        }

        let put: PutResponse = response.json().await?;
        Ok(put.url)
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let listed: ListResponse = self
            .client
            .get(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.token))
            .query(&[("prefix", prefix), ("limit", "1000")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(listed.blobs.into_iter().map(|b| b.url).collect())
    }
}

/// The HTTP blob API when `BLOB_READ_WRITE_TOKEN` is set, a local directory
/// under the scratch root otherwise.
pub fn blob_store_from_env(config: &PipelineConfig, client: reqwest::Client) -> Arc<dyn BlobStore> {
    match std::env::var("BLOB_READ_WRITE_TOKEN") {
        Ok(token) => {
            let api_url =
                std::env::var("BLOB_API_URL").unwrap_or_else(|_| DEFAULT_BLOB_API_URL.to_string());
            Arc::new(HttpBlobStore::new(api_url, token, client))
        }
        Err(_) => {
            let root = config.scratch_root.join("published");
            let base_url = std::env::var("FACTREEL_PUBLIC_BASE_URL")
                .unwrap_or_else(|_| format!("file://{}", root.display()));
            Arc::new(LocalBlobStore::new(root, base_url))
        }
    }
}
