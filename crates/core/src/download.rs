use std::path::Path;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::{fs, io::AsyncWriteExt};

use crate::{
    error::{Error, Result},
    services::ImageDownloader,
};

/// Streams candidate images to disk over HTTP.
pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageDownloader for HttpDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let response = self.client.get(url).send().await?.error_for_status()?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        // Frames are staged as .jpg and the encoder picks its decoder from
        // the extension, so anything but JPEG would be misdecoded.
        if !is_jpeg(&content_type) {
            return Err(Error::DownloadFailed {
                url: url.to_string(),
                reason: format!("unsupported content type '{content_type}'"),
            });
        }

        let mut file = fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let written = async {
            while let Some(chunk) = stream.next().await {
                file.write_all(&chunk?).await?;
            }
            file.flush().await?;
            Ok::<_, Error>(())
        }
        .await;
        drop(file);

        // A partially written file must not be picked up as a frame.
        if let Err(e) = written {
            let _ = fs::remove_file(dest).await;
            return Err(Error::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            });
        }

        Ok(())
    }
}

/// `image/jpeg` and its common aliases, ignoring parameters and case.
fn is_jpeg(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    matches!(mime.as_str(), "image/jpeg" | "image/jpg" | "image/pjpeg")
}
