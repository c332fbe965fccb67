//! Seams to the external collaborators of a run.
//!
//! Every collaborator is an explicitly constructed handle passed into the
//! [`Pipeline`](crate::pipeline::Pipeline); tests substitute fakes.

use std::{ffi::OsString, path::Path, sync::Arc};

use async_trait::async_trait;

use crate::{
    blob::blob_store_from_env,
    config::{PipelineConfig, http_client},
    download::HttpDownloader,
    error::Result,
    media::Ffmpeg,
    provider::{ChatCompletions, Provider},
    search::GoogleImageSearch,
    speech::OpenAiSpeech,
};

/// Opaque text-generation service used for the narration script.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Opaque speech-synthesis service returning raw audio bytes.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, voice: &str, format: AudioFormat) -> Result<Vec<u8>>;
}

/// Paginated image search. `offset` is 1-based.
#[async_trait]
pub trait ImageSearch: Send + Sync {
    async fn search(&self, query: &str, offset: u32, page_size: u32) -> Result<Vec<String>>;
}

/// Fetches a single candidate image to `dest`.
#[async_trait]
pub trait ImageDownloader: Send + Sync {
    async fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Durable blob storage for published videos.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `key` and return its public URL.
    async fn put(&self, bytes: Vec<u8>, key: &str) -> Result<String>;

    /// Public URLs of every blob whose key starts with `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

/// External media processes: the duration probe and the encoder.
#[async_trait]
pub trait MediaTools: Send + Sync {
    /// Duration of the media file in seconds, as reported by the probe.
    async fn probe_duration(&self, path: &Path) -> Result<f64>;

    /// Run the encoder once with the given argument list.
    async fn encode(&self, args: &[OsString], output_path: &Path) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
}

impl AudioFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
        }
    }
}

/// The full set of collaborators a [`Pipeline`](crate::pipeline::Pipeline) needs.
#[derive(Clone)]
pub struct Services {
    pub text: Arc<dyn TextGenerator>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub search: Arc<dyn ImageSearch>,
    pub downloader: Arc<dyn ImageDownloader>,
    pub blobs: Arc<dyn BlobStore>,
    pub media: Arc<dyn MediaTools>,
}

impl Services {
    /// Production collaborators, configured from the environment.
    pub fn from_env(config: &PipelineConfig, provider: Provider) -> Result<Self> {
        let client = http_client(config)?;

        let blobs = blob_store_from_env(config, client.clone());

        Ok(Self {
            text: Arc::new(ChatCompletions::new(provider, client.clone())?),
            speech: Arc::new(OpenAiSpeech::new(client.clone())?),
            search: Arc::new(GoogleImageSearch::new(client.clone())?),
            downloader: Arc::new(HttpDownloader::new(client)),
            blobs,
            media: Arc::new(Ffmpeg::new(&config.ffmpeg, &config.ffprobe)),
        })
    }
}
