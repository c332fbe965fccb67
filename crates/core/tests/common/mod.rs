//! In-process fakes for every collaborator of a run.

#![allow(dead_code)]

use std::{
    collections::HashSet,
    ffi::OsString,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use factreel_core::{
    AudioFormat, BlobStore, Error, ImageDownloader, ImageSearch, MediaTools, PipelineConfig,
    Result, Services, SpeechSynthesizer, TextGenerator,
};
use tempfile::TempDir;

pub struct FakeText {
    pub script: Option<String>,
}

#[async_trait]
impl TextGenerator for FakeText {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        self.script.clone().ok_or_else(|| Error::ScriptFailed {
            reason: "generator unavailable".to_string(),
        })
    }
}

pub struct FakeSpeech;

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    async fn synthesize(&self, text: &str, _voice: &str, _format: AudioFormat) -> Result<Vec<u8>> {
        Ok(format!("ID3 {text}").into_bytes())
    }
}

/// Serves `results` in pages, recording every requested offset and query.
pub struct PagedSearch {
    pub results: Vec<String>,
    /// Requests at or past this offset fail.
    pub fail_from: Option<u32>,
    pub offsets: Mutex<Vec<u32>>,
    pub queries: Mutex<Vec<String>>,
}

impl PagedSearch {
    pub fn new(results: Vec<String>) -> Self {
        Self {
            results,
            fail_from: None,
            offsets: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_from(mut self, offset: u32) -> Self {
        self.fail_from = Some(offset);
        self
    }

    /// `n` distinct candidate URLs.
    pub fn with_urls(n: usize) -> Self {
        Self::new(urls(n))
    }

    /// Pretends the provider never runs out of results.
    pub fn endless() -> Self {
        Self::with_urls(10_000)
    }

    pub fn offsets(&self) -> Vec<u32> {
        self.offsets.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageSearch for PagedSearch {
    async fn search(&self, query: &str, offset: u32, page_size: u32) -> Result<Vec<String>> {
        self.offsets.lock().unwrap().push(offset);
        self.queries.lock().unwrap().push(query.to_string());
        if self.fail_from.is_some_and(|from| offset >= from) {
            return Err(Error::SearchFailed {
                query: query.to_string(),
                offset,
                reason: "503 Service Unavailable".to_string(),
            });
        }
        let start = (offset as usize - 1).min(self.results.len());
        let end = (start + page_size as usize).min(self.results.len());
        Ok(self.results[start..end].to_vec())
    }
}

pub fn urls(n: usize) -> Vec<String> {
    (1..=n)
        .map(|i| format!("https://images.example.com/{i}.jpg"))
        .collect()
}

/// Writes the URL as the file body; fails for URLs in `failing`.
#[derive(Default)]
pub struct FakeDownloader {
    pub fail_all: bool,
    pub failing: HashSet<String>,
    pub attempts: Mutex<Vec<String>>,
}

impl FakeDownloader {
    pub fn failing_all() -> Self {
        Self {
            fail_all: true,
            ..Default::default()
        }
    }

    pub fn failing(urls: &[&str]) -> Self {
        Self {
            failing: urls.iter().map(|u| u.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageDownloader for FakeDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        self.attempts.lock().unwrap().push(url.to_string());
        if self.fail_all || self.failing.contains(url) {
            return Err(Error::DownloadFailed {
                url: url.to_string(),
                reason: "connection reset".to_string(),
            });
        }
        tokio::fs::write(dest, url).await?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryBlobs {
    pub keys: Mutex<Vec<String>>,
}

pub const BLOB_BASE: &str = "https://blob.test";

#[async_trait]
impl BlobStore for MemoryBlobs {
    async fn put(&self, _bytes: Vec<u8>, key: &str) -> Result<String> {
        self.keys.lock().unwrap().push(key.to_string());
        Ok(format!("{BLOB_BASE}/{key}"))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .keys
            .lock()
            .unwrap()
            .iter()
            .filter(|k| k.starts_with(prefix))
            .map(|k| format!("{BLOB_BASE}/{k}"))
            .collect())
    }
}

/// Records encoder invocations and the staged frames each one saw.
#[derive(Default)]
pub struct FakeMedia {
    /// `None` makes the probe fail.
    pub duration: Option<f64>,
    pub fail_encode: bool,
    pub encodes: Mutex<Vec<Vec<String>>>,
    pub staged: Mutex<Vec<Vec<String>>>,
}

impl FakeMedia {
    pub fn probing(duration: f64) -> Self {
        Self {
            duration: Some(duration),
            ..Default::default()
        }
    }

    pub fn encodes(&self) -> Vec<Vec<String>> {
        self.encodes.lock().unwrap().clone()
    }

    pub fn staged(&self) -> Vec<Vec<String>> {
        self.staged.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaTools for FakeMedia {
    async fn probe_duration(&self, path: &Path) -> Result<f64> {
        self.duration.ok_or_else(|| Error::ProbeFailed {
            audio_path: path.to_path_buf(),
            reason: "Invalid data found when processing input".to_string(),
        })
    }

    async fn encode(&self, args: &[OsString], output_path: &Path) -> Result<()> {
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        let pattern = args
            .iter()
            .find(|a| a.ends_with("img%03d.jpg"))
            .expect("image sequence input");
        let staging = Path::new(pattern).parent().unwrap();
        let mut frames: Vec<String> = std::fs::read_dir(staging)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        frames.sort();

        self.staged.lock().unwrap().push(frames);
        self.encodes.lock().unwrap().push(args);

        if self.fail_encode {
            return Err(Error::EncodeFailed {
                output_path: output_path.to_path_buf(),
                reason: "exit status: 1".to_string(),
            });
        }
        tokio::fs::write(output_path, b"mp4").await?;
        Ok(())
    }
}

pub struct Harness {
    pub tmp: TempDir,
    pub search: Arc<PagedSearch>,
    pub downloader: Arc<FakeDownloader>,
    pub blobs: Arc<MemoryBlobs>,
    pub media: Arc<FakeMedia>,
    pub text: Arc<FakeText>,
}

impl Harness {
    pub fn new(search: PagedSearch, downloader: FakeDownloader, media: FakeMedia) -> Self {
        Self {
            tmp: TempDir::new().unwrap(),
            search: Arc::new(search),
            downloader: Arc::new(downloader),
            blobs: Arc::new(MemoryBlobs::default()),
            media: Arc::new(media),
            text: Arc::new(FakeText {
                script: Some("Ada Lovelace wrote the first published algorithm.".to_string()),
            }),
        }
    }

    pub fn config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.scratch_root = self.tmp.path().join("scratch");
        config.output_dir = self.tmp.path().join("output");
        config
    }

    pub fn services(&self) -> Services {
        Services {
            text: self.text.clone(),
            speech: Arc::new(FakeSpeech),
            search: self.search.clone(),
            downloader: self.downloader.clone(),
            blobs: self.blobs.clone(),
            media: self.media.clone(),
        }
    }

    pub fn runs_dir(&self) -> PathBuf {
        self.tmp.path().join("scratch").join("runs")
    }

    /// Files left under the per-run scratch area.
    pub fn leftover_scratch(&self) -> Vec<PathBuf> {
        let runs = self.runs_dir();
        if !runs.exists() {
            return Vec::new();
        }
        std::fs::read_dir(runs)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect()
    }
}
