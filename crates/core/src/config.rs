use std::{path::PathBuf, str::FromStr, time::Duration};

use crate::error::{Error, Result};

pub const DEFAULT_IMAGE_COUNT: usize = 10;
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_MAX_OFFSET: u32 = 100;
pub const DEFAULT_FALLBACK_DURATION: f64 = 30.0;

/// Tunables for one pipeline run.
///
/// Defaults match the observed behavior; every field can be overridden
/// through `FACTREEL_*` environment variables.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub image_count: usize,
    pub page_size: u32,
    pub max_offset: u32,
    pub fallback_duration: f64,
    pub width: u32,
    pub height: u32,
    pub voice: String,
    pub http_timeout: Duration,
    pub scratch_root: PathBuf,
    pub output_dir: PathBuf,
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let scratch_root = get_root_cache_dir();
        Self {
            image_count: DEFAULT_IMAGE_COUNT,
            page_size: DEFAULT_PAGE_SIZE,
            max_offset: DEFAULT_MAX_OFFSET,
            fallback_duration: DEFAULT_FALLBACK_DURATION,
            width: 1280,
            height: 720,
            voice: "alloy".to_string(),
            http_timeout: Duration::from_secs(60),
            output_dir: scratch_root.join("output"),
            scratch_root,
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

impl PipelineConfig {
    /// Build a config from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup, starting from defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = parse_var(&lookup, "FACTREEL_IMAGE_COUNT")? {
            config.image_count = v;
        }
        if let Some(v) = parse_var(&lookup, "FACTREEL_PAGE_SIZE")? {
            config.page_size = v;
        }
        if let Some(v) = parse_var(&lookup, "FACTREEL_MAX_OFFSET")? {
            config.max_offset = v;
        }
        if let Some(v) = parse_var(&lookup, "FACTREEL_FALLBACK_DURATION")? {
            config.fallback_duration = v;
        }
        if let Some(v) = parse_var::<u64, _>(&lookup, "FACTREEL_HTTP_TIMEOUT_SECS")? {
            config.http_timeout = Duration::from_secs(v);
        }
        if let Some(v) = lookup("FACTREEL_VOICE") {
            config.voice = v;
        }
        if let Some(v) = lookup("FACTREEL_SCRATCH_DIR") {
            config.scratch_root = PathBuf::from(v);
            config.output_dir = config.scratch_root.join("output");
        }
        if let Some(v) = lookup("FACTREEL_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("FFMPEG_PATH") {
            config.ffmpeg = PathBuf::from(v);
        }
        if let Some(v) = lookup("FFPROBE_PATH") {
            config.ffprobe = PathBuf::from(v);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.image_count == 0 {
            return Err(invalid("image_count must be at least 1"));
        }
        if self.page_size == 0 {
            return Err(invalid("page_size must be at least 1"));
        }
        if !(self.fallback_duration.is_finite() && self.fallback_duration > 0.0) {
            return Err(invalid("fallback_duration must be a positive number"));
        }
        if self.width == 0 || self.height == 0 {
            return Err(invalid("output geometry must be non-zero"));
        }
        Ok(())
    }

    /// Scratch directory owned by a single run.
    pub fn run_dir(&self, run_id: &uuid::Uuid) -> PathBuf {
        self.scratch_root.join("runs").join(run_id.to_string())
    }
}

/// Shared HTTP client carrying the per-request timeout.
pub fn http_client(config: &PipelineConfig) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()?)
}

pub fn get_root_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("factreel")
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| invalid(&format!("{key} has malformed value '{raw}'"))),
    }
}

fn invalid(reason: &str) -> Error {
    Error::InvalidConfig {
        reason: reason.to_string(),
    }
}
