use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Script generation failed: {reason}")]
    ScriptFailed { reason: String },

    #[error("Speech synthesis failed: {reason}")]
    SynthesisFailed { reason: String },

    #[error("Image search failed for '{query}' at offset {offset}: {reason}")]
    SearchFailed {
        query: String,
        offset: u32,
        reason: String,
    },

    #[error("Download failed for {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("No images found for '{subject}'")]
    NoImages { subject: String },

    #[error("Staging failed for {path}: {reason}")]
    StagingFailed { path: PathBuf, reason: String },

    #[error("Duration probe failed for {audio_path}: {reason}")]
    ProbeFailed { audio_path: PathBuf, reason: String },

    #[error("Video encoding failed for {output_path}: {reason}")]
    EncodeFailed { output_path: PathBuf, reason: String },

    #[error("Upload failed for {key}: {reason}")]
    UploadFailed { key: String, reason: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },
}

pub type Result<T> = std::result::Result<T, Error>;
