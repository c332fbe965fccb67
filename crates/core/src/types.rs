use std::{fmt, path::PathBuf};

use serde::{Deserialize, Serialize};

/// Where a run is. Strictly linear; any failure jumps to `Failed` after cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Scripting,
    Synthesizing,
    Acquiring,
    Staging,
    Probing,
    Composing,
    Publishing,
    Cleanup,
    Done,
    Failed,
}

impl RunState {
    pub fn name(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Scripting => "scripting",
            RunState::Synthesizing => "synthesizing",
            RunState::Acquiring => "acquiring",
            RunState::Staging => "staging",
            RunState::Probing => "probing",
            RunState::Composing => "composing",
            RunState::Publishing => "publishing",
            RunState::Cleanup => "cleanup",
            RunState::Done => "done",
            RunState::Failed => "failed",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The single failure result of a run: which stage failed and why.
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
#[error("{stage} failed: {message}")]
pub struct PipelineFailed {
    pub stage: RunState,
    pub message: String,
    /// Set when the run ended because no image could be obtained.
    pub no_images: bool,
}

impl PipelineFailed {
    pub fn new(stage: RunState, error: crate::error::Error) -> Self {
        Self {
            stage,
            no_images: matches!(error, crate::error::Error::NoImages { .. }),
            message: error.to_string(),
        }
    }
}

/// A successfully published run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Published {
    pub url: String,
    pub script: String,
    pub audio_path: PathBuf,
    pub video_path: PathBuf,
    pub duration_seconds: f64,
    pub seconds_per_image: f64,
    pub image_count: usize,
}

/// Payload handed to whoever triggered the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunReport {
    Ok { url: String },
    Error { stage: RunState, message: String },
}

impl RunReport {
    /// A run refused before its first stage, e.g. for bad configuration or
    /// missing credentials.
    pub fn rejected(error: impl fmt::Display) -> Self {
        RunReport::Error {
            stage: RunState::Idle,
            message: error.to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, RunReport::Ok { .. })
    }
}

impl From<&Result<Published, PipelineFailed>> for RunReport {
    fn from(outcome: &Result<Published, PipelineFailed>) -> Self {
        match outcome {
            Ok(published) => RunReport::Ok {
                url: published.url.clone(),
            },
            Err(failed) => RunReport::Error {
                stage: failed.stage,
                message: failed.message.clone(),
            },
        }
    }
}
