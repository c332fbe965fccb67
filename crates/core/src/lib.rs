//! factreel core library
//!
//! Turns a subject into a narrated fact video: script generation, speech
//! synthesis, image acquisition, frame staging, duration probing, video
//! composition and publishing.

pub mod acquire;
pub mod blob;
pub mod compose;
pub mod config;
pub mod download;
pub mod error;
pub mod format;
pub mod media;
pub mod pipeline;
pub mod probe;
pub mod provider;
pub mod search;
pub mod services;
pub mod speech;
pub mod staging;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-export commonly used items at crate root
pub use acquire::{AcquireLimits, acquire_images};
pub use blob::{HttpBlobStore, LocalBlobStore, blob_store_from_env};
pub use compose::{EncodeJob, compose_video, encoder_args, seconds_per_image};
pub use config::{PipelineConfig, http_client};
pub use error::{Error, Result};
pub use format::format_elapsed;
pub use media::Ffmpeg;
pub use pipeline::{Pipeline, RunContext};
pub use probe::probe_duration;
pub use provider::{Provider, ProviderConfig};
pub use services::{
    AudioFormat, BlobStore, ImageDownloader, ImageSearch, MediaTools, Services,
    SpeechSynthesizer, TextGenerator,
};
pub use staging::{ScratchDir, stage_frames};
pub use types::{PipelineFailed, Published, RunReport, RunState};
