use std::{
    ffi::{OsStr, OsString},
    path::PathBuf,
};

use tracing::info;

use crate::{
    error::{Error, Result},
    format::FRAME_PATTERN,
    services::MediaTools,
};

/// Everything the encoder needs for one composition.
#[derive(Debug, Clone)]
pub struct EncodeJob {
    pub audio_path: PathBuf,
    pub staging_dir: PathBuf,
    pub output_path: PathBuf,
    /// Audio length in seconds; the video is clipped to exactly this.
    pub duration: f64,
    pub frames: usize,
    pub width: u32,
    pub height: u32,
}

impl EncodeJob {
    pub fn seconds_per_image(&self) -> Result<f64> {
        seconds_per_image(self.duration, self.frames)
    }
}

/// How long each frame stays on screen so the sequence spans `duration`.
pub fn seconds_per_image(duration: f64, frames: usize) -> Result<f64> {
    if frames == 0 {
        return Err(Error::InvalidConfig {
            reason: "cannot compose a video from zero frames".to_string(),
        });
    }
    if !(duration.is_finite() && duration > 0.0) {
        return Err(Error::InvalidConfig {
            reason: format!("audio duration must be positive, got {duration}"),
        });
    }
    Ok(duration / frames as f64)
}

/// Argument list for the encoder.
///
/// Input 0 is the narration, input 1 the staged image sequence held for
/// `seconds_per_image` each. Frames are scaled to fit then letterboxed to the
/// target raster; only one audio and one video stream are mapped, and the
/// output is cut at the audio length.
pub fn encoder_args(job: &EncodeJob) -> Result<Vec<OsString>> {
    let spi = job.seconds_per_image()?;
    let (w, h) = (job.width, job.height);
    let filter = format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,format=yuv420p"
    );

    let mut args = vec![os("-y"), os("-i"), os(&job.audio_path)];
    args.extend([
        os("-framerate"),
        os(format!("1/{spi}")),
        os("-f"),
        os("image2"),
        os("-i"),
        os(job.staging_dir.join(FRAME_PATTERN)),
    ]);
    args.extend([
        os("-vf"),
        os(filter),
        os("-map"),
        os("0:a:0"),
        os("-map"),
        os("1:v:0"),
        os("-c:v"),
        os("libx264"),
        os("-r"),
        os("30"),
        os("-c:a"),
        os("aac"),
        os("-shortest"),
        os("-t"),
        os(job.duration.to_string()),
        os(&job.output_path),
    ]);

    Ok(args)
}

/// Run the encoder once for `job`. There is no fallback: failure is fatal.
pub async fn compose_video(tools: &dyn MediaTools, job: &EncodeJob) -> Result<PathBuf> {
    let args = encoder_args(job)?;
    info!(
        frames = job.frames,
        duration = job.duration,
        seconds_per_image = job.seconds_per_image()?,
        output = %job.output_path.display(),
        "composing video"
    );

    if let Some(parent) = job.output_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tools.encode(&args, &job.output_path).await?;

    Ok(job.output_path.clone())
}

fn os(value: impl AsRef<OsStr>) -> OsString {
    value.as_ref().to_os_string()
}
