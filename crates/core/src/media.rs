use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::process::Command;

use crate::{
    error::{Error, Result},
    services::MediaTools,
};

/// `ffprobe`/`ffmpeg` invoked as child processes.
pub struct Ffmpeg {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl Ffmpeg {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }
}

#[async_trait]
impl MediaTools for Ffmpeg {
    async fn probe_duration(&self, path: &Path) -> Result<f64> {
        let probe_failed = |reason: String| Error::ProbeFailed {
            audio_path: path.to_path_buf(),
            reason,
        };

        let output = Command::new(&self.ffprobe)
            .arg("-v")
            .arg("error")
            .arg("-show_entries")
            .arg("format=duration")
            .arg("-of")
            .arg("default=noprint_wrappers=1:nokey=1")
            .arg(path)
            .output()
            .await
            .map_err(|e| probe_failed(format!("{}: {e}", self.ffprobe.display())))?;

        if !output.status.success() {
            return Err(probe_failed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        parse_probe_output(&String::from_utf8_lossy(&output.stdout)).map_err(probe_failed)
    }

    async fn encode(&self, args: &[OsString], output_path: &Path) -> Result<()> {
        let output = Command::new(&self.ffmpeg)
            .args(args)
            .output()
            .await
            .map_err(|e| Error::EncodeFailed {
                output_path: output_path.to_path_buf(),
                reason: format!("{}: {e}", self.ffmpeg.display()),
            })?;

        if !output.status.success() {
            return Err(Error::EncodeFailed {
                output_path: output_path.to_path_buf(),
                reason: format!(
                    "{}: {}",
                    output.status,
                    stderr_tail(&String::from_utf8_lossy(&output.stderr))
                ),
            });
        }

        Ok(())
    }
}

/// The probe prints a single numeric line of seconds.
fn parse_probe_output(stdout: &str) -> std::result::Result<f64, String> {
    let line = stdout.lines().next().unwrap_or_default().trim();
    match line.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds > 0.0 => Ok(seconds),
        Ok(seconds) => Err(format!("non-positive duration {seconds}")),
        Err(_) => Err(format!("unparseable duration '{line}'")),
    }
}

// ffmpeg prints its whole banner to stderr; the cause is at the end.
fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.trim_end().lines().collect();
    let start = lines.len().saturating_sub(8);
    lines[start..].join("\n")
}
