use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    acquire::{AcquireLimits, acquire_images},
    compose::{EncodeJob, compose_video},
    config::PipelineConfig,
    error::{Error, Result},
    format::{
        format_audio_name, format_timestamp, format_video_key, format_video_name, now_millis,
    },
    probe::probe_duration,
    provider::narration_prompt,
    services::{AudioFormat, Services},
    staging::{ScratchDir, stage_frames},
    types::{PipelineFailed, Published, RunState},
};

/// Scratch layout of a single run, namespaced by its id.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: Uuid,
    pub root: ScratchDir,
    pub downloads: ScratchDir,
    pub staging: ScratchDir,
}

impl RunContext {
    pub fn new(config: &PipelineConfig) -> Self {
        let run_id = Uuid::new_v4();
        let root = config.run_dir(&run_id);
        Self {
            run_id,
            downloads: ScratchDir::new(root.join("downloads")),
            staging: ScratchDir::new(root.join("staging")),
            root: ScratchDir::new(root),
        }
    }
}

/// Orchestrates one subject → published video run.
pub struct Pipeline {
    config: PipelineConfig,
    services: Services,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, services: Services) -> Self {
        Self { config, services }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage for `subject`.
    ///
    /// The first failing stage ends the run. Scratch files are cleaned up
    /// whatever the outcome, and cleanup problems never replace the result.
    pub async fn run(&self, subject: &str) -> std::result::Result<Published, PipelineFailed> {
        if subject.trim().is_empty() {
            return Err(PipelineFailed::new(
                RunState::Idle,
                Error::InvalidConfig {
                    reason: "subject must not be empty".to_string(),
                },
            ));
        }

        let run = RunContext::new(&self.config);
        info!(run_id = %run.run_id, subject, "starting run");

        let outcome = self.execute(subject, &run).await;

        transition(&run, RunState::Cleanup);
        cleanup(&run).await;

        match &outcome {
            Ok(published) => {
                transition(&run, RunState::Done);
                info!(run_id = %run.run_id, url = %published.url, "run published");
            }
            Err(failed) => {
                transition(&run, RunState::Failed);
                error!(run_id = %run.run_id, stage = %failed.stage, message = %failed.message, "run failed");
            }
        }

        outcome
    }

    /// URLs of everything published under `prefix`.
    pub async fn list_published(&self, prefix: &str) -> Result<Vec<String>> {
        self.services.blobs.list(prefix).await
    }

    async fn execute(
        &self,
        subject: &str,
        run: &RunContext,
    ) -> std::result::Result<Published, PipelineFailed> {
        let fail = |stage: RunState| move |e: Error| PipelineFailed::new(stage, e);

        transition(run, RunState::Scripting);
        let script = self
            .script(subject)
            .await
            .map_err(fail(RunState::Scripting))?;

        transition(run, RunState::Synthesizing);
        let audio_path = self
            .synthesize(&script)
            .await
            .map_err(fail(RunState::Synthesizing))?;

        transition(run, RunState::Acquiring);
        let images = acquire_images(
            self.services.search.as_ref(),
            self.services.downloader.as_ref(),
            subject,
            &run.downloads,
            AcquireLimits {
                count: self.config.image_count,
                page_size: self.config.page_size,
                max_offset: self.config.max_offset,
            },
        )
        .await
        .map_err(fail(RunState::Acquiring))?;

        transition(run, RunState::Staging);
        let frames = stage_frames(&run.staging, &images)
            .await
            .map_err(fail(RunState::Staging))?;

        transition(run, RunState::Probing);
        let duration = probe_duration(
            self.services.media.as_ref(),
            &audio_path,
            self.config.fallback_duration,
        )
        .await;
        info!(duration = %format_timestamp(duration), "narration length");

        transition(run, RunState::Composing);
        let job = EncodeJob {
            audio_path: audio_path.clone(),
            staging_dir: run.staging.path().to_path_buf(),
            output_path: self.config.output_dir.join(format_video_name(now_millis())),
            duration,
            frames: frames.len(),
            width: self.config.width,
            height: self.config.height,
        };
        let seconds_per_image = job
            .seconds_per_image()
            .map_err(fail(RunState::Composing))?;
        let video_path = compose_video(self.services.media.as_ref(), &job)
            .await
            .map_err(fail(RunState::Composing))?;

        transition(run, RunState::Publishing);
        let url = self
            .publish(&video_path)
            .await
            .map_err(fail(RunState::Publishing))?;

        Ok(Published {
            url,
            script,
            audio_path,
            video_path,
            duration_seconds: duration,
            seconds_per_image,
            image_count: frames.len(),
        })
    }

    async fn script(&self, subject: &str) -> Result<String> {
        let script = self
            .services
            .text
            .generate(&narration_prompt(subject))
            .await
            .map_err(|e| match e {
                e @ Error::ScriptFailed { .. } => e,
                e => Error::ScriptFailed {
                    reason: e.to_string(),
                },
            })?;

        let script = script.trim().to_string();
        if script.is_empty() {
            return Err(Error::ScriptFailed {
                reason: "generator returned an empty script".to_string(),
            });
        }
        info!(words = script.split_whitespace().count(), "narration script ready");
        Ok(script)
    }

    async fn synthesize(&self, script: &str) -> Result<PathBuf> {
        let format = AudioFormat::Mp3;
        let audio = self
            .services
            .speech
            .synthesize(script, &self.config.voice, format)
            .await
            .map_err(|e| match e {
                e @ Error::SynthesisFailed { .. } => e,
                e => Error::SynthesisFailed {
                    reason: e.to_string(),
                },
            })?;

        fs::create_dir_all(&self.config.output_dir).await?;
        let audio_path = self
            .config
            .output_dir
            .join(format_audio_name(now_millis(), format.extension()));
        fs::write(&audio_path, &audio).await?;
        info!(bytes = audio.len(), path = %audio_path.display(), "narration audio written");

        Ok(audio_path)
    }

    async fn publish(&self, video_path: &Path) -> Result<String> {
        let file_name = video_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::UploadFailed {
                key: video_path.display().to_string(),
                reason: "video path has no file name".to_string(),
            })?;
        let key = format_video_key(&file_name);
        let bytes = fs::read(video_path).await?;

        self.services
            .blobs
            .put(bytes, &key)
            .await
            .map_err(|e| match e {
                e @ Error::UploadFailed { .. } => e,
                e => Error::UploadFailed {
                    key: key.clone(),
                    reason: e.to_string(),
                },
            })
    }
}

fn transition(run: &RunContext, state: RunState) {
    info!(run_id = %run.run_id, state = %state, "pipeline state");
}

/// Best-effort removal of every scratch artifact of `run`.
async fn cleanup(run: &RunContext) {
    for dir in [&run.staging, &run.downloads, &run.root] {
        if let Err(e) = dir.remove().await {
            warn!(dir = %dir.path().display(), error = %e, "cleanup failed");
        }
    }
}
