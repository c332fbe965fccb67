use std::path::Path;

use tracing::{info, warn};

use crate::services::MediaTools;

/// Playable length of `audio_path` in seconds.
///
/// Never fails: any probe error degrades to `fallback` with a warning so the
/// run can continue.
pub async fn probe_duration(tools: &dyn MediaTools, audio_path: &Path, fallback: f64) -> f64 {
    match tools.probe_duration(audio_path).await {
        Ok(seconds) if seconds.is_finite() && seconds > 0.0 => {
            info!(seconds, path = %audio_path.display(), "probed audio duration");
            seconds
        }
        Ok(seconds) => {
            warn!(seconds, fallback, "probe returned an unusable duration, using fallback");
            fallback
        }
        Err(e) => {
            warn!(error = %e, fallback, "duration probe failed, using fallback");
            fallback
        }
    }
}
