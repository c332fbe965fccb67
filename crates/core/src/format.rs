use std::time::Duration;

/// Staging frame name for a 1-based index, e.g. `img007.jpg`
pub fn format_frame_name(index: usize) -> String {
    format!("img{:03}.jpg", index)
}

/// Encoder input pattern matching every name produced by [`format_frame_name`]
pub const FRAME_PATTERN: &str = "img%03d.jpg";

/// Downloaded image name, unique per run via timestamp and sequence number
pub fn format_image_name(timestamp_ms: i64, seq: usize) -> String {
    format!("image_{}_{}.jpg", timestamp_ms, seq)
}

pub fn format_audio_name(timestamp_ms: i64, ext: &str) -> String {
    format!("audio_{}.{}", timestamp_ms, ext)
}

pub fn format_video_name(timestamp_ms: i64) -> String {
    format!("video_{}.mp4", timestamp_ms)
}

/// Blob key under which a composed video is published
pub fn format_video_key(file_name: &str) -> String {
    format!("videos/{}", file_name)
}

/// Format seconds as MM:SS timestamp
pub fn format_timestamp(seconds: f64) -> String {
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", mins, secs)
}

pub fn format_elapsed(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
