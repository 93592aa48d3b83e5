//! Video source metadata.
//!
//! [`VideoMetadata`] is read once when a [`VideoHandle`](crate::VideoHandle)
//! is opened and cached for the handle's lifetime.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Local};

/// Metadata for an opened video.
///
/// # Example
///
/// ```no_run
/// use framedeck::VideoHandle;
///
/// let handle = VideoHandle::open("input.mp4")?;
/// let metadata = handle.metadata();
/// println!("{}x{} @ {:.2} fps, {:?}", metadata.width, metadata.height,
///     metadata.frames_per_second, metadata.duration);
/// # Ok::<(), framedeck::FramedeckError>(())
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct VideoMetadata {
    /// Path the video was opened from.
    pub path: PathBuf,
    /// Total duration. Zero when neither the container nor the stream
    /// reports one.
    pub duration: Duration,
    /// Nominal frames per second (approximate for variable-frame-rate
    /// content, zero if unknown).
    pub frames_per_second: f64,
    /// Estimated total number of frames, from duration and frame rate.
    pub frame_count: u64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Codec name (e.g. `"h264"`, `"vp9"`).
    pub codec: String,
    /// Container format name (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`).
    pub format: String,
    /// Size of the source file in bytes.
    pub file_size: u64,
    /// Last modification time of the source file, when the platform
    /// reports one.
    pub modified: Option<SystemTime>,
}

impl VideoMetadata {
    /// Duration of one frame, or `None` if the frame rate is unknown.
    pub fn frame_period(&self) -> Option<Duration> {
        (self.frames_per_second > 0.0)
            .then(|| Duration::from_secs_f64(1.0 / self.frames_per_second))
    }
}

/// Render a byte count as `"12.34 MB"` or `"512.00 KB"`.
pub fn human_readable_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = 1024.0 * 1024.0;
    let bytes = bytes as f64;
    if bytes >= MIB {
        format!("{:.2} MB", bytes / MIB)
    } else {
        format!("{:.2} KB", bytes / KIB)
    }
}

/// Render a file time as local `"YYYY-MM-DD HH:MM:SS"`.
pub fn format_modified(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}
