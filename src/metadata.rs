//! Video metadata.
//!
//! [`VideoMetadata`] is read once when a source is opened and stays fixed
//! for the lifetime of the handle.

use std::time::Duration;

use serde::Serialize;

use crate::conversion::frames_to_duration;

/// Metadata for the video stream of an opened source.
///
/// # Example
///
/// ```no_run
/// use framescan::{FrameSource, VideoFile};
///
/// let video = VideoFile::open("input.mp4")?;
/// let metadata = video.metadata();
/// println!("{} frames @ {:.1} fps", metadata.frame_count, metadata.frames_per_second);
/// println!("duration: {:.1}s", metadata.duration().as_secs_f64());
/// # Ok::<(), framescan::FrameScanError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second. Zero when the container does not declare a rate.
    pub frames_per_second: f64,
    /// Total number of frames reported by the container.
    pub frame_count: u64,
    /// Codec name (e.g. `"h264"`).
    pub codec: String,
    /// Container format name (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`).
    pub format: String,
}

impl VideoMetadata {
    /// Total duration, `frame_count / frames_per_second`.
    ///
    /// Zero when the frame rate is zero, so callers never divide by it.
    pub fn duration(&self) -> Duration {
        frames_to_duration(self.frame_count, self.frames_per_second)
    }
}
