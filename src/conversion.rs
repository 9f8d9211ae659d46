//! Internal conversion helpers.
//!
//! Pixel-plane copying and frame/time arithmetic shared by the source,
//! segment and pipeline modules.

use std::time::Duration;

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy an RGB24 FFmpeg frame into a tightly-packed buffer.
///
/// FFmpeg rows often carry padding (stride > width × 3); it is stripped
/// so the result can go straight into [`image::RgbImage::from_raw`].
pub(crate) fn frame_to_rgb_buffer(video_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_bytes = (width as usize) * 3;
    let data = video_frame.data(0);

    if stride == row_bytes {
        data[..row_bytes * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(row_bytes * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + row_bytes]);
        }
        buffer
    }
}

/// Convert a rational frame rate to frames per second, `0.0` when undefined.
pub(crate) fn rational_to_fps(rate: Rational) -> f64 {
    if rate.denominator() == 0 || rate.numerator() <= 0 {
        0.0
    } else {
        rate.numerator() as f64 / rate.denominator() as f64
    }
}

/// Wall-clock length of `frames` frames at `frames_per_second`.
///
/// A zero, negative or non-finite frame rate yields [`Duration::ZERO`].
pub fn frames_to_duration(frames: u64, frames_per_second: f64) -> Duration {
    if !frames_per_second.is_finite() || frames_per_second <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(frames as f64 / frames_per_second)
}
