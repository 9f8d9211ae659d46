//! Fabricated video source for tests and benchmarks.
//!
//! [`SyntheticVideo`] reports whatever frame count and frame rate it is
//! built with and generates small gradient frames on demand, without
//! touching any real media. It is a fixture, not a production input: the
//! real pipeline always decodes through [`VideoFile`](crate::VideoFile).

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use image::{Rgb, RgbImage};

use crate::{error::FrameScanError, metadata::VideoMetadata, source::FrameSource};

/// Shared counter of how many times a source released its resources.
#[derive(Debug, Clone, Default)]
pub struct ReleaseCounter(Arc<AtomicUsize>);

impl ReleaseCounter {
    /// Number of releases observed so far.
    pub fn count(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }

    fn record(&self) {
        self.0.fetch_add(1, Ordering::AcqRel);
    }
}

/// An in-memory stand-in for a decoded video.
///
/// # Example
///
/// ```
/// use framescan::{FrameSource, SyntheticVideo};
///
/// let mut video = SyntheticVideo::new(3, 25.0);
/// let mut indices = Vec::new();
/// while let Some((index, _image)) = video.next_frame().unwrap() {
///     indices.push(index);
/// }
/// assert_eq!(indices, vec![0, 1, 2]);
/// ```
#[derive(Debug)]
pub struct SyntheticVideo {
    metadata: VideoMetadata,
    position: u64,
    current: Option<u64>,
    fail_at: Option<u64>,
    closed: bool,
    releases: ReleaseCounter,
}

impl SyntheticVideo {
    /// Frame size of generated images.
    pub const FRAME_SIZE: u32 = 8;

    /// A source that yields `frame_count` frames at `frames_per_second`.
    pub fn new(frame_count: u64, frames_per_second: f64) -> Self {
        Self {
            metadata: VideoMetadata {
                width: Self::FRAME_SIZE,
                height: Self::FRAME_SIZE,
                frames_per_second,
                frame_count,
                codec: "synthetic".to_string(),
                format: "synthetic".to_string(),
            },
            position: 0,
            current: None,
            fail_at: None,
            closed: false,
            releases: ReleaseCounter::default(),
        }
    }

    /// Make decoding fail with [`FrameScanError::Decode`] when frame `index`
    /// is reached.
    #[must_use]
    pub fn failing_at(mut self, index: u64) -> Self {
        self.fail_at = Some(index);
        self
    }

    /// Handle that keeps counting releases after the source is moved away.
    pub fn release_counter(&self) -> ReleaseCounter {
        self.releases.clone()
    }

    /// Number of frames decoded so far.
    pub fn decoded(&self) -> u64 {
        self.position
    }
}

impl FrameSource for SyntheticVideo {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn advance(&mut self) -> Result<Option<u64>, FrameScanError> {
        if self.closed {
            return Err(FrameScanError::Decode("video handle is closed".to_string()));
        }
        if self.position >= self.metadata.frame_count {
            self.current = None;
            return Ok(None);
        }
        if self.fail_at == Some(self.position) {
            return Err(FrameScanError::Decode(format!(
                "synthetic failure at frame {}",
                self.position
            )));
        }

        let index = self.position;
        self.position += 1;
        self.current = Some(index);
        Ok(Some(index))
    }

    fn current_image(&mut self) -> Result<RgbImage, FrameScanError> {
        let index = self
            .current
            .ok_or_else(|| FrameScanError::Decode("no decoded frame to convert".to_string()))?;
        let shade = (index % 256) as u8;
        Ok(RgbImage::from_fn(Self::FRAME_SIZE, Self::FRAME_SIZE, |x, y| {
            Rgb([shade, (x * 32) as u8, (y * 32) as u8])
        }))
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.current = None;
        self.releases.record();
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for SyntheticVideo {
    fn drop(&mut self) {
        self.close();
    }
}
