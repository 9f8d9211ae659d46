//! Lazy, forward-only frame sampling.
//!
//! [`FrameSampler`] walks a [`FrameSource`] from frame 0 and yields every
//! frame whose index is a multiple of the stride. Every frame is decoded
//! (the index is its position in decode order) but only retained frames
//! are converted to RGB.
//!
//! # Example
//!
//! ```
//! use framescan::{SyntheticVideo, sample};
//!
//! let mut video = SyntheticVideo::new(100, 25.0);
//! let indices: Vec<u64> = sample(&mut video, 5)?
//!     .map(|frame| frame.map(|frame| frame.index))
//!     .collect::<Result<_, _>>()?;
//! assert_eq!(indices.len(), 20);
//! assert_eq!(indices[1], 5);
//! # Ok::<(), framescan::FrameScanError>(())
//! ```

use std::sync::Arc;

use image::RgbImage;

use crate::{
    config::PipelineConfig,
    error::FrameScanError,
    progress::{CancellationToken, OperationType, ProgressTracker},
    source::FrameSource,
};

/// One retained frame.
#[derive(Debug, Clone)]
pub struct SampledFrame {
    /// Position of the frame in decode order.
    pub index: u64,
    /// RGB8 pixels.
    pub image: RgbImage,
}

impl SampledFrame {
    /// Raw, tightly packed RGB bytes.
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }
}

/// Iterator over the sampled frames of a source.
///
/// Fused: after end of stream, cancellation, or the first error it only
/// returns `None`.
pub struct FrameSampler<'a, S: FrameSource + ?Sized> {
    source: &'a mut S,
    stride: u64,
    cancellation: Option<CancellationToken>,
    tracker: Option<ProgressTracker>,
    decoded: u64,
    done: bool,
}

/// Start sampling `source` with the given stride.
///
/// # Errors
///
/// [`FrameScanError::InvalidStride`] when `stride` is zero.
pub fn sample<S: FrameSource + ?Sized>(
    source: &mut S,
    stride: u64,
) -> Result<FrameSampler<'_, S>, FrameScanError> {
    if stride == 0 {
        return Err(FrameScanError::InvalidStride);
    }
    Ok(FrameSampler {
        source,
        stride,
        cancellation: None,
        tracker: None,
        decoded: 0,
        done: false,
    })
}

impl<'a, S: FrameSource + ?Sized> FrameSampler<'a, S> {
    /// Sample with the stride, cancellation token and progress callback of
    /// `config`.
    pub fn with_config(source: &'a mut S, config: &PipelineConfig) -> Result<Self, FrameScanError> {
        let total = source.metadata().frame_count;
        let mut sampler = sample(source, config.sample_stride)?;
        sampler.cancellation = config.cancellation.clone();
        sampler.tracker = Some(ProgressTracker::new(
            Arc::clone(&config.progress),
            OperationType::Sampling,
            Some(total),
            config.batch_size,
        ));
        Ok(sampler)
    }

    /// The stride in use.
    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// Frames decoded so far, retained or not.
    pub fn decoded(&self) -> u64 {
        self.decoded
    }

    fn finish(&mut self) {
        self.done = true;
        if let Some(tracker) = self.tracker.as_mut() {
            tracker.finish();
        }
    }
}

impl<S: FrameSource + ?Sized> Iterator for FrameSampler<'_, S> {
    type Item = Result<SampledFrame, FrameScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            if self
                .cancellation
                .as_ref()
                .is_some_and(|token| token.is_cancelled())
            {
                log::debug!("Sampling cancelled");
                self.done = true;
                return Some(Err(FrameScanError::Cancelled));
            }

            let index = match self.source.advance() {
                Ok(Some(index)) => index,
                Ok(None) => {
                    self.finish();
                    return None;
                }
                Err(error) => {
                    self.done = true;
                    return Some(Err(error));
                }
            };

            self.decoded += 1;
            if let Some(tracker) = self.tracker.as_mut() {
                tracker.advance(Some(index));
            }

            if index % self.stride != 0 {
                continue;
            }

            return match self.source.current_image() {
                Ok(image) => Some(Ok(SampledFrame { index, image })),
                Err(error) => {
                    self.done = true;
                    Some(Err(error))
                }
            };
        }
    }
}

impl<S: FrameSource + ?Sized> std::iter::FusedIterator for FrameSampler<'_, S> {}
