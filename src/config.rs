//! Pipeline configuration.
//!
//! [`PipelineConfig`] carries every tunable of a run as a plain value:
//! sampling stride, segment grouping, the detection confidence threshold,
//! output limits, and the progress/cancellation hooks.
//!
//! # Example
//!
//! ```
//! use framescan::{CancellationToken, PipelineConfig};
//!
//! let token = CancellationToken::new();
//! let config = PipelineConfig::new()
//!     .with_sample_stride(10)
//!     .with_scene_group_size(5)
//!     .with_confidence_threshold(0.6)
//!     .with_cancellation(token.clone());
//! assert_eq!(config.sample_stride(), 10);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::error::FrameScanError;
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};

/// Default sampling stride: keep every 5th frame.
pub const DEFAULT_SAMPLE_STRIDE: u64 = 5;
/// Default number of sampled frames per segment.
pub const DEFAULT_SCENE_GROUP_SIZE: u64 = 10;
/// Default minimum confidence for a detection to be counted.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;
/// Default number of sampled frames kept as previews.
pub const DEFAULT_PREVIEW_LIMIT: usize = 12;

/// Settings for one pipeline run.
#[derive(Clone)]
pub struct PipelineConfig {
    pub(crate) sample_stride: u64,
    pub(crate) scene_group_size: u64,
    pub(crate) confidence_threshold: f32,
    pub(crate) preview_limit: usize,
    pub(crate) max_report_rows: Option<usize>,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
    pub(crate) batch_size: u64,
}

impl Debug for PipelineConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PipelineConfig")
            .field("sample_stride", &self.sample_stride)
            .field("scene_group_size", &self.scene_group_size)
            .field("confidence_threshold", &self.confidence_threshold)
            .field("preview_limit", &self.preview_limit)
            .field("max_report_rows", &self.max_report_rows)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineConfig {
    /// Defaults: stride 5, group size 10, threshold 0.5, 12 previews,
    /// every sampled frame reported, no progress callback, no cancellation.
    pub fn new() -> Self {
        Self {
            sample_stride: DEFAULT_SAMPLE_STRIDE,
            scene_group_size: DEFAULT_SCENE_GROUP_SIZE,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            preview_limit: DEFAULT_PREVIEW_LIMIT,
            max_report_rows: None,
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
        }
    }

    /// Keep every `stride`th frame. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_sample_stride(mut self, stride: u64) -> Self {
        self.sample_stride = stride.max(1);
        self
    }

    /// Number of sampled frames per reported segment. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_scene_group_size(mut self, size: u64) -> Self {
        self.scene_group_size = size.max(1);
        self
    }

    /// Minimum confidence for a detection to be counted.
    ///
    /// Clamped into `[0, 1]`. Only filters detections; sampling is unaffected.
    #[must_use]
    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// How many of the first sampled frames to keep as previews.
    #[must_use]
    pub fn with_preview_limit(mut self, limit: usize) -> Self {
        self.preview_limit = limit;
        self
    }

    /// Only detect and report the first `rows` sampled frames.
    ///
    /// `None` reports all of them. Segments still span the whole video.
    #[must_use]
    pub fn with_max_report_rows(mut self, rows: Option<usize>) -> Self {
        self.max_report_rows = rows;
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token, polled between frame reads.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Fire the progress callback every `size` items. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Sampling stride.
    pub fn sample_stride(&self) -> u64 {
        self.sample_stride
    }

    /// Sampled frames per segment.
    pub fn scene_group_size(&self) -> u64 {
        self.scene_group_size
    }

    /// Detection confidence threshold.
    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    /// Check the settings before a run.
    ///
    /// The builders clamp, so this only catches values that cannot be
    /// clamped meaningfully (a NaN threshold).
    pub fn validate(&self) -> Result<(), FrameScanError> {
        if self.sample_stride == 0 {
            return Err(FrameScanError::InvalidStride);
        }
        if self.scene_group_size == 0 {
            return Err(FrameScanError::InvalidConfiguration(
                "scene group size must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(FrameScanError::InvalidConfiguration(format!(
                "confidence threshold {} is outside [0, 1]",
                self.confidence_threshold
            )));
        }
        Ok(())
    }
}
