//! # framescan
//!
//! Sample frames from a video, tag them with a pluggable object detector,
//! group the result into coarse segments, and export the report as CSV or
//! JSON.
//!
//! Videos are genuinely decoded through FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate. Every Nth
//! frame is kept as an [`image::RgbImage`] and handed to an
//! [`ObjectDetector`]. The bundled [`PlaceholderDetector`] is deterministic
//! and its counts are reported as estimates ([`Provenance::Estimated`]),
//! never as detection results.
//!
//! ## Quick Start
//!
//! ```no_run
//! use framescan::{Analyzer, PipelineConfig, PlaceholderDetector};
//! use framescan::report::{self, ConfidenceStyle};
//!
//! let config = PipelineConfig::new()
//!     .with_sample_stride(5)
//!     .with_scene_group_size(10)
//!     .with_confidence_threshold(0.5);
//!
//! let mut analyzer = Analyzer::new(config, PlaceholderDetector::default());
//! let analysis = analyzer.analyze_file("input.mp4")?;
//!
//! println!(
//!     "{} of {} frames sampled, {} segment(s)",
//!     analysis.sampled_indices.len(),
//!     analysis.decoded_frames,
//!     analysis.segments.len(),
//! );
//! let csv = report::to_csv(&analysis.rows, ConfidenceStyle::Fraction)?;
//! let json = report::to_json(&analysis.rows, ConfidenceStyle::Percent)?;
//! # Ok::<(), framescan::FrameScanError>(())
//! ```
//!
//! ## Pipeline
//!
//! - **Video source**: [`VideoFile`] opens `.mp4`, `.avi`, `.mov` and `.mkv`
//!   files (or in-memory buffers) and decodes them front to back. Other
//!   extensions fail with [`FrameScanError::UnsupportedFormat`] before any
//!   decode attempt.
//! - **Frame sampler**: [`FrameSampler`] keeps frames whose index is a
//!   multiple of the stride.
//! - **Segment summarizer**: [`summarize`] splits the decoded range into
//!   `max(1, sampled / group_size)` equal-width segments.
//! - **Report emitter**: [`report`] renders rows as CSV or JSON and parses
//!   them back.
//!
//! The video is released exactly once on every exit path, including errors
//! and cancellation.
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `synthetic` | `SyntheticVideo`, an in-memory frame source for tests and benchmarks |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on the build machine.

mod conversion;
pub mod config;
pub mod detect;
pub mod error;
pub mod ffmpeg;
pub mod format;
pub mod metadata;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod sampler;
pub mod segment;
pub mod source;
#[cfg(feature = "synthetic")]
pub mod synthetic;

pub use config::PipelineConfig;
pub use conversion::frames_to_duration;
pub use detect::{
    BoundingBox, Confidence, Detection, DetectionRecord, ObjectDetector, PlaceholderDetector,
    Provenance,
};
pub use error::FrameScanError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use format::ContainerFormat;
pub use metadata::VideoMetadata;
pub use pipeline::{Analysis, Analyzer, PipelineStage};
pub use progress::{CancellationToken, OperationType, ProgressCallback, ProgressInfo};
pub use report::{ConfidenceStyle, ReportRow};
pub use sampler::{FrameSampler, SampledFrame, sample};
pub use segment::{Estimate, Segment, segment_count, summarize};
pub use source::{FrameSource, VideoFile};
#[cfg(feature = "synthetic")]
pub use synthetic::{ReleaseCounter, SyntheticVideo};
