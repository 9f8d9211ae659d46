//! The analysis pipeline.
//!
//! One run is a single linear pass over a video:
//!
//! ```text
//! Idle -> Opened -> Sampling -> Summarizing -> Emitted -> Closed
//! ```
//!
//! Any failure after the video is opened skips straight to `Closed`; the
//! video is released before the error is returned.
//!
//! # Example
//!
//! ```no_run
//! use framescan::{Analyzer, PipelineConfig, PlaceholderDetector};
//! use framescan::report::{self, ConfidenceStyle};
//!
//! let config = PipelineConfig::new().with_sample_stride(10);
//! let mut analyzer = Analyzer::new(config, PlaceholderDetector::default());
//! let analysis = analyzer.analyze_file("input.mp4")?;
//!
//! println!("{} segments ({})", analysis.segments.len(), analysis.provenance);
//! std::fs::write("frames.csv", report::to_csv(&analysis.rows, ConfidenceStyle::Fraction)?)?;
//! # Ok::<(), framescan::FrameScanError>(())
//! ```

use std::{path::Path, sync::Arc, time::Duration};

use serde_json::json;

use crate::{
    config::PipelineConfig,
    detect::{DetectionRecord, ObjectDetector, Provenance},
    error::FrameScanError,
    metadata::VideoMetadata,
    progress::{OperationType, ProgressTracker},
    report::{self, ConfidenceStyle, ReportRow},
    sampler::{FrameSampler, SampledFrame},
    segment::{self, Segment},
    source::{FrameSource, VideoFile},
};

/// Stages of a run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineStage {
    /// Nothing has happened yet.
    Idle,
    /// The video is open and its metadata read.
    Opened,
    /// Frames are being decoded and sampled.
    Sampling,
    /// Detection records are being grouped into segments.
    Summarizing,
    /// Report rows are ready.
    Emitted,
    /// The video has been released.
    Closed,
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Metadata of the analysed video.
    pub metadata: VideoMetadata,
    /// Frames actually decoded (the container count can be an estimate).
    pub decoded_frames: u64,
    /// Stride used for sampling.
    pub sample_stride: u64,
    /// Indices of every sampled frame, ascending.
    pub sampled_indices: Vec<u64>,
    /// The first sampled frames, up to the configured preview limit.
    pub previews: Vec<SampledFrame>,
    /// One record per reported sampled frame.
    pub records: Vec<DetectionRecord>,
    /// Contiguous segments spanning every decoded frame.
    pub segments: Vec<Segment>,
    /// Flat report rows derived from `records`.
    pub rows: Vec<ReportRow>,
    /// Whether object counts are real detections or estimates.
    pub provenance: Provenance,
}

impl Analysis {
    /// Duration of the decoded video, zero when the frame rate is zero.
    pub fn duration(&self) -> Duration {
        crate::conversion::frames_to_duration(self.decoded_frames, self.metadata.frames_per_second)
    }

    /// A JSON document describing the whole run: video, segments and rows.
    pub fn summary_json(&self, style: ConfidenceStyle) -> Result<String, FrameScanError> {
        let rows: serde_json::Value = serde_json::from_str(&report::to_json(&self.rows, style)?)?;
        let payload = json!({
            "video": {
                "width": self.metadata.width,
                "height": self.metadata.height,
                "fps": self.metadata.frames_per_second,
                "frame_count": self.metadata.frame_count,
                "decoded_frames": self.decoded_frames,
                "duration_seconds": self.duration().as_secs_f64(),
                "codec": self.metadata.codec,
                "format": self.metadata.format,
            },
            "sample_stride": self.sample_stride,
            "sampled_frames": self.sampled_indices.len(),
            "provenance": self.provenance,
            "segments": self.segments,
            "rows": rows,
        });
        Ok(serde_json::to_string_pretty(&payload)?)
    }
}

/// Runs the pipeline with a fixed configuration and detector.
pub struct Analyzer<D: ObjectDetector> {
    config: PipelineConfig,
    detector: D,
    stage: PipelineStage,
}

impl<D: ObjectDetector> Analyzer<D> {
    /// Create an analyzer.
    pub fn new(config: PipelineConfig, detector: D) -> Self {
        Self {
            config,
            detector,
            stage: PipelineStage::Idle,
        }
    }

    /// The configuration in use.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Last stage reached by the most recent run.
    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    fn enter(&mut self, stage: PipelineStage) {
        log::debug!("Pipeline stage {:?} -> {:?}", self.stage, stage);
        self.stage = stage;
    }

    /// Open `path` and analyse it.
    ///
    /// # Errors
    ///
    /// [`FrameScanError::UnsupportedFormat`] and [`FrameScanError::Open`]
    /// from opening, [`FrameScanError::Decode`] or
    /// [`FrameScanError::Cancelled`] from sampling.
    pub fn analyze_file<P: AsRef<Path>>(&mut self, path: P) -> Result<Analysis, FrameScanError> {
        self.enter(PipelineStage::Idle);
        let video = match VideoFile::open(path) {
            Ok(video) => video,
            Err(error) => {
                self.enter(PipelineStage::Closed);
                return Err(error);
            }
        };
        self.run(video)
    }

    /// Analyse a video held in memory; `extension` names its container.
    pub fn analyze_bytes(
        &mut self,
        bytes: &[u8],
        extension: &str,
    ) -> Result<Analysis, FrameScanError> {
        self.enter(PipelineStage::Idle);
        let video = match VideoFile::open_bytes(bytes, extension) {
            Ok(video) => video,
            Err(error) => {
                self.enter(PipelineStage::Closed);
                return Err(error);
            }
        };
        self.run(video)
    }

    /// Analyse an already opened source, closing it on every exit path.
    pub fn run<S: FrameSource>(&mut self, mut source: S) -> Result<Analysis, FrameScanError> {
        self.enter(PipelineStage::Opened);
        let result = self.process(&mut source);
        source.close();
        self.enter(PipelineStage::Closed);

        match &result {
            Ok(analysis) => log::info!(
                "Analysed {} frames: {} sampled, {} reported, {} segment(s)",
                analysis.decoded_frames,
                analysis.sampled_indices.len(),
                analysis.rows.len(),
                analysis.segments.len(),
            ),
            Err(error) => log::debug!("Pipeline failed: {error}"),
        }
        result
    }

    fn process<S: FrameSource>(&mut self, source: &mut S) -> Result<Analysis, FrameScanError> {
        self.config.validate()?;
        let metadata = source.metadata().clone();

        self.enter(PipelineStage::Sampling);
        let report_limit = self.config.max_report_rows.unwrap_or(usize::MAX);
        let mut tracker = ProgressTracker::new(
            Arc::clone(&self.config.progress),
            OperationType::Detection,
            None,
            self.config.batch_size,
        );

        let mut sampled_indices = Vec::new();
        let mut previews = Vec::new();
        let mut records = Vec::new();

        let mut sampler = FrameSampler::with_config(source, &self.config)?;
        for frame in sampler.by_ref() {
            let frame = frame?;
            sampled_indices.push(frame.index);

            if records.len() < report_limit {
                let detections = self.detector.detect_objects(&frame)?;
                records.push(DetectionRecord::from_detections(
                    frame.index,
                    detections,
                    self.config.confidence_threshold,
                ));
                tracker.advance(Some(frame.index));
            }
            if previews.len() < self.config.preview_limit {
                previews.push(frame);
            }
        }
        tracker.finish();

        // Segments span what was actually decoded; container counts can be off.
        let decoded_frames = sampler.decoded();
        if decoded_frames != metadata.frame_count {
            log::debug!(
                "Container reported {} frames, decoded {}",
                metadata.frame_count,
                decoded_frames
            );
        }

        self.enter(PipelineStage::Summarizing);
        let segments = segment::summarize(
            &sampled_indices,
            &records,
            decoded_frames,
            metadata.frames_per_second,
            self.config.scene_group_size,
        )?;

        let rows = report::to_rows(&records);
        self.enter(PipelineStage::Emitted);

        Ok(Analysis {
            metadata,
            decoded_frames,
            sample_stride: self.config.sample_stride,
            sampled_indices,
            previews,
            records,
            segments,
            rows,
            provenance: self.detector.provenance(),
        })
    }
}
