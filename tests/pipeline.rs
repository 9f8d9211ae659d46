//! End-to-end pipeline tests over the synthetic source.
//!
//! Covers the run lifecycle (release exactly once on every path), the
//! sampling and segment scenarios, and the report limits.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use framescan::{
    Analyzer, CancellationToken, ConfidenceStyle, Detection, FrameScanError, ObjectDetector,
    OperationType, PipelineConfig, PipelineStage, PlaceholderDetector, ProgressCallback,
    ProgressInfo, Provenance, SampledFrame, SyntheticVideo,
};

fn analyzer(config: PipelineConfig) -> Analyzer<PlaceholderDetector> {
    Analyzer::new(config, PlaceholderDetector::default())
}

/// Detector that fails on a chosen frame.
struct FailingDetector {
    fail_at: u64,
}

impl ObjectDetector for FailingDetector {
    fn detect_objects(&mut self, frame: &SampledFrame) -> Result<Vec<Detection>, FrameScanError> {
        if frame.index == self.fail_at {
            return Err(FrameScanError::Decode("detector failure".to_string()));
        }
        Ok(Vec::new())
    }

    fn provenance(&self) -> Provenance {
        Provenance::Detected
    }
}

/// Records every progress update it receives.
#[derive(Default)]
struct Recorder {
    updates: Mutex<Vec<ProgressInfo>>,
}

impl ProgressCallback for Recorder {
    fn on_progress(&self, info: &ProgressInfo) {
        self.updates
            .lock()
            .expect("progress lock")
            .push(info.clone());
    }
}

/// Cancels the run once enough frames have been decoded.
struct CancelAfter {
    frames: u64,
    token: CancellationToken,
}

impl ProgressCallback for CancelAfter {
    fn on_progress(&self, info: &ProgressInfo) {
        if info.operation == OperationType::Sampling && info.current >= self.frames {
            self.token.cancel();
        }
    }
}

// ── Scenarios ──────────────────────────────────────────────────────

#[test]
fn hundred_frames_at_twenty_five_fps() {
    let video = SyntheticVideo::new(100, 25.0);
    let releases = video.release_counter();

    let mut analyzer = analyzer(PipelineConfig::new());
    let analysis = analyzer.run(video).expect("analysis succeeds");

    assert_eq!(analysis.sampled_indices.len(), 20);
    assert!(analysis.sampled_indices.iter().all(|index| index % 5 == 0));
    assert_eq!(analysis.decoded_frames, 100);
    assert_eq!(analysis.duration(), Duration::from_secs(4));
    assert_eq!(analysis.segments.len(), 2);
    assert_eq!(analysis.rows.len(), 20);
    assert_eq!(analysis.provenance, Provenance::Estimated);

    assert_eq!(analyzer.stage(), PipelineStage::Closed);
    assert_eq!(releases.count(), 1);
}

#[test]
fn single_frame_video() {
    let video = SyntheticVideo::new(1, 30.0);
    let analysis = analyzer(PipelineConfig::new())
        .run(video)
        .expect("analysis succeeds");

    assert_eq!(analysis.sampled_indices, vec![0]);
    assert_eq!(analysis.segments.len(), 1);
    assert_eq!(
        (analysis.segments[0].start_frame, analysis.segments[0].end_frame),
        (0, 1)
    );
}

#[test]
fn empty_video_produces_empty_report() {
    let video = SyntheticVideo::new(0, 25.0);
    let releases = video.release_counter();
    let analysis = analyzer(PipelineConfig::new())
        .run(video)
        .expect("analysis succeeds");

    assert!(analysis.sampled_indices.is_empty());
    assert!(analysis.rows.is_empty());
    assert_eq!(analysis.segments.len(), 1);
    assert_eq!(analysis.duration(), Duration::ZERO);
    assert_eq!(releases.count(), 1);
}

#[test]
fn zero_frame_rate_gives_zero_duration() {
    let analysis = analyzer(PipelineConfig::new())
        .run(SyntheticVideo::new(40, 0.0))
        .expect("analysis succeeds");

    assert_eq!(analysis.duration(), Duration::ZERO);
    assert!(
        analysis
            .segments
            .iter()
            .all(|segment| segment.duration == Duration::ZERO)
    );
}

#[test]
fn same_seed_gives_same_report() {
    let run = || {
        analyzer(PipelineConfig::new().with_sample_stride(3))
            .run(SyntheticVideo::new(60, 25.0))
            .expect("analysis succeeds")
            .rows
    };
    assert_eq!(run(), run());
}

#[test]
fn threshold_only_filters_detections() {
    let strict = analyzer(PipelineConfig::new().with_confidence_threshold(1.0))
        .run(SyntheticVideo::new(50, 25.0))
        .expect("analysis succeeds");
    let lenient = analyzer(PipelineConfig::new().with_confidence_threshold(0.0))
        .run(SyntheticVideo::new(50, 25.0))
        .expect("analysis succeeds");

    assert_eq!(strict.sampled_indices, lenient.sampled_indices);
    assert!(strict.rows.iter().all(|row| row.object_count == 0));
    assert!(strict.rows.iter().all(|row| row.primary_class == "background"));
    assert!(lenient.rows.iter().all(|row| row.object_count >= 1));
}

// ── Limits ─────────────────────────────────────────────────────────

#[test]
fn report_rows_can_be_capped() {
    let config = PipelineConfig::new().with_max_report_rows(Some(10));
    let analysis = analyzer(config)
        .run(SyntheticVideo::new(200, 25.0))
        .expect("analysis succeeds");

    assert_eq!(analysis.sampled_indices.len(), 40);
    assert_eq!(analysis.rows.len(), 10);
    assert_eq!(analysis.rows[9].frame_index, 45);
    assert_eq!(analysis.segments.len(), 4, "segments follow every sampled frame");
    assert_eq!(analysis.segments[3].end_frame, 200);
}

#[test]
fn previews_are_limited() {
    let analysis = analyzer(PipelineConfig::new())
        .run(SyntheticVideo::new(500, 25.0))
        .expect("analysis succeeds");
    assert_eq!(analysis.previews.len(), 12);
    assert_eq!(analysis.previews[1].index, 5);

    let analysis = analyzer(PipelineConfig::new().with_preview_limit(0))
        .run(SyntheticVideo::new(50, 25.0))
        .expect("analysis succeeds");
    assert!(analysis.previews.is_empty());
}

// ── Lifecycle ──────────────────────────────────────────────────────

#[test]
fn decode_error_releases_video_once() {
    let video = SyntheticVideo::new(100, 25.0).failing_at(42);
    let releases = video.release_counter();

    let mut analyzer = analyzer(PipelineConfig::new());
    let result = analyzer.run(video);

    assert!(matches!(result, Err(FrameScanError::Decode(_))));
    assert_eq!(analyzer.stage(), PipelineStage::Closed);
    assert_eq!(releases.count(), 1);
}

#[test]
fn detector_error_releases_video_once() {
    let video = SyntheticVideo::new(100, 25.0);
    let releases = video.release_counter();

    let mut analyzer = Analyzer::new(PipelineConfig::new(), FailingDetector { fail_at: 20 });
    let result = analyzer.run(video);

    assert!(matches!(result, Err(FrameScanError::Decode(_))));
    assert_eq!(releases.count(), 1);
}

#[test]
fn cancelled_before_start() {
    let token = CancellationToken::new();
    token.cancel();

    let video = SyntheticVideo::new(100, 25.0);
    let releases = video.release_counter();
    let mut analyzer = analyzer(PipelineConfig::new().with_cancellation(token));

    assert!(matches!(analyzer.run(video), Err(FrameScanError::Cancelled)));
    assert_eq!(analyzer.stage(), PipelineStage::Closed);
    assert_eq!(releases.count(), 1);
}

#[test]
fn cancelled_mid_run() {
    let token = CancellationToken::new();
    let config = PipelineConfig::new()
        .with_cancellation(token.clone())
        .with_progress(Arc::new(CancelAfter {
            frames: 10,
            token: token.clone(),
        }));

    let video = SyntheticVideo::new(1_000, 25.0);
    let releases = video.release_counter();
    let result = analyzer(config).run(video);

    assert!(matches!(result, Err(FrameScanError::Cancelled)));
    assert!(token.is_cancelled());
    assert_eq!(releases.count(), 1);
}

#[test]
fn nan_threshold_is_rejected_before_decoding() {
    let video = SyntheticVideo::new(10, 25.0);
    let releases = video.release_counter();
    let mut analyzer = analyzer(PipelineConfig::new().with_confidence_threshold(f32::NAN));

    assert!(matches!(
        analyzer.run(video),
        Err(FrameScanError::InvalidConfiguration(_))
    ));
    assert_eq!(releases.count(), 1);
}

#[test]
fn analyzer_can_run_again() {
    let mut analyzer = analyzer(PipelineConfig::new());
    assert!(analyzer.run(SyntheticVideo::new(10, 25.0).failing_at(3)).is_err());

    let analysis = analyzer
        .run(SyntheticVideo::new(10, 25.0))
        .expect("second run succeeds");
    assert_eq!(analysis.sampled_indices, vec![0, 5]);
    assert_eq!(analyzer.stage(), PipelineStage::Closed);
}

// ── Progress and output ────────────────────────────────────────────

#[test]
fn progress_reports_sampling_and_detection() {
    let recorder = Arc::new(Recorder::default());
    let config = PipelineConfig::new()
        .with_progress(recorder.clone())
        .with_batch_size(10);

    analyzer(config)
        .run(SyntheticVideo::new(100, 25.0))
        .expect("analysis succeeds");

    let updates = recorder.updates.lock().expect("progress lock");
    let sampling: Vec<&ProgressInfo> = updates
        .iter()
        .filter(|info| info.operation == OperationType::Sampling)
        .collect();
    let detection: Vec<&ProgressInfo> = updates
        .iter()
        .filter(|info| info.operation == OperationType::Detection)
        .collect();

    let last = sampling.last().expect("sampling updates");
    assert_eq!(last.current, 100);
    assert_eq!(last.total, Some(100));
    assert_eq!(last.percentage, Some(100.0));
    assert!(sampling.iter().all(|info| info.percentage <= Some(100.0)));

    let last = detection.last().expect("detection updates");
    assert_eq!(last.current, 20);
    assert_eq!(last.total, None);
}

#[test]
fn summary_json_labels_estimates() {
    let analysis = analyzer(PipelineConfig::new())
        .run(SyntheticVideo::new(100, 25.0))
        .expect("analysis succeeds");

    let summary: serde_json::Value = serde_json::from_str(
        &analysis
            .summary_json(ConfidenceStyle::Percent)
            .expect("serializable"),
    )
    .expect("valid JSON");

    assert_eq!(summary["provenance"], "estimated");
    assert_eq!(summary["sample_stride"], 5);
    assert_eq!(summary["sampled_frames"], 20);
    assert_eq!(summary["video"]["decoded_frames"], 100);
    assert_eq!(summary["video"]["codec"], "synthetic");
    assert_eq!(summary["segments"].as_array().map(Vec::len), Some(2));
    assert_eq!(summary["rows"].as_array().map(Vec::len), Some(20));
    assert!(
        summary["rows"][0]["confidence"]
            .as_str()
            .is_some_and(|text| text.ends_with('%'))
    );
}
