//! Segment summarizer tests.

use std::time::Duration;

use framescan::{
    Confidence, DetectionRecord, Estimate, FrameScanError, Segment, segment_count, summarize,
};

fn record(frame_index: u64, object_count: u32) -> DetectionRecord {
    DetectionRecord {
        frame_index,
        object_count,
        primary_class: "person".to_string(),
        confidence: Confidence::new(0.9),
        detections: Vec::new(),
    }
}

fn sampled(total_frames: u64, stride: u64) -> Vec<u64> {
    (0..total_frames).step_by(stride as usize).collect()
}

fn assert_partition(segments: &[Segment], total_frames: u64) {
    assert!(!segments.is_empty());
    assert_eq!(segments[0].start_frame, 0);
    assert_eq!(segments[segments.len() - 1].end_frame, total_frames);
    for (position, segment) in segments.iter().enumerate() {
        assert_eq!(segment.id, position as u32 + 1);
        assert!(segment.start_frame <= segment.end_frame);
    }
    for pair in segments.windows(2) {
        assert_eq!(pair[0].end_frame, pair[1].start_frame, "gap or overlap");
    }
}

// ── Partitioning ───────────────────────────────────────────────────

#[test]
fn segments_partition_the_frame_range() {
    for total_frames in [1_u64, 9, 100, 101, 997, 5_000] {
        for (stride, group) in [(1, 1), (5, 10), (3, 7), (10, 2), (50, 100)] {
            let indices = sampled(total_frames, stride);
            let segments = summarize(&indices, &[], total_frames, 25.0, group)
                .expect("valid group size");

            assert_eq!(
                segments.len() as u64,
                segment_count(indices.len() as u64, group),
                "T={total_frames}, s={stride}, g={group}",
            );
            assert_partition(&segments, total_frames);
        }
    }
}

#[test]
fn segment_count_formula() {
    assert_eq!(segment_count(0, 10), 1);
    assert_eq!(segment_count(9, 10), 1);
    assert_eq!(segment_count(20, 10), 2);
    assert_eq!(segment_count(29, 10), 2);
    assert_eq!(segment_count(30, 10), 3);
    assert_eq!(segment_count(5, 0), 5, "zero group size acts as one");
}

#[test]
fn hundred_frames_at_twenty_five_fps() {
    let indices = sampled(100, 5);
    let segments = summarize(&indices, &[], 100, 25.0, 10).expect("valid group size");

    assert_eq!(segments.len(), 2);
    assert_eq!((segments[0].start_frame, segments[0].end_frame), (0, 50));
    assert_eq!((segments[1].start_frame, segments[1].end_frame), (50, 100));
    assert_eq!(segments[0].duration, Duration::from_secs(2));

    let total: Duration = segments.iter().map(|segment| segment.duration).sum();
    assert_eq!(total, Duration::from_secs(4));
}

#[test]
fn last_segment_absorbs_the_remainder() {
    let indices = sampled(103, 1);
    let segments = summarize(&indices, &[], 103, 25.0, 25).expect("valid group size");

    assert_eq!(segments.len(), 4);
    assert_eq!(segments[0].frame_count(), 25);
    assert_eq!(segments[3].frame_count(), 28);
}

#[test]
fn single_frame_video_has_one_segment() {
    let segments = summarize(&[0], &[record(0, 2)], 1, 30.0, 10).expect("valid group size");

    assert_eq!(segments.len(), 1);
    assert_eq!((segments[0].start_frame, segments[0].end_frame), (0, 1));
    assert!(segments[0].contains(0));
    assert!(!segments[0].contains(1));
}

#[test]
fn empty_video_has_one_empty_segment() {
    let segments = summarize(&[], &[], 0, 25.0, 10).expect("valid group size");

    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].frame_count(), 0);
    assert_eq!(segments[0].duration, Duration::ZERO);
    assert_eq!(segments[0].estimated_objects.value(), 0);
}

#[test]
fn more_sampled_indices_than_frames_never_yield_empty_segments() {
    let indices: Vec<u64> = (0..100).collect();
    let segments = summarize(&indices, &[], 10, 25.0, 1).expect("valid group size");

    assert_eq!(segments.len(), 10);
    assert!(segments.iter().all(|segment| segment.frame_count() == 1));
    assert_partition(&segments, 10);

    let segments = summarize(&indices, &[], 0, 25.0, 1).expect("valid group size");
    assert_eq!(segments.len(), 1);
    assert_partition(&segments, 0);
}

// ── Durations and estimates ────────────────────────────────────────

#[test]
fn zero_frame_rate_gives_zero_durations() {
    let indices = sampled(100, 5);
    let segments = summarize(&indices, &[], 100, 0.0, 10).expect("valid group size");
    assert!(segments.iter().all(|segment| segment.duration == Duration::ZERO));
}

#[test]
fn estimate_is_the_highest_count_inside_the_segment() {
    let indices = sampled(100, 5);
    let records = [record(0, 3), record(25, 1), record(60, 5), record(95, 2)];
    let segments = summarize(&indices, &records, 100, 25.0, 10).expect("valid group size");

    assert_eq!(segments[0].estimated_objects, Estimate::new(3));
    assert_eq!(segments[1].estimated_objects, Estimate::new(5));
}

#[test]
fn estimate_renders_as_an_estimate() {
    assert_eq!(Estimate::new(4_u32).to_string(), "~4 (estimate)");
}

#[test]
fn segment_serializes_seconds_and_bare_estimate() {
    let segments = summarize(&sampled(50, 5), &[record(10, 4)], 50, 25.0, 10)
        .expect("valid group size");
    let value = serde_json::to_value(&segments[0]).expect("serializable");

    assert_eq!(value["id"], 1);
    assert_eq!(value["duration"], 2.0);
    assert_eq!(value["estimated_objects"], 4);
}

#[test]
fn zero_group_size_is_rejected() {
    let result = summarize(&[0, 5], &[], 10, 25.0, 0);
    assert!(matches!(
        result,
        Err(FrameScanError::InvalidConfiguration(_))
    ));
}
