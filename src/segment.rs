//! Segment summaries.
//!
//! The sampled range is split into a handful of equal-width, contiguous
//! segments. The number of segments follows the number of sampled frames:
//! `max(1, sampled / group_size)`. This is a coarse grouping, not shot
//! detection; per-segment object counts are [`Estimate`]s.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::time::Duration;

use serde::Serialize;

use crate::{conversion::frames_to_duration, detect::DetectionRecord, error::FrameScanError};

/// A value derived heuristically rather than measured.
///
/// Renders as `~N (estimate)` so it cannot be mistaken for a detection
/// result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Estimate<T>(T);

impl<T: Copy> Estimate<T> {
    /// Wrap a heuristic value.
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// The estimated value.
    pub fn value(&self) -> T {
        self.0
    }
}

impl<T: Display> Display for Estimate<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "~{} (estimate)", self.0)
    }
}

/// A contiguous run of frames grouped for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    /// 1-based, sequential.
    pub id: u32,
    /// First frame index (inclusive).
    pub start_frame: u64,
    /// One past the last frame index.
    pub end_frame: u64,
    /// `(end_frame - start_frame) / fps`, zero when fps is zero.
    #[serde(serialize_with = "serialize_seconds")]
    pub duration: Duration,
    /// Highest object count reported for a sampled frame in this segment.
    pub estimated_objects: Estimate<u32>,
}

impl Segment {
    /// Number of source frames covered.
    pub fn frame_count(&self) -> u64 {
        self.end_frame - self.start_frame
    }

    /// Whether `frame_index` falls inside the segment.
    pub fn contains(&self, frame_index: u64) -> bool {
        (self.start_frame..self.end_frame).contains(&frame_index)
    }
}

fn serialize_seconds<S: serde::Serializer>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

/// `max(1, sampled_count / group_size)`.
///
/// A `group_size` of zero is treated as one.
pub fn segment_count(sampled_count: u64, group_size: u64) -> u64 {
    (sampled_count / group_size.max(1)).max(1)
}

/// Partition `[0, total_frames)` into segments.
///
/// `sampled_indices` decides how many segments there are, capped at one
/// per frame; `records` supply the per-segment object estimate (records
/// outside every segment are ignored).
///
/// # Errors
///
/// [`FrameScanError::InvalidConfiguration`] when `group_size` is zero or
/// the segment ids would overflow `u32`.
///
/// # Example
///
/// ```
/// use framescan::summarize;
///
/// let sampled: Vec<u64> = (0..100).step_by(5).collect();
/// let segments = summarize(&sampled, &[], 100, 25.0, 10)?;
/// assert_eq!(segments.len(), 2);
/// assert_eq!((segments[1].start_frame, segments[1].end_frame), (50, 100));
/// # Ok::<(), framescan::FrameScanError>(())
/// ```
pub fn summarize(
    sampled_indices: &[u64],
    records: &[DetectionRecord],
    total_frames: u64,
    frames_per_second: f64,
    group_size: u64,
) -> Result<Vec<Segment>, FrameScanError> {
    if group_size == 0 {
        return Err(FrameScanError::InvalidConfiguration(
            "scene group size must be greater than zero".to_string(),
        ));
    }

    // Never more segments than frames, so no span is empty.
    let count = segment_count(sampled_indices.len() as u64, group_size).min(total_frames.max(1));
    let width = total_frames / count;

    let last_id = u32::try_from(count).map_err(|_| {
        FrameScanError::InvalidConfiguration(format!(
            "{count} segments exceed the supported maximum"
        ))
    })?;

    let mut segments = Vec::with_capacity(count as usize);
    for (position, id) in (0..count).zip(1..=last_id) {
        let start_frame = position * width;
        let end_frame = if position + 1 == count {
            total_frames
        } else {
            start_frame + width
        };
        let objects = records
            .iter()
            .filter(|record| (start_frame..end_frame).contains(&record.frame_index))
            .map(|record| record.object_count)
            .max()
            .unwrap_or(0);

        segments.push(Segment {
            id,
            start_frame,
            end_frame,
            duration: frames_to_duration(end_frame - start_frame, frames_per_second),
            estimated_objects: Estimate::new(objects),
        });
    }

    log::debug!(
        "Summarized {} sampled frames over {} frames into {} segment(s)",
        sampled_indices.len(),
        total_frames,
        segments.len()
    );

    Ok(segments)
}
