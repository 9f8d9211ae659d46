//! Object detection capability.
//!
//! The pipeline never hard-codes a detector: anything implementing
//! [`ObjectDetector`] can be plugged into an
//! [`Analyzer`](crate::Analyzer). The only implementation shipped here is
//! [`PlaceholderDetector`], a deterministic stand-in whose output is an
//! ESTIMATE and is labelled [`Provenance::Estimated`] wherever it is
//! reported.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

use crate::{error::FrameScanError, sampler::SampledFrame};

/// Class reported for a frame with no detection above the threshold.
pub const FALLBACK_CLASS: &str = "background";

/// A confidence score in `[0, 1]`, held at basis-point precision.
///
/// Storing 1/10000 steps makes both renderings exact: `0.8750` and
/// `87.50%` parse back to the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "ConfidenceRepr", into = "f64")]
pub struct Confidence(u16);

impl Confidence {
    /// Basis points in a confidence of 1.0.
    pub const SCALE: u16 = 10_000;
    /// Confidence 0.
    pub const ZERO: Confidence = Confidence(0);
    /// Confidence 1.
    pub const ONE: Confidence = Confidence(Self::SCALE);

    /// Round `value` to the nearest basis point.
    ///
    /// Returns `None` for values outside `[0, 1]` or NaN.
    pub fn new(value: f64) -> Option<Self> {
        if !(0.0..=1.0).contains(&value) {
            return None;
        }
        Some(Self((value * f64::from(Self::SCALE)).round() as u16))
    }

    /// Build from basis points (`0..=10000`).
    pub fn from_basis_points(basis_points: u16) -> Option<Self> {
        (basis_points <= Self::SCALE).then_some(Self(basis_points))
    }

    /// Value in basis points.
    pub fn basis_points(self) -> u16 {
        self.0
    }

    /// Value as a fraction in `[0, 1]`.
    pub fn value(self) -> f64 {
        f64::from(self.0) / f64::from(Self::SCALE)
    }

    /// `"0.8750"`.
    pub fn to_fraction_string(self) -> String {
        format!("{}.{:04}", self.0 / Self::SCALE, self.0 % Self::SCALE)
    }

    /// `"87.50%"`.
    pub fn to_percent_string(self) -> String {
        format!("{}.{:02}%", self.0 / 100, self.0 % 100)
    }

    /// Parse either a fraction (`"0.875"`) or a percentage (`"87.5%"`).
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        match text.strip_suffix('%') {
            Some(percent) => Self::new(percent.trim().parse::<f64>().ok()? / 100.0),
            None => Self::new(text.parse::<f64>().ok()?),
        }
    }
}

impl Display for Confidence {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.to_fraction_string())
    }
}

impl From<Confidence> for f64 {
    fn from(confidence: Confidence) -> Self {
        confidence.value()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ConfidenceRepr {
    Number(f64),
    Text(String),
}

impl TryFrom<ConfidenceRepr> for Confidence {
    type Error = String;

    fn try_from(repr: ConfidenceRepr) -> Result<Self, Self::Error> {
        match repr {
            ConfidenceRepr::Number(value) => Confidence::new(value)
                .ok_or_else(|| format!("confidence {value} is outside [0, 1]")),
            ConfidenceRepr::Text(text) => {
                Confidence::parse(&text).ok_or_else(|| format!("invalid confidence {text:?}"))
            }
        }
    }
}

/// Axis-aligned box in pixel coordinates of the sampled frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// One labelled detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Class label, e.g. `"person"`.
    pub label: String,
    /// Detector confidence.
    pub confidence: Confidence,
    /// Location, when the detector provides one.
    pub bbox: Option<BoundingBox>,
}

/// Where object counts come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Produced by a real detection model.
    Detected,
    /// Produced by a heuristic or placeholder. Not a detection result.
    Estimated,
}

impl Display for Provenance {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Provenance::Detected => f.write_str("detected"),
            Provenance::Estimated => f.write_str("estimated"),
        }
    }
}

/// A pluggable object detector.
pub trait ObjectDetector {
    /// Detect objects in one sampled frame.
    fn detect_objects(&mut self, frame: &SampledFrame) -> Result<Vec<Detection>, FrameScanError>;

    /// Whether results are real detections or estimates.
    fn provenance(&self) -> Provenance;
}

impl<D: ObjectDetector + ?Sized> ObjectDetector for Box<D> {
    fn detect_objects(&mut self, frame: &SampledFrame) -> Result<Vec<Detection>, FrameScanError> {
        (**self).detect_objects(frame)
    }

    fn provenance(&self) -> Provenance {
        (**self).provenance()
    }
}

impl<D: ObjectDetector + ?Sized> ObjectDetector for &mut D {
    fn detect_objects(&mut self, frame: &SampledFrame) -> Result<Vec<Detection>, FrameScanError> {
        (**self).detect_objects(frame)
    }

    fn provenance(&self) -> Provenance {
        (**self).provenance()
    }
}

const PLACEHOLDER_LABELS: [&str; 3] = ["person", "car", "background"];

/// Deterministic placeholder detector.
///
/// Produces 1–7 detections per frame with confidences between 0.35 and
/// 0.99, derived only from the seed and the frame index. The same seed and
/// frame always give the same output. Results are estimates, not
/// detections.
///
/// ```
/// use framescan::{ObjectDetector, PlaceholderDetector, Provenance};
///
/// let detector = PlaceholderDetector::new(7);
/// assert_eq!(detector.provenance(), Provenance::Estimated);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderDetector {
    seed: u64,
}

impl Default for PlaceholderDetector {
    fn default() -> Self {
        Self::new(0x5EED)
    }
}

impl PlaceholderDetector {
    /// Detector whose output is fixed by `seed`.
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

impl ObjectDetector for PlaceholderDetector {
    fn detect_objects(&mut self, frame: &SampledFrame) -> Result<Vec<Detection>, FrameScanError> {
        let mut state = self.seed ^ frame.index.wrapping_mul(0xD1B5_4A32_D192_ED03);
        let count = 1 + splitmix64(&mut state) % 7;
        let (width, height) = frame.image.dimensions();

        let detections = (0..count)
            .map(|_| {
                let label = PLACEHOLDER_LABELS[(splitmix64(&mut state) % 3) as usize];
                let basis_points = 3_500 + (splitmix64(&mut state) % 6_401) as u16;
                let bbox = (width > 0 && height > 0).then(|| {
                    let box_width = (width / 4).max(1);
                    let box_height = (height / 4).max(1);
                    BoundingBox {
                        x: (splitmix64(&mut state) % u64::from(width - box_width + 1)) as u32,
                        y: (splitmix64(&mut state) % u64::from(height - box_height + 1)) as u32,
                        width: box_width,
                        height: box_height,
                    }
                });
                Detection {
                    label: label.to_string(),
                    confidence: Confidence(basis_points),
                    bbox,
                }
            })
            .collect();

        Ok(detections)
    }

    fn provenance(&self) -> Provenance {
        Provenance::Estimated
    }
}

/// Detector output for one sampled frame, reduced for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionRecord {
    /// Index of the sampled frame.
    pub frame_index: u64,
    /// Detections at or above the threshold.
    pub object_count: u32,
    /// Label of the most confident counted detection, or [`FALLBACK_CLASS`].
    pub primary_class: String,
    /// Confidence of that detection; `None` when nothing was counted.
    pub confidence: Option<Confidence>,
    /// The counted detections, in detector order.
    pub detections: Vec<Detection>,
}

impl DetectionRecord {
    /// Keep detections with confidence `>= threshold` and summarise them.
    ///
    /// Ties for the most confident detection go to the earliest one.
    pub fn from_detections(frame_index: u64, detections: Vec<Detection>, threshold: f32) -> Self {
        let threshold = Confidence::new(f64::from(threshold.clamp(0.0, 1.0)))
            .unwrap_or(Confidence::ZERO);
        let kept: Vec<Detection> = detections
            .into_iter()
            .filter(|detection| detection.confidence >= threshold)
            .collect();

        let primary = kept.iter().rev().max_by_key(|detection| detection.confidence);
        let primary_class = primary
            .map(|detection| detection.label.clone())
            .unwrap_or_else(|| FALLBACK_CLASS.to_string());
        let confidence = primary.map(|detection| detection.confidence);

        Self {
            frame_index,
            object_count: kept.len() as u32,
            primary_class,
            confidence,
            detections: kept,
        }
    }
}
