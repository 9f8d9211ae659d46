//! Progress reporting and cancellation support.
//!
//! [`ProgressCallback`] observes a run, [`CancellationToken`] stops one.
//! The sampler checks the token before every frame read, so a cancelled run
//! ends after at most one more decoded frame and its video is closed
//! immediately.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framescan::{
//!     Analyzer, PipelineConfig, PlaceholderDetector, ProgressCallback, ProgressInfo,
//! };
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("[{:?}] {pct:.1}% complete", info.operation);
//!         }
//!     }
//! }
//!
//! let config = PipelineConfig::new()
//!     .with_progress(Arc::new(PrintProgress))
//!     .with_batch_size(25);
//! let mut analyzer = Analyzer::new(config, PlaceholderDetector::default());
//! let analysis = analyzer.analyze_file("input.mp4")?;
//! # Ok::<(), framescan::FrameScanError>(())
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

/// The kind of work a progress report refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Decoding the video and keeping every Nth frame. Counts decoded frames.
    Sampling,
    /// Running the object detector. Counts sampled frames.
    Detection,
}

/// A snapshot of progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// What kind of work is being performed.
    pub operation: OperationType,
    /// Items processed so far.
    pub current: u64,
    /// Total items expected, if known.
    pub total: Option<u64>,
    /// Completion percentage (0.0 – 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Time elapsed since the operation started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on current throughput.
    pub estimated_remaining: Option<Duration>,
    /// Frame index currently being processed.
    pub current_frame: Option<u64>,
}

/// Receives progress updates during a run.
///
/// Callbacks observe but cannot halt the run; use [`CancellationToken`]
/// for that.
pub trait ProgressCallback: Send + Sync {
    /// Called every `batch_size` items and once when an operation finishes.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications. The default callback.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clones share state, so a token handed to a pipeline can be cancelled
/// from another thread.
///
/// ```
/// use framescan::CancellationToken;
///
/// let token = CancellationToken::new();
/// let shared = token.clone();
/// shared.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation. All clones observe it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks timing for one operation and emits callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    total: Option<u64>,
    current: u64,
    batch_size: u64,
    start_time: Instant,
    items_since_last_report: u64,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        total: Option<u64>,
        batch_size: u64,
    ) -> Self {
        Self {
            callback,
            operation,
            total: total.filter(|&total| total > 0),
            current: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            items_since_last_report: 0,
        }
    }

    /// Record one completed item, reporting when the batch fills up.
    pub(crate) fn advance(&mut self, frame_index: Option<u64>) {
        self.current += 1;
        self.items_since_last_report += 1;

        if self.items_since_last_report >= self.batch_size {
            self.report(frame_index);
            self.items_since_last_report = 0;
        }
    }

    /// Emit a final report regardless of the batch position.
    pub(crate) fn finish(&mut self) {
        self.report(None);
    }

    fn report(&self, frame_index: Option<u64>) {
        let elapsed = self.start_time.elapsed();

        // Container frame counts are estimates; never report past 100%.
        let percentage = self
            .total
            .map(|total| (self.current as f32 / total as f32 * 100.0).min(100.0));

        let estimated_remaining = if self.current > 0 {
            self.total.map(|total| {
                let remaining = total.saturating_sub(self.current);
                elapsed.mul_f64(remaining as f64 / self.current as f64)
            })
        } else {
            None
        };

        self.callback.on_progress(&ProgressInfo {
            operation: self.operation,
            current: self.current,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining,
            current_frame: frame_index,
        });
    }
}
