//! Progress reporting and cancellation support.
//!
//! [`ProgressCallback`] observes a running job, [`CancellationToken`] stops
//! one cooperatively, and [`ProgressInfo`] is the snapshot delivered to the
//! callback after frames are written.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framedeck::{
//!     ExtractOptions, ExtractionJob, OutputFormat, Pipeline, ProgressCallback, ProgressInfo,
//! };
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("{pct:.1}% complete");
//!         }
//!     }
//! }
//!
//! let job = ExtractionJob::new("talk.mp4", 30.0, OutputFormat::Pdf, "talk.pdf");
//! let options = ExtractOptions::new().with_progress(Arc::new(PrintProgress));
//! Pipeline::new(options).run(&job)?;
//! # Ok::<(), framedeck::FramedeckError>(())
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

/// A snapshot of job progress.
///
/// Delivered to [`ProgressCallback::on_progress`] at a cadence controlled
/// by [`ExtractOptions::with_batch_size`](crate::ExtractOptions::with_batch_size).
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// How many frames have been handled so far (written or skipped).
    pub current: u64,
    /// Total frames the sampler is expected to produce.
    pub total: Option<u64>,
    /// Completion percentage (0.0 – 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time elapsed since the job started sampling.
    pub elapsed: Duration,
    /// Estimated time remaining, based on current throughput.
    pub estimated_remaining: Option<Duration>,
    /// Index of the frame just handled.
    pub frame_index: Option<u64>,
    /// Timestamp of the frame just handled.
    pub timestamp: Option<Duration>,
}

/// Trait for receiving progress updates while a job runs.
///
/// Callbacks are infallible: they observe but cannot halt the job. Use
/// [`CancellationToken`] to stop it.
pub trait ProgressCallback: Send + Sync {
    /// Called after every batch of handled frames and once at the end.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications. The default callback.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clones share state. The pipeline checks the token between frames, never in
/// the middle of a decode, and fails the job with
/// [`FramedeckError::Cancelled`](crate::FramedeckError::Cancelled).
///
/// # Example
///
/// ```
/// use framedeck::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// token.clone().cancel();
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

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks progress timing and emits callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    total: Option<u64>,
    current: u64,
    batch_size: u64,
    start_time: Instant,
    items_since_last_report: u64,
}

impl ProgressTracker {
    pub(crate) fn new(callback: Arc<dyn ProgressCallback>, total: Option<u64>, batch_size: u64) -> Self {
        Self {
            callback,
            total,
            current: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            items_since_last_report: 0,
        }
    }

    /// Record one handled frame and fire the callback if the batch threshold
    /// is reached.
    pub(crate) fn advance(&mut self, frame_index: u64, timestamp: Duration) {
        self.current += 1;
        self.items_since_last_report += 1;

        if self.items_since_last_report >= self.batch_size {
            self.report(Some(frame_index), Some(timestamp));
            self.items_since_last_report = 0;
        }
    }

    /// Unconditionally emit a final report.
    pub(crate) fn finish(&mut self) {
        self.report(None, None);
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    fn report(&self, frame_index: Option<u64>, timestamp: Option<Duration>) {
        let elapsed = self.start_time.elapsed();

        let percentage = self
            .total
            .filter(|&t| t > 0)
            .map(|t| ((self.current as f32 / t as f32) * 100.0).min(100.0));

        let estimated_remaining = if self.current > 0 {
            self.total.map(|t| {
                let remaining = t.saturating_sub(self.current);
                elapsed.mul_f64(remaining as f64 / self.current as f64)
            })
        } else {
            None
        };

        let info = ProgressInfo {
            current: self.current,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining,
            frame_index,
            timestamp,
        };

        self.callback.on_progress(&info);
    }
}
