//! Lazy, fixed-interval frame sampling.
//!
//! [`FrameSampler`] implements [`Iterator`] and decodes one frame per call to
//! [`next()`](Iterator::next), at timestamps `0, k, 2k, ...` up to and
//! including the source duration. Only the frame being handed out is held in
//! memory, however long the video is.
//!
//! Create a sampler with [`sample`].
//!
//! # Example
//!
//! ```no_run
//! use framedeck::{SampleRequest, VideoHandle, sample};
//!
//! let mut handle = VideoHandle::open("input.mp4")?;
//! let request = SampleRequest::new(30.0)?;
//!
//! for result in sample(&mut handle, request) {
//!     let frame = result?;
//!     frame.image.save(format!("frame_{:03}.png", frame.index)).ok();
//! }
//! # Ok::<(), framedeck::FramedeckError>(())
//! ```

use std::time::Duration;

use crate::error::FramedeckError;
use crate::frame::Frame;
use crate::source::FrameSource;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// A validated sampling interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRequest {
    interval: Duration,
    seconds: f64,
}

impl SampleRequest {
    /// Build a request for one frame every `seconds`.
    ///
    /// # Errors
    ///
    /// Returns [`FramedeckError::InvalidInterval`] if `seconds` is zero,
    /// negative, NaN, infinite, or rounds to less than one nanosecond.
    pub fn new(seconds: f64) -> Result<Self, FramedeckError> {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(FramedeckError::InvalidInterval(seconds));
        }
        let interval = Duration::try_from_secs_f64(seconds)
            .map_err(|_| FramedeckError::InvalidInterval(seconds))?;
        if interval.is_zero() {
            return Err(FramedeckError::InvalidInterval(seconds));
        }
        Ok(Self { interval, seconds })
    }

    /// The interval between sampled timestamps.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// The interval as it was requested, in seconds.
    pub fn seconds(&self) -> f64 {
        self.seconds
    }
}

/// Number of frames sampled from a source of `duration` at `interval`:
/// `floor(duration / interval) + 1`.
///
/// The first frame is always included, so the result is never zero.
///
/// ```
/// use std::time::Duration;
///
/// use framedeck::expected_frame_count;
///
/// let secs = Duration::from_secs;
/// assert_eq!(expected_frame_count(secs(65), secs(30)), 3);
/// assert_eq!(expected_frame_count(secs(10), secs(15)), 1);
/// assert_eq!(expected_frame_count(secs(60), secs(30)), 3);
/// ```
pub fn expected_frame_count(duration: Duration, interval: Duration) -> u64 {
    let interval = interval.as_nanos();
    if interval == 0 {
        return 1;
    }
    let steps = duration.as_nanos() / interval;
    u64::try_from(steps).unwrap_or(u64::MAX - 1) + 1
}

/// The timestamps [`sample`] will decode, in order.
pub fn sample_timestamps(
    duration: Duration,
    interval: Duration,
) -> impl Iterator<Item = Duration> {
    (0..expected_frame_count(duration, interval)).map(move |index| nth_timestamp(interval, index))
}

/// `index * interval`, computed in integer nanoseconds.
fn nth_timestamp(interval: Duration, index: u64) -> Duration {
    let nanos = interval.as_nanos() * u128::from(index);
    let secs = u64::try_from(nanos / NANOS_PER_SEC).unwrap_or(u64::MAX);
    Duration::new(secs, (nanos % NANOS_PER_SEC) as u32)
}

/// Start sampling `source` at the interval in `request`.
///
/// Nothing is decoded until the returned iterator is advanced. Sampling is
/// not restartable; call `sample` again to go over the source a second time.
pub fn sample<S: FrameSource + ?Sized>(
    source: &mut S,
    request: SampleRequest,
) -> FrameSampler<'_, S> {
    let duration = source.duration();
    let total = expected_frame_count(duration, request.interval);
    log::debug!(
        "Sampling every {:?} over {:?}: {} timestamps",
        request.interval,
        duration,
        total
    );
    FrameSampler {
        source,
        interval: request.interval,
        total,
        next_index: 0,
        done: false,
    }
}

/// A lazy iterator over frames sampled at a fixed interval.
///
/// Borrows its [`FrameSource`] mutably for as long as it lives.
///
/// Each item is the frame for the next timestamp, or the decode error for
/// it. After an error the sampler moves on to the following timestamp, so a
/// consumer may choose to skip the gap; stopping at the first `Err` is
/// equally valid.
///
/// When a timestamp lies past the last decodable frame, the source serves
/// that last frame instead (marked [`clamped`](Frame::clamped)) and the
/// sampler ends there, so a clamped frame is never repeated.
pub struct FrameSampler<'a, S: FrameSource + ?Sized> {
    source: &'a mut S,
    interval: Duration,
    total: u64,
    next_index: u64,
    done: bool,
}

impl<S: FrameSource + ?Sized> FrameSampler<'_, S> {
    /// Total timestamps this sampler visits if no clamp ends it early.
    pub fn expected_frames(&self) -> u64 {
        self.total
    }

    /// The sampling interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Index and timestamp that the next call to [`next()`](Iterator::next)
    /// will decode, or `None` once sampling is over.
    pub fn upcoming(&self) -> Option<(u64, Duration)> {
        (!self.done && self.next_index < self.total)
            .then(|| (self.next_index, nth_timestamp(self.interval, self.next_index)))
    }
}

impl<S: FrameSource + ?Sized> Iterator for FrameSampler<'_, S> {
    type Item = Result<Frame, FramedeckError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.next_index >= self.total {
            return None;
        }

        let index = self.next_index;
        self.next_index += 1;
        let timestamp = nth_timestamp(self.interval, index);

        match self.source.decode_at(timestamp) {
            Ok(decoded) => {
                if decoded.clamped {
                    log::debug!(
                        "Frame {} at {:?} clamped to last decodable frame; ending sampling",
                        index,
                        timestamp
                    );
                    self.done = true;
                }
                Some(Ok(Frame {
                    index,
                    timestamp,
                    image: decoded.image,
                    clamped: decoded.clamped,
                }))
            }
            Err(error) => {
                log::debug!("Frame {} at {:?} failed to decode: {}", index, timestamp, error);
                Some(Err(error))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            return (0, Some(0));
        }
        let remaining = usize::try_from(self.total - self.next_index).unwrap_or(usize::MAX);
        (remaining.min(1), Some(remaining))
    }
}

impl<S: FrameSource + ?Sized> std::iter::FusedIterator for FrameSampler<'_, S> {}
