//! Internal conversion helpers.
//!
//! Pixel-data copying and timestamp conversion shared by the FFmpeg-backed
//! source.

use std::time::Duration;

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy pixel data from an FFmpeg video frame into a tightly-packed buffer.
///
/// FFmpeg frames often carry per-row padding (stride > width × bpp). This
/// strips it so the result can go straight to `RgbImage::from_raw`.
pub(crate) fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let expected_stride = (width as usize) * bytes_per_pixel;
    let data = video_frame.data(0);

    if stride == expected_stride {
        data[..expected_stride * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(expected_stride * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + expected_stride]);
        }
        buffer
    }
}

/// Rescale a PTS value from a stream time base to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    if time_base.denominator() == 0 {
        return 0.0;
    }
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Rescale a PTS value to a [`Duration`], clamping negative values to zero.
pub(crate) fn pts_to_duration(pts: i64, time_base: Rational) -> Duration {
    Duration::from_secs_f64(pts_to_seconds(pts, time_base).max(0.0))
}

/// Convert a [`Duration`] to a seek target in AV_TIME_BASE (microseconds).
///
/// `Input::seek` seeks across all streams (`stream_index = -1`), which takes
/// AV_TIME_BASE rather than any stream's own time base.
pub(crate) fn duration_to_seek_timestamp(duration: Duration) -> i64 {
    i64::try_from(duration.as_micros()).unwrap_or(i64::MAX)
}

/// Compute frames per second from a rational rate, or `None` if it is
/// degenerate.
pub(crate) fn rational_to_fps(rate: Rational) -> Option<f64> {
    (rate.numerator() > 0 && rate.denominator() > 0)
        .then(|| rate.numerator() as f64 / rate.denominator() as f64)
}
