//! Video source reading.
//!
//! [`VideoHandle`] opens a video container through FFmpeg, caches its
//! [`VideoMetadata`], and decodes single frames at arbitrary timestamps.
//! The decode capability is expressed by the [`FrameSource`] trait so that
//! the sampler and pipeline work with any source of pictures.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    fs,
    path::Path,
    time::Duration,
};

use ffmpeg_next::{
    codec::context::Context as CodecContext,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, RgbImage};

use crate::{
    configuration::FrameOutputOptions,
    conversion,
    error::FramedeckError,
    frame::DecodedImage,
    metadata::{VideoMetadata, format_modified, human_readable_size},
};

/// Anything that can produce a picture for a timestamp.
///
/// Implemented by [`VideoHandle`]; tests and alternative backends implement
/// it to drive the [`FrameSampler`](crate::FrameSampler) and
/// [`Pipeline`](crate::Pipeline) without FFmpeg.
pub trait FrameSource {
    /// Total duration of the source.
    fn duration(&self) -> Duration;

    /// Nominal frames per second, zero if unknown.
    fn frame_rate(&self) -> f64;

    /// Decode the picture shown at `timestamp`.
    ///
    /// Implementations must fail with [`FramedeckError::OutOfRange`] when
    /// `timestamp` exceeds [`duration`](FrameSource::duration), and return the
    /// last decodable picture with `clamped = true` when the timestamp is
    /// within the duration but past the final frame.
    fn decode_at(&mut self, timestamp: Duration) -> Result<DecodedImage, FramedeckError>;
}

/// An opened video file.
///
/// Holds the FFmpeg demuxer for its whole lifetime; dropping the handle
/// closes the file. Decoders are created per [`decode_at`](FrameSource::decode_at)
/// call and released before it returns.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
///
/// use framedeck::{FrameSource, VideoHandle};
///
/// let mut handle = VideoHandle::open("input.mp4")?;
/// let picture = handle.decode_at(Duration::from_secs(30))?;
/// picture.image.save("frame_30s.png").ok();
/// # Ok::<(), framedeck::FramedeckError>(())
/// ```
pub struct VideoHandle {
    input_context: Input,
    video_stream_index: usize,
    /// First PTS of the video stream, subtracted from decoded PTS values.
    stream_origin: i64,
    metadata: VideoMetadata,
    frame_output: FrameOutputOptions,
}

impl Debug for VideoHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoHandle")
            .field("metadata", &self.metadata)
            .field("video_stream_index", &self.video_stream_index)
            .field("frame_output", &self.frame_output)
            .finish_non_exhaustive()
    }
}

impl VideoHandle {
    /// Open a video file, decoding frames at source resolution.
    ///
    /// # Errors
    ///
    /// Returns [`FramedeckError::SourceUnreadable`] if the path does not
    /// exist, is not a recognised container, or has no decodable video
    /// stream.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FramedeckError> {
        Self::open_with_options(path, FrameOutputOptions::default())
    }

    /// Open a video file, decoding frames at the size `frame_output` resolves
    /// to.
    ///
    /// # Errors
    ///
    /// Same as [`open`](VideoHandle::open).
    pub fn open_with_options<P: AsRef<Path>>(
        path: P,
        frame_output: FrameOutputOptions,
    ) -> Result<Self, FramedeckError> {
        let path = path.as_ref();
        let source_path = path.to_path_buf();
        let unreadable = |reason: String| FramedeckError::SourceUnreadable {
            path: source_path.clone(),
            reason,
        };

        log::debug!("Opening video source: {}", source_path.display());

        let file_metadata = fs::metadata(path).map_err(|error| unreadable(error.to_string()))?;
        if !file_metadata.is_file() {
            return Err(unreadable("not a regular file".to_string()));
        }
        let file_size = file_metadata.len();
        let modified = file_metadata.modified().ok();

        // Initialise ffmpeg (safe to call multiple times).
        ffmpeg_next::init()
            .map_err(|error| unreadable(format!("FFmpeg initialisation failed: {error}")))?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| unreadable(error.to_string()))?;

        let (
            video_stream_index,
            stream_origin,
            stream_duration,
            frames_per_second,
            width,
            height,
            codec,
        ) = {
            let stream = input_context
                .streams()
                .best(Type::Video)
                .ok_or_else(|| unreadable("no video stream found".to_string()))?;

            let decoder_context =
                CodecContext::from_parameters(stream.parameters()).map_err(|error| {
                    unreadable(format!("unsupported video codec parameters: {error}"))
                })?;
            let decoder = decoder_context
                .decoder()
                .video()
                .map_err(|error| unreadable(format!("no decoder for video stream: {error}")))?;

            if decoder.width() == 0 || decoder.height() == 0 {
                return Err(unreadable("video stream reports zero frame size".to_string()));
            }

            let frames_per_second = conversion::rational_to_fps(stream.avg_frame_rate())
                .or_else(|| conversion::rational_to_fps(stream.rate()))
                .unwrap_or(0.0);

            let start_time = stream.start_time();
            let stream_origin = if start_time == i64::MIN { 0 } else { start_time };

            let stream_duration = if stream.duration() > 0 {
                conversion::pts_to_duration(stream.duration(), stream.time_base())
            } else {
                Duration::ZERO
            };

            let codec = decoder
                .codec()
                .map(|codec| codec.name().to_string())
                .unwrap_or_else(|| "unknown".to_string());

            (
                stream.index(),
                stream_origin,
                stream_duration,
                frames_per_second,
                decoder.width(),
                decoder.height(),
                codec,
            )
        };

        // Container duration is in AV_TIME_BASE; fall back to the stream.
        let container_duration = input_context.duration();
        let duration = if container_duration > 0 {
            Duration::from_micros(container_duration as u64)
        } else {
            stream_duration
        };

        let frame_count = if frames_per_second > 0.0 {
            (duration.as_secs_f64() * frames_per_second) as u64
        } else {
            0
        };

        let metadata = VideoMetadata {
            path: source_path.clone(),
            duration,
            frames_per_second,
            frame_count,
            width,
            height,
            codec,
            format: input_context.format().name().to_string(),
            file_size,
            modified,
        };

        log::info!(
            "Opened video source: {} ({}, last modified {}, format={}, duration={:.2}s)",
            source_path.display(),
            human_readable_size(file_size),
            modified.map_or_else(|| "unknown".to_string(), format_modified),
            metadata.format,
            duration.as_secs_f64(),
        );
        log::debug!(
            "Video stream: index={}, {}x{}, {:.2} fps, codec={}, ~{} frames",
            video_stream_index,
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.codec,
            metadata.frame_count,
        );

        Ok(Self {
            input_context,
            video_stream_index,
            stream_origin,
            metadata,
            frame_output,
        })
    }

    /// Cached metadata, read once at open time.
    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// Path the video was opened from.
    pub fn path(&self) -> &Path {
        &self.metadata.path
    }
}

impl FrameSource for VideoHandle {
    fn duration(&self) -> Duration {
        self.metadata.duration
    }

    fn frame_rate(&self) -> f64 {
        self.metadata.frames_per_second
    }

    /// Seek to the keyframe at or before `timestamp` and decode forward.
    ///
    /// Returns the first frame presented no earlier than half a frame period
    /// before `timestamp`. If the stream ends first, the last decoded frame is
    /// returned with `clamped = true`.
    fn decode_at(&mut self, timestamp: Duration) -> Result<DecodedImage, FramedeckError> {
        let duration = self.metadata.duration;
        if timestamp > duration {
            return Err(FramedeckError::OutOfRange {
                timestamp,
                duration,
            });
        }

        let stream = self
            .input_context
            .stream(self.video_stream_index)
            .ok_or_else(|| {
                FramedeckError::decode(timestamp, "video stream is no longer available")
            })?;
        let time_base = stream.time_base();
        let decoder_context = CodecContext::from_parameters(stream.parameters())
            .map_err(|e| FramedeckError::decode(timestamp, e))?;
        let mut decoder = decoder_context
            .decoder()
            .video()
            .map_err(|e| FramedeckError::decode(timestamp, e))?;

        let (target_width, target_height) = self
            .frame_output
            .resolve_dimensions(self.metadata.width, self.metadata.height);
        let mut scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            target_width,
            target_height,
            ScalingFlags::BILINEAR,
        )
        .map_err(|e| FramedeckError::decode(timestamp, e))?;

        let seek_target = conversion::duration_to_seek_timestamp(timestamp);
        self.input_context
            .seek(seek_target, ..seek_target)
            .map_err(|e| FramedeckError::decode(timestamp, format!("seek failed: {e}")))?;

        let tolerance = self
            .metadata
            .frame_period()
            .map(|period| period / 2)
            .unwrap_or(Duration::ZERO);
        let threshold = timestamp.saturating_sub(tolerance);

        let mut decoded = VideoFrame::empty();
        let mut previous = VideoFrame::empty();
        let mut previous_at: Option<Duration> = None;
        let video_stream_index = self.video_stream_index;
        let stream_origin = self.stream_origin;
        let frame_time = |frame: &VideoFrame| {
            let pts = frame.timestamp().or_else(|| frame.pts()).unwrap_or(0);
            conversion::pts_to_duration(pts.saturating_sub(stream_origin), time_base)
        };

        for (stream, packet) in self.input_context.packets() {
            if stream.index() != video_stream_index {
                continue;
            }

            decoder
                .send_packet(&packet)
                .map_err(|e| FramedeckError::decode(timestamp, e))?;

            while decoder.receive_frame(&mut decoded).is_ok() {
                let presented_at = frame_time(&decoded);
                if presented_at >= threshold {
                    let image = scale_to_image(&mut scaler, &decoded, target_width, target_height)
                        .map_err(|reason| FramedeckError::decode(timestamp, reason))?;
                    return Ok(DecodedImage {
                        image,
                        presented_at,
                        clamped: false,
                    });
                }
                std::mem::swap(&mut decoded, &mut previous);
                previous_at = Some(presented_at);
            }
        }

        // Drain whatever the decoder still holds.
        decoder.send_eof().map_err(|e| FramedeckError::decode(timestamp, e))?;
        while decoder.receive_frame(&mut decoded).is_ok() {
            let presented_at = frame_time(&decoded);
            if presented_at >= threshold {
                let image = scale_to_image(&mut scaler, &decoded, target_width, target_height)
                    .map_err(|reason| FramedeckError::decode(timestamp, reason))?;
                return Ok(DecodedImage {
                    image,
                    presented_at,
                    clamped: false,
                });
            }
            std::mem::swap(&mut decoded, &mut previous);
            previous_at = Some(presented_at);
        }

        match previous_at {
            Some(presented_at) => {
                log::debug!(
                    "Clamped {:?} to last decodable frame at {:?}",
                    timestamp,
                    presented_at
                );
                let image = scale_to_image(&mut scaler, &previous, target_width, target_height)
                    .map_err(|reason| FramedeckError::decode(timestamp, reason))?;
                Ok(DecodedImage {
                    image,
                    presented_at,
                    clamped: true,
                })
            }
            None => Err(FramedeckError::decode(
                timestamp,
                "no frame could be decoded after the seek point",
            )),
        }
    }
}

/// Convert a decoded frame to an RGB8 [`DynamicImage`].
fn scale_to_image(
    scaler: &mut ScalingContext,
    frame: &VideoFrame,
    width: u32,
    height: u32,
) -> Result<DynamicImage, String> {
    let mut rgb_frame = VideoFrame::empty();
    scaler
        .run(frame, &mut rgb_frame)
        .map_err(|error| format!("pixel conversion failed: {error}"))?;
    let buffer = conversion::frame_to_buffer(&rgb_frame, width, height, 3);
    let rgb_image = RgbImage::from_raw(width, height, buffer)
        .ok_or_else(|| "decoded frame data does not match its dimensions".to_string())?;
    Ok(DynamicImage::ImageRgb8(rgb_image))
}
