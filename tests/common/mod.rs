//! A frame source that paints pictures instead of decoding them, so pipeline
//! behaviour can be tested without FFmpeg fixtures.

#![allow(dead_code)]

use std::time::Duration;

use framedeck::{DecodedImage, FrameSource, FramedeckError};
use image::{DynamicImage, Rgb, RgbImage};

pub struct SyntheticSource {
    pub duration: Duration,
    pub frame_rate: f64,
    pub width: u32,
    pub height: u32,
    /// Timestamps whose decode fails.
    pub failing: Vec<Duration>,
    /// Presentation time of the last decodable frame, if earlier than the
    /// duration.
    pub last_frame: Option<Duration>,
    /// Every timestamp `decode_at` was called with, in call order.
    pub requested: Vec<Duration>,
}

impl SyntheticSource {
    pub fn new(duration_secs: u64) -> Self {
        Self::with_size(duration_secs, 64, 36)
    }

    pub fn with_size(duration_secs: u64, width: u32, height: u32) -> Self {
        Self {
            duration: Duration::from_secs(duration_secs),
            frame_rate: 25.0,
            width,
            height,
            failing: Vec::new(),
            last_frame: None,
            requested: Vec::new(),
        }
    }

    pub fn failing_at(mut self, seconds: u64) -> Self {
        self.failing.push(Duration::from_secs(seconds));
        self
    }

    pub fn last_frame_at(mut self, last_frame: Duration) -> Self {
        self.last_frame = Some(last_frame);
        self
    }
}

impl FrameSource for SyntheticSource {
    fn duration(&self) -> Duration {
        self.duration
    }

    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    fn decode_at(&mut self, timestamp: Duration) -> Result<DecodedImage, FramedeckError> {
        if timestamp > self.duration {
            return Err(FramedeckError::OutOfRange {
                timestamp,
                duration: self.duration,
            });
        }
        self.requested.push(timestamp);

        if self.failing.contains(&timestamp) {
            return Err(FramedeckError::Decode {
                timestamp,
                reason: "corrupt packet".to_string(),
            });
        }

        let (presented_at, clamped) = match self.last_frame {
            Some(last) if timestamp > last => (last, true),
            _ => (timestamp, false),
        };
        let shade = (presented_at.as_secs() % 256) as u8;
        let image = RgbImage::from_fn(self.width, self.height, |x, y| {
            Rgb([shade, (x % 256) as u8, (y % 256) as u8])
        });

        Ok(DecodedImage {
            image: DynamicImage::ImageRgb8(image),
            presented_at,
            clamped,
        })
    }
}

/// Lets a test keep the source after a pipeline run to inspect `requested`.
impl FrameSource for &mut SyntheticSource {
    fn duration(&self) -> Duration {
        (**self).duration()
    }

    fn frame_rate(&self) -> f64 {
        (**self).frame_rate()
    }

    fn decode_at(&mut self, timestamp: Duration) -> Result<DecodedImage, FramedeckError> {
        (**self).decode_at(timestamp)
    }
}

/// A solid-colour frame for writer tests.
pub fn frame(index: u64, seconds: u64, width: u32, height: u32) -> framedeck::Frame {
    framedeck::Frame {
        index,
        timestamp: Duration::from_secs(seconds),
        image: DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([40, 90, 160]))),
        clamped: false,
    }
}
