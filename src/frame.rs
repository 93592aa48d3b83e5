//! Decoded frames as they travel from the sampler to a writer.

use std::time::Duration;

use image::DynamicImage;

/// A picture returned by [`FrameSource::decode_at`](crate::FrameSource::decode_at).
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// The decoded raster, RGB8.
    pub image: DynamicImage,
    /// Presentation time of the frame that was actually decoded.
    pub presented_at: Duration,
    /// `true` when the requested timestamp lay past the last decodable frame
    /// and this is that last frame instead.
    pub clamped: bool,
}

/// One sampled frame.
///
/// Produced by [`FrameSampler`](crate::FrameSampler) and moved into a
/// [`DocumentWriter`](crate::DocumentWriter), which drops it once encoded.
#[derive(Debug, Clone)]
pub struct Frame {
    /// 0-based ordinal in the sampled sequence.
    pub index: u64,
    /// Nominal sample time, `index * interval`.
    pub timestamp: Duration,
    /// The decoded picture.
    pub image: DynamicImage,
    /// Set when the picture is the last decodable frame standing in for a
    /// timestamp past it.
    pub clamped: bool,
}

impl Frame {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
