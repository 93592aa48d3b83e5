//! Job configuration.
//!
//! [`ExtractOptions`] is a builder that threads progress callbacks,
//! cancellation tokens, frame sizing and document layout settings through
//! the pipeline without polluting every function signature.
//!
//! # Example
//!
//! ```no_run
//! use framedeck::{CancellationToken, CaptionStyle, ExtractOptions, SlideSize};
//!
//! let token = CancellationToken::new();
//! let options = ExtractOptions::new()
//!     .with_cancellation(token.clone())
//!     .with_caption_style(CaptionStyle::Numbered)
//!     .with_slide_size(SlideSize::Standard)
//!     .with_resolution(Some(1280), None);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::caption::CaptionStyle;
use crate::layout::SlideSize;
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};

/// JPEG quality used for embedded frames unless overridden.
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Frame output settings for decoding.
///
/// When no dimensions are set the source resolution is used. Setting one
/// dimension together with
/// [`maintain_aspect_ratio`](FrameOutputOptions::maintain_aspect_ratio)
/// computes the other automatically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameOutputOptions {
    /// Target width. `None` keeps the source width.
    pub width: Option<u32>,
    /// Target height. `None` keeps the source height.
    pub height: Option<u32>,
    /// When `true` and only one dimension is specified, the other is
    /// computed to preserve the source aspect ratio.
    pub maintain_aspect_ratio: bool,
}

impl Default for FrameOutputOptions {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            maintain_aspect_ratio: true,
        }
    }
}

impl FrameOutputOptions {
    /// Resolve the final output dimensions given the source size.
    ///
    /// Returns `(width, height)`, each at least 1.
    pub fn resolve_dimensions(&self, source_width: u32, source_height: u32) -> (u32, u32) {
        let (width, height) = match (self.width, self.height) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) if self.maintain_aspect_ratio && source_width > 0 => {
                let ratio = w as f64 / source_width as f64;
                (w, (source_height as f64 * ratio).round() as u32)
            }
            (Some(w), None) => (w, source_height),
            (None, Some(h)) if self.maintain_aspect_ratio && source_height > 0 => {
                let ratio = h as f64 / source_height as f64;
                ((source_width as f64 * ratio).round() as u32, h)
            }
            (None, Some(h)) => (source_width, h),
            (None, None) => (source_width, source_height),
        };
        (width.max(1), height.max(1))
    }
}

/// Layout and encoding settings shared by every document writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOptions {
    /// Caption drawn under each frame.
    pub caption_style: CaptionStyle,
    /// JPEG quality (1–100) for embedded frame images.
    pub jpeg_quality: u8,
    /// Slide dimensions for slide decks. Ignored by paginated writers.
    pub slide_size: SlideSize,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            caption_style: CaptionStyle::Timestamp,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            slide_size: SlideSize::Widescreen,
        }
    }
}

/// Configuration for a pipeline run.
///
/// All fields have defaults: no progress callback, no cancellation, batch
/// size 1, source resolution, timestamp captions, JPEG quality 85, 16:9
/// slides, and decode failures abort the job.
#[derive(Clone)]
pub struct ExtractOptions {
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
    /// Fire the progress callback every N frames.
    pub(crate) batch_size: u64,
    pub(crate) frame_output: FrameOutputOptions,
    pub(crate) document: DocumentOptions,
    /// Skip undecodable frames (logged and recorded) instead of failing.
    pub(crate) tolerate_decode_gaps: bool,
}

impl Debug for ExtractOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExtractOptions")
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .field("frame_output", &self.frame_output)
            .field("document", &self.document)
            .field("tolerate_decode_gaps", &self.tolerate_decode_gaps)
            .finish()
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
            frame_output: FrameOutputOptions::default(),
            document: DocumentOptions::default(),
            tolerate_decode_gaps: false,
        }
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token, checked between frames.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set how often the progress callback fires. Clamped to at least 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Set a custom resolution for decoded frames.
    ///
    /// Pass `None` for either dimension to keep the source value.
    #[must_use]
    pub fn with_resolution(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.frame_output.width = width;
        self.frame_output.height = height;
        self
    }

    /// Control whether aspect ratio is preserved when only one output
    /// dimension is specified. Defaults to `true`.
    #[must_use]
    pub fn with_maintain_aspect_ratio(mut self, maintain: bool) -> Self {
        self.frame_output.maintain_aspect_ratio = maintain;
        self
    }

    /// Set the caption drawn under every frame.
    #[must_use]
    pub fn with_caption_style(mut self, style: CaptionStyle) -> Self {
        self.document.caption_style = style;
        self
    }

    /// Set JPEG quality for embedded frames, clamped to 1–100.
    #[must_use]
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.document.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Set slide dimensions for slide-deck output.
    #[must_use]
    pub fn with_slide_size(mut self, size: SlideSize) -> Self {
        self.document.slide_size = size;
        self
    }

    /// Replace all document settings at once.
    #[must_use]
    pub fn with_document_options(mut self, document: DocumentOptions) -> Self {
        self.document = document;
        self
    }

    /// Skip frames that fail to decode instead of failing the job.
    ///
    /// Skipped frames are logged with their index and timestamp and listed
    /// in [`ExtractionReport::skipped`](crate::ExtractionReport::skipped).
    #[must_use]
    pub fn with_decode_gap_tolerance(mut self, tolerate: bool) -> Self {
        self.tolerate_decode_gaps = tolerate;
        self
    }

    /// Frame sizing settings.
    pub fn frame_output(&self) -> &FrameOutputOptions {
        &self.frame_output
    }

    /// Document layout settings.
    pub fn document(&self) -> &DocumentOptions {
        &self.document
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
