//! # framedeck
//!
//! Turn a video into a document of still frames: one frame every *k*
//! seconds, laid out one per page in a PDF or one per slide in a PPTX deck,
//! each captioned with its timestamp.
//!
//! Decoding is done by FFmpeg through the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate. Frames are
//! decoded lazily and handed to the document writer one at a time, so memory
//! use does not grow with the length of the video.
//!
//! ## Quick Start
//!
//! ```no_run
//! use framedeck::{ExtractionJob, OutputFormat};
//!
//! let job = ExtractionJob::new("talk.mp4", 30.0, OutputFormat::Pdf, "talk.pdf");
//! let path = framedeck::run(&job)?;
//! println!("wrote {}", path.display());
//! # Ok::<(), framedeck::FramedeckError>(())
//! ```
//!
//! ### Configured run
//!
//! ```no_run
//! use framedeck::{
//!     CancellationToken, CaptionStyle, ExtractOptions, ExtractionJob, OutputFormat, Pipeline,
//!     SlideSize,
//! };
//!
//! let token = CancellationToken::new();
//! let options = ExtractOptions::new()
//!     .with_cancellation(token.clone())
//!     .with_caption_style(CaptionStyle::Numbered)
//!     .with_slide_size(SlideSize::MatchFirstFrame)
//!     .with_decode_gap_tolerance(true);
//!
//! let job = ExtractionJob::with_default_output("talk.mp4", 10.0, OutputFormat::Pptx, ".");
//! let report = Pipeline::new(options).run(&job)?;
//! for gap in &report.skipped {
//!     eprintln!("frame {} at {:?} skipped: {}", gap.index, gap.timestamp, gap.reason);
//! }
//! # Ok::<(), framedeck::FramedeckError>(())
//! ```
//!
//! ### Lower-level pieces
//!
//! ```no_run
//! use framedeck::{DocumentOptions, OutputFormat, SampleRequest, VideoHandle, sample};
//!
//! let mut handle = VideoHandle::open("talk.mp4")?;
//! let mut writer = OutputFormat::Pdf.open_writer("talk.pdf", &DocumentOptions::default())?;
//! for frame in sample(&mut handle, SampleRequest::new(30.0)?) {
//!     writer.add_frame(frame?)?;
//! }
//! writer.finalize()?;
//! # Ok::<(), framedeck::FramedeckError>(())
//! ```
//!
//! ## Behaviour worth knowing
//!
//! - Frames are sampled at `0, k, 2k, ...` up to and including the duration,
//!   `floor(D / k) + 1` frames in all. The first frame is always included.
//! - An existing output file is overwritten. Two writers in the same process
//!   may not target the same path at once
//!   ([`FramedeckError::OutputPathInUse`]).
//! - A failed run can leave a partial file behind; it is never valid output.
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

mod caption;
pub mod configuration;
mod conversion;
pub mod document;
pub mod error;
pub mod ffmpeg;
mod frame;
mod job;
pub mod layout;
mod metadata;
mod output_lock;
pub mod pdf;
pub mod pipeline;
pub mod pptx;
pub mod progress;
pub mod sampler;
pub mod source;

pub use caption::{CaptionStyle, format_timestamp};
pub use configuration::{DEFAULT_JPEG_QUALITY, DocumentOptions, ExtractOptions, FrameOutputOptions};
pub use document::{DocumentWriter, OutputFormat};
pub use error::{ErrorKind, FramedeckError};
pub use ffmpeg::{FfmpegLogLevel, get_ffmpeg_log_level, set_ffmpeg_log_level};
pub use frame::{DecodedImage, Frame};
pub use job::ExtractionJob;
pub use layout::{Placement, SlideSize};
pub use metadata::{VideoMetadata, format_modified, human_readable_size};
pub use pdf::PdfWriter;
pub use pipeline::{ExtractionReport, Pipeline, PipelineState, SkippedFrame, run};
pub use pptx::PptxWriter;
pub use progress::{CancellationToken, ProgressCallback, ProgressInfo};
pub use sampler::{FrameSampler, SampleRequest, expected_frame_count, sample, sample_timestamps};
pub use source::{FrameSource, VideoHandle};
