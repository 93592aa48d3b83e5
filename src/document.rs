//! Output documents.
//!
//! Every output container implements [`DocumentWriter`]: open it on a path,
//! feed it frames in order with [`add_frame`](DocumentWriter::add_frame), and
//! seal it with [`finalize`](DocumentWriter::finalize). The pipeline only
//! ever talks to this trait, so supporting another container means adding a
//! writer and an [`OutputFormat`] variant.
//!
//! # Example
//!
//! ```no_run
//! use framedeck::{DocumentOptions, OutputFormat, SampleRequest, VideoHandle, sample};
//!
//! let mut handle = VideoHandle::open("input.mp4")?;
//! let mut writer = OutputFormat::Pptx.open_writer("input.pptx", &DocumentOptions::default())?;
//!
//! for frame in sample(&mut handle, SampleRequest::new(10.0)?) {
//!     writer.add_frame(frame?)?;
//! }
//! let path = writer.finalize()?;
//! println!("wrote {}", path.display());
//! # Ok::<(), framedeck::FramedeckError>(())
//! ```

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs::{self, File},
    io::Cursor,
    path::{Path, PathBuf},
};

use image::{DynamicImage, codecs::jpeg::JpegEncoder};

use crate::{
    configuration::DocumentOptions, error::FramedeckError, frame::Frame, pdf::PdfWriter,
    pptx::PptxWriter,
};

/// Supported output containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    /// Paginated document, one page per frame.
    Pdf,
    /// Slide deck, one slide per frame.
    Pptx,
}

impl OutputFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Pptx => "pptx",
        }
    }

    /// Guess the format from a path's extension (case-insensitive).
    pub fn from_extension<P: AsRef<Path>>(path: P) -> Option<Self> {
        let extension = path.as_ref().extension()?.to_str()?;
        if extension.eq_ignore_ascii_case("pdf") {
            Some(OutputFormat::Pdf)
        } else if extension.eq_ignore_ascii_case("pptx") {
            Some(OutputFormat::Pptx)
        } else {
            None
        }
    }

    /// Open a writer of this format on `path`.
    ///
    /// The file is created (or truncated) immediately.
    ///
    /// # Errors
    ///
    /// [`FramedeckError::OutputPathInUse`] if another writer in this process
    /// owns `path`; [`FramedeckError::OutputPathInvalid`] if the file cannot
    /// be created.
    pub fn open_writer<P: AsRef<Path>>(
        self,
        path: P,
        options: &DocumentOptions,
    ) -> Result<Box<dyn DocumentWriter>, FramedeckError> {
        Ok(match self {
            OutputFormat::Pdf => Box::new(PdfWriter::open(path, options.clone())?),
            OutputFormat::Pptx => Box::new(PptxWriter::open(path, options.clone())?),
        })
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            OutputFormat::Pdf => "PDF",
            OutputFormat::Pptx => "PPTX",
        })
    }
}

/// A document being assembled from frames.
///
/// Writers keep frames in exactly the order they are added. Once
/// [`finalize`](DocumentWriter::finalize) has been called, both methods fail
/// with [`FramedeckError::WriterClosed`].
///
/// A writer that is dropped without being finalized leaves an incomplete
/// file behind. Such a file is never valid output.
pub trait DocumentWriter {
    /// Container this writer produces.
    fn format(&self) -> OutputFormat;

    /// Output path as given to the writer.
    fn path(&self) -> &Path;

    /// Append one page or slide for `frame`. The frame is dropped once
    /// encoded.
    fn add_frame(&mut self, frame: Frame) -> Result<(), FramedeckError>;

    /// Write the document structure, close the file, and return its path.
    fn finalize(&mut self) -> Result<PathBuf, FramedeckError>;

    /// Pages or slides added so far.
    fn frames_written(&self) -> u64;
}

/// Create (or truncate) the output file.
pub(crate) fn create_output_file(path: &Path) -> Result<File, FramedeckError> {
    let invalid = |reason: String| FramedeckError::OutputPathInvalid {
        path: path.to_path_buf(),
        reason,
    };

    if path.as_os_str().is_empty() {
        return Err(invalid("path is empty".to_string()));
    }
    if path.is_dir() {
        return Err(invalid("path is a directory".to_string()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.is_dir() {
            return Err(invalid(format!(
                "parent directory {} does not exist",
                parent.display()
            )));
        }
    }
    if fs::metadata(path).is_ok_and(|metadata| metadata.is_file()) {
        log::info!("Overwriting existing file {}", path.display());
    }

    File::create(path).map_err(|error| invalid(error.to_string()))
}

/// Encode a frame as baseline JPEG.
pub(crate) fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, FramedeckError> {
    let rgb = image.to_rgb8();
    let mut buffer = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100)).encode_image(&rgb)?;
    Ok(buffer.into_inner())
}
