//! Job descriptors.

use std::path::{Path, PathBuf};

use crate::document::OutputFormat;

/// One request: turn one video into one document.
///
/// A job is a plain value. It is not validated until it runs, so an invalid
/// interval surfaces as [`FramedeckError::InvalidInterval`](crate::FramedeckError::InvalidInterval)
/// from [`Pipeline::run`](crate::Pipeline::run) before any file is touched.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionJob {
    source: PathBuf,
    interval_seconds: f64,
    format: OutputFormat,
    output: PathBuf,
}

impl ExtractionJob {
    /// Describe a job with an explicit output path.
    pub fn new<S, O>(source: S, interval_seconds: f64, format: OutputFormat, output: O) -> Self
    where
        S: AsRef<Path>,
        O: AsRef<Path>,
    {
        Self {
            source: source.as_ref().to_path_buf(),
            interval_seconds,
            format,
            output: output.as_ref().to_path_buf(),
        }
    }

    /// Describe a job writing `<output_dir>/<video stem>.<pdf|pptx>`.
    ///
    /// ```
    /// use framedeck::{ExtractionJob, OutputFormat};
    ///
    /// let job = ExtractionJob::with_default_output("videos/talk.mp4", 30.0, OutputFormat::Pptx, "out");
    /// assert_eq!(job.output(), std::path::Path::new("out/talk.pptx"));
    /// ```
    pub fn with_default_output<S, D>(
        source: S,
        interval_seconds: f64,
        format: OutputFormat,
        output_dir: D,
    ) -> Self
    where
        S: AsRef<Path>,
        D: AsRef<Path>,
    {
        let source = source.as_ref();
        // Push rather than set_extension so "talk.v2.mp4" keeps its ".v2".
        let mut file_name = source
            .file_stem()
            .map(|stem| stem.to_os_string())
            .unwrap_or_else(|| "frames".into());
        file_name.push(".");
        file_name.push(format.extension());
        Self::new(
            source,
            interval_seconds,
            format,
            output_dir.as_ref().join(file_name),
        )
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn interval_seconds(&self) -> f64 {
        self.interval_seconds
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}
