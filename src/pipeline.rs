//! Job orchestration.
//!
//! [`Pipeline`] wires a [`FrameSource`] to a [`FrameSampler`](crate::FrameSampler)
//! and the [`DocumentWriter`] for the job's format, and walks a small state
//! machine while doing so:
//!
//! ```text
//! Idle → Opening → Sampling → Writing → Finalizing → Done
//!   └───────┴─────────┴──────────┴──────────┴──→ Failed(kind)
//! ```
//!
//! The first error ends the job; nothing is retried. An output file that was
//! already created stays on disk but is never reported as output.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    configuration::{ExtractOptions, FrameOutputOptions},
    document::{DocumentWriter, OutputFormat},
    error::{ErrorKind, FramedeckError},
    job::ExtractionJob,
    progress::ProgressTracker,
    sampler::{self, SampleRequest},
    source::{FrameSource, VideoHandle},
};

/// Where a [`Pipeline`] is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    Idle,
    /// Opening the video source.
    Opening,
    /// Source open; building the sampler and opening the writer.
    Sampling,
    /// Frames are being decoded and added to the document.
    Writing,
    /// All frames added; the document is being sealed.
    Finalizing,
    Done,
    /// The job stopped with an error of this kind.
    Failed(ErrorKind),
}

impl PipelineState {
    /// `true` for [`Done`](PipelineState::Done) and
    /// [`Failed`](PipelineState::Failed).
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed(_))
    }
}

impl Display for PipelineState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            PipelineState::Idle => f.write_str("Idle"),
            PipelineState::Opening => f.write_str("Opening"),
            PipelineState::Sampling => f.write_str("Sampling"),
            PipelineState::Writing => f.write_str("Writing"),
            PipelineState::Finalizing => f.write_str("Finalizing"),
            PipelineState::Done => f.write_str("Done"),
            PipelineState::Failed(kind) => write!(f, "Failed({kind})"),
        }
    }
}

/// A frame left out of the document because it could not be decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFrame {
    /// Index the frame would have had.
    pub index: u64,
    /// Its sample timestamp.
    pub timestamp: Duration,
    /// The decode error, rendered.
    pub reason: String,
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct ExtractionReport {
    /// The finished document.
    pub output_path: PathBuf,
    pub format: OutputFormat,
    /// Pages or slides in the document.
    pub frames_written: u64,
    /// Timestamps the sampler was expected to visit.
    pub frames_expected: u64,
    /// Frames excluded under decode-gap tolerance, in index order. Always
    /// empty unless [`ExtractOptions::with_decode_gap_tolerance`] is set.
    pub skipped: Vec<SkippedFrame>,
    /// Wall-clock time from start to finish.
    pub elapsed: Duration,
}

/// Runs [`ExtractionJob`]s.
///
/// A pipeline can run several jobs one after another; each run starts again
/// from [`PipelineState::Idle`]. The states the last run went through are
/// available from [`trace`](Pipeline::trace).
///
/// # Example
///
/// ```no_run
/// use framedeck::{ExtractOptions, ExtractionJob, OutputFormat, Pipeline};
///
/// let job = ExtractionJob::new("talk.mp4", 30.0, OutputFormat::Pptx, "talk.pptx");
/// let mut pipeline = Pipeline::new(ExtractOptions::new().with_decode_gap_tolerance(true));
/// let report = pipeline.run(&job)?;
/// println!("{} slides, {} skipped", report.frames_written, report.skipped.len());
/// # Ok::<(), framedeck::FramedeckError>(())
/// ```
#[derive(Debug)]
pub struct Pipeline {
    options: ExtractOptions,
    state: PipelineState,
    trace: Vec<PipelineState>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(ExtractOptions::default())
    }
}

impl Pipeline {
    pub fn new(options: ExtractOptions) -> Self {
        Self {
            options,
            state: PipelineState::Idle,
            trace: vec![PipelineState::Idle],
        }
    }

    /// Current state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Every state of the last run, starting with `Idle`.
    pub fn trace(&self) -> &[PipelineState] {
        &self.trace
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Run `job` against an FFmpeg-backed [`VideoHandle`].
    ///
    /// # Errors
    ///
    /// The first error of the run. Its [`kind`](FramedeckError::kind) is also
    /// recorded as the [`Failed`](PipelineState::Failed) state.
    pub fn run(&mut self, job: &ExtractionJob) -> Result<ExtractionReport, FramedeckError> {
        self.run_with_opener(job, |path, frame_output| {
            VideoHandle::open_with_options(path, frame_output.clone())
        })
    }

    /// Run `job`, opening its source with `open` instead of FFmpeg.
    ///
    /// `open` receives the job's source path and the frame sizing options.
    pub fn run_with_opener<S, F>(
        &mut self,
        job: &ExtractionJob,
        open: F,
    ) -> Result<ExtractionReport, FramedeckError>
    where
        S: FrameSource,
        F: FnOnce(&Path, &FrameOutputOptions) -> Result<S, FramedeckError>,
    {
        self.state = PipelineState::Idle;
        self.trace.clear();
        self.trace.push(PipelineState::Idle);

        let result = self.execute(job, open);
        if let Err(error) = &result {
            log::warn!(
                "Job for {} failed while {}: {}",
                job.source().display(),
                self.state,
                error
            );
            self.transition(PipelineState::Failed(error.kind()));
        }
        result
    }

    fn transition(&mut self, next: PipelineState) {
        log::debug!("Pipeline {} -> {}", self.state, next);
        self.state = next;
        self.trace.push(next);
    }

    fn execute<S, F>(
        &mut self,
        job: &ExtractionJob,
        open: F,
    ) -> Result<ExtractionReport, FramedeckError>
    where
        S: FrameSource,
        F: FnOnce(&Path, &FrameOutputOptions) -> Result<S, FramedeckError>,
    {
        // Validated before anything touches the filesystem.
        let request = SampleRequest::new(job.interval_seconds())?;

        self.transition(PipelineState::Opening);
        let mut source = open(job.source(), &self.options.frame_output)?;

        self.transition(PipelineState::Sampling);
        reject_source_as_output(job)?;
        let mut frames = sampler::sample(&mut source, request);
        let frames_expected = frames.expected_frames();
        let mut writer = job
            .format()
            .open_writer(job.output(), &self.options.document)?;

        self.transition(PipelineState::Writing);
        let mut tracker = ProgressTracker::new(
            self.options.progress.clone(),
            Some(frames_expected),
            self.options.batch_size,
        );
        let mut skipped = Vec::new();

        loop {
            if self.options.is_cancelled() {
                return Err(FramedeckError::Cancelled);
            }
            let Some((index, timestamp)) = frames.upcoming() else {
                break;
            };
            let Some(result) = frames.next() else {
                break;
            };

            match result {
                Ok(frame) => writer.add_frame(frame)?,
                Err(error)
                    if self.options.tolerate_decode_gaps
                        && error.kind() == ErrorKind::DecodeError =>
                {
                    log::warn!(
                        "Skipping frame {} at {:?}: {}",
                        index,
                        timestamp,
                        error
                    );
                    skipped.push(SkippedFrame {
                        index,
                        timestamp,
                        reason: error.to_string(),
                    });
                }
                Err(error) => return Err(error),
            }
            tracker.advance(index, timestamp);
        }
        tracker.finish();

        self.transition(PipelineState::Finalizing);
        let frames_written = writer.frames_written();
        let output_path = writer.finalize()?;
        self.transition(PipelineState::Done);

        let elapsed = tracker.elapsed();
        log::info!(
            "Wrote {} frames to {} in {:.2}s ({} skipped)",
            frames_written,
            output_path.display(),
            elapsed.as_secs_f64(),
            skipped.len()
        );

        Ok(ExtractionReport {
            output_path,
            format: job.format(),
            frames_written,
            frames_expected,
            skipped,
            elapsed,
        })
    }
}

/// Writing over the video being read would destroy it mid-run.
fn reject_source_as_output(job: &ExtractionJob) -> Result<(), FramedeckError> {
    let (Ok(source), Ok(output)) = (
        fs::canonicalize(job.source()),
        fs::canonicalize(job.output()),
    ) else {
        return Ok(());
    };
    if source == output {
        return Err(FramedeckError::OutputPathInvalid {
            path: job.output().to_path_buf(),
            reason: "output path is the source video".to_string(),
        });
    }
    Ok(())
}

/// Run `job` with default options and return the finished document's path.
///
/// This is the whole library in one call:
///
/// ```no_run
/// use framedeck::{ExtractionJob, OutputFormat};
///
/// let job = ExtractionJob::new("lecture.mkv", 60.0, OutputFormat::Pdf, "lecture.pdf");
/// match framedeck::run(&job) {
///     Ok(path) => println!("wrote {}", path.display()),
///     Err(error) => eprintln!("{}: {error}", error.kind()),
/// }
/// ```
///
/// # Errors
///
/// See [`Pipeline::run`].
pub fn run(job: &ExtractionJob) -> Result<PathBuf, FramedeckError> {
    Pipeline::default()
        .run(job)
        .map(|report| report.output_path)
}
