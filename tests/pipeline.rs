//! Pipeline orchestration tests, driven by a synthetic source.

mod common;

use std::{
    fs::{self, File},
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};

use common::SyntheticSource;
use framedeck::{
    CancellationToken, DocumentOptions, ErrorKind, ExtractOptions, ExtractionJob,
    FrameOutputOptions, FramedeckError, OutputFormat, PdfWriter, Pipeline, PipelineState,
    ProgressCallback, ProgressInfo,
};

fn pdf_pages(path: &Path) -> usize {
    lopdf::Document::load(path).unwrap().get_pages().len()
}

fn pptx_slides(path: &Path) -> usize {
    zip::ZipArchive::new(File::open(path).unwrap())
        .unwrap()
        .file_names()
        .filter(|name| name.starts_with("ppt/slides/slide"))
        .count()
}

fn run_synthetic(
    pipeline: &mut Pipeline,
    job: &ExtractionJob,
    source: SyntheticSource,
) -> Result<framedeck::ExtractionReport, FramedeckError> {
    pipeline.run_with_opener(job, move |_, _| Ok(source))
}

// ── happy path ─────────────────────────────────────────────────────

#[test]
fn sixty_five_second_video_every_thirty_seconds_as_pdf() {
    let directory = tempfile::tempdir().unwrap();
    let output = directory.path().join("talk.pdf");
    let job = ExtractionJob::new("talk.mp4", 30.0, OutputFormat::Pdf, &output);

    let mut pipeline = Pipeline::new(ExtractOptions::new());
    let report = run_synthetic(&mut pipeline, &job, SyntheticSource::new(65)).unwrap();

    assert_eq!(report.output_path, output);
    assert_eq!(report.frames_written, 3);
    assert_eq!(report.frames_expected, 3);
    assert!(report.skipped.is_empty());
    assert_eq!(pdf_pages(&output), 3);

    assert_eq!(pipeline.state(), PipelineState::Done);
    assert_eq!(
        pipeline.trace(),
        &[
            PipelineState::Idle,
            PipelineState::Opening,
            PipelineState::Sampling,
            PipelineState::Writing,
            PipelineState::Finalizing,
            PipelineState::Done,
        ]
    );
}

#[test]
fn ten_second_video_every_fifteen_seconds_as_pptx() {
    let directory = tempfile::tempdir().unwrap();
    let output = directory.path().join("short.pptx");
    let job = ExtractionJob::new("short.mp4", 15.0, OutputFormat::Pptx, &output);

    let report = run_synthetic(&mut Pipeline::default(), &job, SyntheticSource::new(10)).unwrap();

    assert_eq!(report.frames_written, 1);
    assert_eq!(pptx_slides(&output), 1);
}

#[test]
fn frame_sizing_options_reach_the_opener() {
    let directory = tempfile::tempdir().unwrap();
    let job = ExtractionJob::new("in.mp4", 1.0, OutputFormat::Pdf, directory.path().join("o.pdf"));
    let options = ExtractOptions::new().with_resolution(Some(320), None);

    let seen = Arc::new(Mutex::new(None));
    let seen_by_opener = Arc::clone(&seen);
    Pipeline::new(options)
        .run_with_opener(&job, move |path, frame_output| {
            assert_eq!(path, Path::new("in.mp4"));
            *seen_by_opener.lock().unwrap() = Some(frame_output.clone());
            Ok(SyntheticSource::new(1))
        })
        .unwrap();

    let expected = FrameOutputOptions {
        width: Some(320),
        ..FrameOutputOptions::default()
    };
    assert_eq!(seen.lock().unwrap().clone(), Some(expected));
}

#[test]
fn repeated_runs_agree() {
    let directory = tempfile::tempdir().unwrap();
    let first = directory.path().join("first.pptx");
    let second = directory.path().join("second.pptx");
    let mut pipeline = Pipeline::default();

    let a = run_synthetic(
        &mut pipeline,
        &ExtractionJob::new("v.mp4", 7.0, OutputFormat::Pptx, &first),
        SyntheticSource::new(50),
    )
    .unwrap();
    let b = run_synthetic(
        &mut pipeline,
        &ExtractionJob::new("v.mp4", 7.0, OutputFormat::Pptx, &second),
        SyntheticSource::new(50),
    )
    .unwrap();

    assert_eq!(a.frames_written, 8);
    assert_eq!(a.frames_written, b.frames_written);
    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
    assert_eq!(pipeline.trace().first(), Some(&PipelineState::Idle));
    assert_eq!(pipeline.trace().len(), 6);
}

// ── failures ───────────────────────────────────────────────────────

#[test]
fn invalid_interval_fails_before_any_io() {
    let directory = tempfile::tempdir().unwrap();
    let output = directory.path().join("never.pdf");

    for interval in [0.0, -5.0, f64::NAN] {
        let job = ExtractionJob::new("talk.mp4", interval, OutputFormat::Pdf, &output);
        let mut pipeline = Pipeline::default();
        let error = pipeline
            .run_with_opener(&job, |_, _| -> Result<SyntheticSource, FramedeckError> {
                panic!("source must not be opened")
            })
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::InvalidInterval);
        assert_eq!(
            pipeline.trace(),
            &[
                PipelineState::Idle,
                PipelineState::Failed(ErrorKind::InvalidInterval)
            ]
        );
        assert!(!output.exists());
    }
}

#[test]
fn invalid_interval_does_not_truncate_existing_output() {
    let directory = tempfile::tempdir().unwrap();
    let output = directory.path().join("keep.pdf");
    fs::write(&output, b"previous result").unwrap();

    let job = ExtractionJob::new("talk.mp4", 0.0, OutputFormat::Pdf, &output);
    assert!(run_synthetic(&mut Pipeline::default(), &job, SyntheticSource::new(5)).is_err());
    assert_eq!(fs::read(&output).unwrap(), b"previous result");
}

#[test]
fn unreadable_source_creates_no_output() {
    let directory = tempfile::tempdir().unwrap();
    let output = directory.path().join("missing.pdf");
    let job = ExtractionJob::new(
        directory.path().join("does_not_exist.mp4"),
        30.0,
        OutputFormat::Pdf,
        &output,
    );

    let mut pipeline = Pipeline::default();
    let error = pipeline.run(&job).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::SourceUnreadable);
    assert_eq!(
        pipeline.state(),
        PipelineState::Failed(ErrorKind::SourceUnreadable)
    );
    assert!(!output.exists());

    let error = framedeck::run(&job).unwrap_err();
    assert!(matches!(error, FramedeckError::SourceUnreadable { .. }));
}

#[test]
fn mid_stream_decode_error_fails_the_job() {
    let directory = tempfile::tempdir().unwrap();
    let output = directory.path().join("broken.pdf");
    let job = ExtractionJob::new("v.mp4", 10.0, OutputFormat::Pdf, &output);

    let mut pipeline = Pipeline::default();
    let error = run_synthetic(&mut pipeline, &job, SyntheticSource::new(30).failing_at(20))
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::DecodeError);
    assert_eq!(
        pipeline.trace(),
        &[
            PipelineState::Idle,
            PipelineState::Opening,
            PipelineState::Sampling,
            PipelineState::Writing,
            PipelineState::Failed(ErrorKind::DecodeError),
        ]
    );
    // The pages written so far stay behind without a trailer.
    let bytes = std::fs::read(&output).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
    assert!(!bytes.windows(9).any(|window| window == b"startxref"));
}

#[test]
fn tolerated_decode_gap_is_recorded_and_excluded() {
    let directory = tempfile::tempdir().unwrap();
    let output = directory.path().join("gappy.pptx");
    let job = ExtractionJob::new("v.mp4", 10.0, OutputFormat::Pptx, &output);

    let mut pipeline = Pipeline::new(ExtractOptions::new().with_decode_gap_tolerance(true));
    let report =
        run_synthetic(&mut pipeline, &job, SyntheticSource::new(30).failing_at(10)).unwrap();

    assert_eq!(report.frames_expected, 4);
    assert_eq!(report.frames_written, 3);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].index, 1);
    assert_eq!(report.skipped[0].timestamp, Duration::from_secs(10));
    assert!(report.skipped[0].reason.contains("corrupt packet"));
    assert_eq!(pptx_slides(&output), 3);
    assert_eq!(pipeline.state(), PipelineState::Done);
}

#[test]
fn pdf_with_every_frame_skipped_is_empty() {
    let directory = tempfile::tempdir().unwrap();
    let job = ExtractionJob::new("v.mp4", 60.0, OutputFormat::Pdf, directory.path().join("e.pdf"));

    let mut pipeline = Pipeline::new(ExtractOptions::new().with_decode_gap_tolerance(true));
    let error = run_synthetic(&mut pipeline, &job, SyntheticSource::new(30).failing_at(0))
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::EmptyDocument);
    assert_eq!(
        pipeline.trace().last(),
        Some(&PipelineState::Failed(ErrorKind::EmptyDocument))
    );
    assert!(pipeline.trace().contains(&PipelineState::Finalizing));
}

#[test]
fn output_in_use_is_refused() {
    let directory = tempfile::tempdir().unwrap();
    let output = directory.path().join("busy.pdf");
    let _holder = PdfWriter::open(&output, DocumentOptions::default()).unwrap();

    let job = ExtractionJob::new("v.mp4", 1.0, OutputFormat::Pdf, &output);
    let error = run_synthetic(&mut Pipeline::default(), &job, SyntheticSource::new(3)).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::OutputPathInUse);
}

#[test]
fn output_may_not_replace_the_source() {
    let directory = tempfile::tempdir().unwrap();
    let video = directory.path().join("clip.pdf");
    fs::write(&video, b"not really a pdf").unwrap();

    let job = ExtractionJob::new(&video, 1.0, OutputFormat::Pdf, &video);
    let error = run_synthetic(&mut Pipeline::default(), &job, SyntheticSource::new(3)).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::OutputPathInvalid);
    assert_eq!(fs::read(&video).unwrap(), b"not really a pdf");
}

// ── cancellation and progress ──────────────────────────────────────

#[test]
fn cancelled_before_start_decodes_nothing() {
    let directory = tempfile::tempdir().unwrap();
    let job = ExtractionJob::new("v.mp4", 1.0, OutputFormat::Pdf, directory.path().join("c.pdf"));
    let token = CancellationToken::new();
    token.cancel();

    let mut source = SyntheticSource::new(10);
    let borrowed = &mut source;
    let mut pipeline = Pipeline::new(ExtractOptions::new().with_cancellation(token));
    let error = pipeline
        .run_with_opener(&job, move |_, _| Ok(borrowed))
        .unwrap_err();

    assert!(matches!(error, FramedeckError::Cancelled));
    assert_eq!(pipeline.state(), PipelineState::Failed(ErrorKind::Cancelled));
    assert!(source.requested.is_empty());
}

struct CancelAfter {
    token: CancellationToken,
    frames: u64,
}

impl ProgressCallback for CancelAfter {
    fn on_progress(&self, info: &ProgressInfo) {
        if info.current >= self.frames {
            self.token.cancel();
        }
    }
}

#[test]
fn cancellation_is_checked_between_frames() {
    let directory = tempfile::tempdir().unwrap();
    let job = ExtractionJob::new("v.mp4", 1.0, OutputFormat::Pdf, directory.path().join("c.pdf"));
    let token = CancellationToken::new();
    let options = ExtractOptions::new()
        .with_cancellation(token.clone())
        .with_progress(Arc::new(CancelAfter { token, frames: 2 }));

    let mut source = SyntheticSource::new(10);
    let borrowed = &mut source;
    let mut pipeline = Pipeline::new(options);
    let error = pipeline
        .run_with_opener(&job, move |_, _| Ok(borrowed))
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Cancelled);
    assert_eq!(source.requested, vec![Duration::ZERO, Duration::from_secs(1)]);
    assert_eq!(
        pipeline.trace().last(),
        Some(&PipelineState::Failed(ErrorKind::Cancelled))
    );
    assert!(!pipeline.trace().contains(&PipelineState::Finalizing));
}

#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<ProgressInfo>>,
}

impl ProgressCallback for Recorder {
    fn on_progress(&self, info: &ProgressInfo) {
        self.seen.lock().unwrap().push(info.clone());
    }
}

#[test]
fn progress_reports_every_batch_and_at_the_end() {
    let directory = tempfile::tempdir().unwrap();
    let job = ExtractionJob::new("v.mp4", 10.0, OutputFormat::Pdf, directory.path().join("p.pdf"));
    let recorder = Arc::new(Recorder::default());
    let options = ExtractOptions::new()
        .with_progress(recorder.clone())
        .with_batch_size(2);

    run_synthetic(&mut Pipeline::new(options), &job, SyntheticSource::new(40)).unwrap();

    let seen = recorder.seen.lock().unwrap();
    // Five frames: reports after frames 2 and 4, then the final one.
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0].current, 2);
    assert_eq!(seen[0].frame_index, Some(1));
    assert_eq!(seen[0].timestamp, Some(Duration::from_secs(10)));
    assert_eq!(seen[2].current, 5);
    assert_eq!(seen[2].total, Some(5));
    assert_eq!(seen[2].percentage, Some(100.0));
    assert_eq!(seen[2].frame_index, None);
}
