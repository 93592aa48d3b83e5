//! Sample a video every few seconds into a captioned PDF.
//!
//! Usage:
//!   cargo run --example build_pdf -- <input_file> [interval_seconds]

use std::error::Error;

use framedeck::{
    CaptionStyle, ExtractOptions, ExtractionJob, OutputFormat, Pipeline, VideoHandle,
};

fn main() -> Result<(), Box<dyn Error>> {
    let input_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "input.mp4".to_string());
    let interval: f64 = std::env::args()
        .nth(2)
        .map(|value| value.parse::<f64>())
        .transpose()?
        .unwrap_or(10.0);

    let handle = VideoHandle::open(&input_path)?;
    let metadata = handle.metadata();
    println!(
        "Video: {}x{}, {:.2} fps, {:.1}s",
        metadata.width,
        metadata.height,
        metadata.frames_per_second,
        metadata.duration.as_secs_f64(),
    );
    drop(handle);

    let job = ExtractionJob::with_default_output(&input_path, interval, OutputFormat::Pdf, ".");
    println!("Writing one page every {interval}s to {}...", job.output().display());

    let options = ExtractOptions::new().with_caption_style(CaptionStyle::Numbered);
    let report = Pipeline::new(options).run(&job)?;
    println!(
        "Wrote {} of {} pages in {:.2}s",
        report.frames_written,
        report.frames_expected,
        report.elapsed.as_secs_f64(),
    );

    println!("Done!");
    Ok(())
}
