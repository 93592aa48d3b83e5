//! Build a slide deck with progress reporting, then show cancellation.
//!
//! Usage:
//!   cargo run --example build_deck -- <input_file>

use std::error::Error;
use std::sync::Arc;

use framedeck::{
    CancellationToken, ErrorKind, ExtractOptions, ExtractionJob, OutputFormat, Pipeline,
    ProgressCallback, ProgressInfo, SlideSize,
};

/// Prints every progress snapshot to stdout.
struct PrintProgress;

impl ProgressCallback for PrintProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let pct = info
            .percentage
            .map_or("??".to_string(), |p| format!("{p:.1}"));
        let at = info
            .timestamp
            .map_or("--:--:--".to_string(), framedeck::format_timestamp);
        println!(
            "{}/{} ({pct}%) at {at}, elapsed={:.1}s",
            info.current,
            info.total.map_or("?".to_string(), |t| t.to_string()),
            info.elapsed.as_secs_f64(),
        );
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let input_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "input.mp4".to_string());

    println!("Building a 16:9 deck with one slide every 5 seconds...");
    let job = ExtractionJob::with_default_output(&input_path, 5.0, OutputFormat::Pptx, ".");
    let options = ExtractOptions::new()
        .with_slide_size(SlideSize::Widescreen)
        .with_progress(Arc::new(PrintProgress))
        .with_batch_size(2);
    let report = Pipeline::new(options).run(&job)?;
    println!("Wrote {} slides to {}\n", report.frames_written, report.output_path.display());

    println!("Demonstrating cancellation...");
    let token = CancellationToken::new();
    token.cancel();
    let cancelled = ExtractionJob::new(&input_path, 5.0, OutputFormat::Pptx, "cancelled.pptx");
    let mut pipeline = Pipeline::new(ExtractOptions::new().with_cancellation(token));
    match pipeline.run(&cancelled) {
        Err(error) if error.kind() == ErrorKind::Cancelled => {
            println!("Cancelled as expected after {:?}", pipeline.trace());
        }
        Err(error) => return Err(error.into()),
        Ok(_) => println!("Job finished before the token was seen"),
    }

    println!("Done!");
    Ok(())
}
