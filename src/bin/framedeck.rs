use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use framedeck::{
    CaptionStyle, DEFAULT_JPEG_QUALITY, ExtractOptions, ExtractionJob, FfmpegLogLevel,
    FramedeckError, OutputFormat, Pipeline, ProgressCallback, ProgressInfo, SlideSize,
    VideoHandle,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  framedeck build talk.mp4 --interval 30 --format pdf\n  framedeck build talk.mp4 --interval 10 --out slides/talk.pptx --caption numbered --progress\n  framedeck probe talk.mp4 --json\n  framedeck completions zsh > _framedeck";

#[derive(Debug, Parser)]
#[command(
    name = "framedeck",
    version,
    about = "Turn a video into a PDF or slide deck of frames sampled at a fixed interval",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging (RUST_LOG overrides).
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar while frames are written.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow replacing an existing output file.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Sample frames from a video into a document.
    #[command(
        about = "Build a PDF or PPTX from video frames",
        after_help = "Examples:\n  framedeck build talk.mp4 --interval 30\n  framedeck build talk.mp4 --interval 5 --format pptx --out-dir decks --slide-size first-frame"
    )]
    Build {
        /// Input video path.
        input: PathBuf,
        /// Seconds between sampled frames.
        #[arg(long, short = 'i')]
        interval: f64,
        /// Output format: pdf | pptx. Defaults to the --out extension, else pdf.
        #[arg(long, short = 'f')]
        format: Option<String>,
        /// Output file path.
        #[arg(long, short = 'o', conflicts_with = "out_dir")]
        out: Option<PathBuf>,
        /// Directory for `<video name>.<format>` when --out is not given.
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Caption under each frame: timestamp | numbered | none.
        #[arg(long, default_value = "timestamp")]
        caption: String,
        /// Slide size for pptx: widescreen | standard | first-frame.
        #[arg(long, default_value = "widescreen")]
        slide_size: String,
        /// JPEG quality for embedded frames (1-100).
        #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY)]
        quality: u8,
        /// Scale frames to this width.
        #[arg(long)]
        width: Option<u32>,
        /// Scale frames to this height.
        #[arg(long)]
        height: Option<u32>,
        /// Skip frames that fail to decode instead of failing.
        #[arg(long)]
        tolerate_gaps: bool,
        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print video metadata.
    #[command(
        about = "Print video metadata",
        visible_alias = "info",
        after_help = "Examples:\n  framedeck probe talk.mp4\n  framedeck probe talk.mp4 --json"
    )]
    Probe {
        /// Input video path.
        input: PathBuf,

        /// Output metadata as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_format(value: &str) -> Option<OutputFormat> {
    match value.to_ascii_lowercase().as_str() {
        "pdf" => Some(OutputFormat::Pdf),
        "pptx" | "ppt" | "slides" => Some(OutputFormat::Pptx),
        _ => None,
    }
}

fn parse_caption_style(value: &str) -> Option<CaptionStyle> {
    match value.to_ascii_lowercase().as_str() {
        "timestamp" | "time" => Some(CaptionStyle::Timestamp),
        "numbered" | "number" => Some(CaptionStyle::Numbered),
        "none" | "off" => Some(CaptionStyle::None),
        _ => None,
    }
}

fn parse_slide_size(value: &str) -> Option<SlideSize> {
    match value.to_ascii_lowercase().as_str() {
        "widescreen" | "16:9" => Some(SlideSize::Widescreen),
        "standard" | "4:3" => Some(SlideSize::Standard),
        "first-frame" | "match" => Some(SlideSize::MatchFirstFrame),
        _ => None,
    }
}

/// Pick the format from `--format`, then the `--out` extension, then PDF.
fn resolve_format(
    format: Option<&str>,
    out: Option<&Path>,
) -> Result<OutputFormat, Box<dyn std::error::Error>> {
    match (format, out.and_then(OutputFormat::from_extension)) {
        (Some(value), _) => {
            Ok(parse_format(value).ok_or_else(|| format!("unsupported --format: {value}"))?)
        }
        (None, Some(from_extension)) => Ok(from_extension),
        (None, None) => Ok(OutputFormat::Pdf),
    }
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

fn init_logging(global: &GlobalOptions) {
    let default_filter = if global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(level) = &global.log_level {
        let parsed: FfmpegLogLevel = level
            .parse()
            .map_err(|_| format!("unsupported --log-level: {level}"))?;
        framedeck::set_ffmpeg_log_level(parsed);
    }
    Ok(())
}

/// Drives an indicatif bar from pipeline progress.
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style =
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for BarProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(total) = info.total {
            self.bar.set_length(total);
        }
        self.bar.set_position(info.current);
        match info.timestamp {
            Some(timestamp) => self.bar.set_message(framedeck::format_timestamp(timestamp)),
            None => self.bar.finish_and_clear(),
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global);
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Build {
            input,
            interval,
            format,
            out,
            out_dir,
            caption,
            slide_size,
            quality,
            width,
            height,
            tolerate_gaps,
            json,
        } => {
            let format = resolve_format(format.as_deref(), out.as_deref())?;
            let caption_style = parse_caption_style(&caption)
                .ok_or_else(|| format!("unsupported --caption: {caption}"))?;
            let slide_size = parse_slide_size(&slide_size)
                .ok_or_else(|| format!("unsupported --slide-size: {slide_size}"))?;

            let job = match out {
                Some(out) => ExtractionJob::new(&input, interval, format, out),
                None => {
                    let directory = match out_dir {
                        Some(directory) => directory,
                        None => input
                            .parent()
                            .map(Path::to_path_buf)
                            .unwrap_or_default(),
                    };
                    ExtractionJob::with_default_output(&input, interval, format, directory)
                }
            };
            ensure_writable_path(job.output(), cli.global.overwrite)?;

            let mut options = ExtractOptions::new()
                .with_caption_style(caption_style)
                .with_slide_size(slide_size)
                .with_jpeg_quality(quality)
                .with_resolution(width, height)
                .with_decode_gap_tolerance(tolerate_gaps);
            if cli.global.progress {
                options = options.with_progress(Arc::new(BarProgress::new()?));
            }

            let report = Pipeline::new(options).run(&job)?;

            if json {
                let payload = json!({
                    "output": report.output_path,
                    "format": report.format.extension(),
                    "frames_written": report.frames_written,
                    "frames_expected": report.frames_expected,
                    "elapsed_seconds": report.elapsed.as_secs_f64(),
                    "skipped": report.skipped.iter().map(|gap| json!({
                        "index": gap.index,
                        "timestamp_seconds": gap.timestamp.as_secs_f64(),
                        "reason": gap.reason,
                    })).collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!(
                    "{} {} {} ({} {} in {:.2}s)",
                    "wrote".green().bold(),
                    report.format,
                    report.output_path.display(),
                    report.frames_written,
                    if report.format == OutputFormat::Pdf { "pages" } else { "slides" },
                    report.elapsed.as_secs_f64(),
                );
                for gap in &report.skipped {
                    eprintln!(
                        "{} frame {} at {} skipped: {}",
                        "warning:".yellow().bold(),
                        gap.index,
                        framedeck::format_timestamp(gap.timestamp),
                        gap.reason
                    );
                }
            }
        }
        Commands::Probe { input, json } => {
            let handle = VideoHandle::open(&input)?;
            let metadata = handle.metadata();
            if json {
                let payload = json!({
                    "path": metadata.path,
                    "format": metadata.format,
                    "duration_seconds": metadata.duration.as_secs_f64(),
                    "width": metadata.width,
                    "height": metadata.height,
                    "fps": metadata.frames_per_second,
                    "frame_count": metadata.frame_count,
                    "codec": metadata.codec,
                    "file_size": metadata.file_size,
                    "modified": metadata.modified.map(framedeck::format_modified),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Format: {}", metadata.format);
                println!(
                    "Duration: {} ({:.3}s)",
                    framedeck::format_timestamp(metadata.duration),
                    metadata.duration.as_secs_f64()
                );
                println!(
                    "Video: {}x{} @ {:.2} fps [{}], ~{} frames",
                    metadata.width,
                    metadata.height,
                    metadata.frames_per_second,
                    metadata.codec,
                    metadata.frame_count,
                );
                println!("Size: {}", framedeck::human_readable_size(metadata.file_size));
                if let Some(modified) = metadata.modified {
                    println!("Modified: {}", framedeck::format_modified(modified));
                }
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "framedeck", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        match error.downcast_ref::<FramedeckError>() {
            Some(error) => eprintln!(
                "{}: {error}",
                format!("error[{}]", error.kind()).red().bold()
            ),
            None => eprintln!("{} {error}", "error:".red().bold()),
        }
        std::process::exit(1);
    }
}
