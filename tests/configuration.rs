//! ExtractOptions, FrameOutputOptions, and DocumentOptions tests.

use framedeck::{
    CaptionStyle, DEFAULT_JPEG_QUALITY, DocumentOptions, ExtractOptions, FrameOutputOptions,
    SlideSize,
};

// ── ExtractOptions builder ───────────────────────────────────────

#[test]
fn config_defaults() {
    let config = ExtractOptions::new();
    let debug = format!("{config:?}");
    assert!(debug.contains("ExtractOptions"));
    assert!(debug.contains("has_cancellation: false"));
    assert!(debug.contains("batch_size: 1"));
    assert!(debug.contains("tolerate_decode_gaps: false"));

    assert_eq!(config.frame_output(), &FrameOutputOptions::default());
    assert_eq!(config.document(), &DocumentOptions::default());
}

#[test]
fn config_with_batch_size_clamps_zero() {
    let config = ExtractOptions::new().with_batch_size(0);
    let debug = format!("{config:?}");
    assert!(debug.contains("batch_size: 1"));
}

#[test]
fn config_with_cancellation() {
    let config = ExtractOptions::new().with_cancellation(framedeck::CancellationToken::new());
    assert!(format!("{config:?}").contains("has_cancellation: true"));
}

#[test]
fn config_document_settings() {
    let config = ExtractOptions::new()
        .with_caption_style(CaptionStyle::Numbered)
        .with_slide_size(SlideSize::Standard)
        .with_jpeg_quality(0);

    let document = config.document();
    assert_eq!(document.caption_style, CaptionStyle::Numbered);
    assert_eq!(document.slide_size, SlideSize::Standard);
    // Clamped to the valid JPEG range.
    assert_eq!(document.jpeg_quality, 1);

    let replaced = config.with_document_options(DocumentOptions::default());
    assert_eq!(replaced.document().jpeg_quality, DEFAULT_JPEG_QUALITY);
}

#[test]
fn config_resolution_settings() {
    let config = ExtractOptions::new()
        .with_resolution(Some(640), None)
        .with_maintain_aspect_ratio(false);

    let frame_output = config.frame_output();
    assert_eq!(frame_output.width, Some(640));
    assert_eq!(frame_output.height, None);
    assert!(!frame_output.maintain_aspect_ratio);
}

// ── FrameOutputOptions ───────────────────────────────────────────

#[test]
fn resolve_dimensions_keeps_source_by_default() {
    let options = FrameOutputOptions::default();
    assert!(options.maintain_aspect_ratio);
    assert_eq!(options.resolve_dimensions(1920, 1080), (1920, 1080));
}

#[test]
fn resolve_dimensions_preserves_aspect_ratio() {
    let width_only = FrameOutputOptions {
        width: Some(640),
        ..FrameOutputOptions::default()
    };
    assert_eq!(width_only.resolve_dimensions(1920, 1080), (640, 360));

    let height_only = FrameOutputOptions {
        height: Some(540),
        ..FrameOutputOptions::default()
    };
    assert_eq!(height_only.resolve_dimensions(1920, 1080), (960, 540));
}

#[test]
fn resolve_dimensions_without_aspect_ratio() {
    let options = FrameOutputOptions {
        width: Some(640),
        height: None,
        maintain_aspect_ratio: false,
    };
    assert_eq!(options.resolve_dimensions(1920, 1080), (640, 1080));
}

#[test]
fn resolve_dimensions_is_never_zero() {
    let options = FrameOutputOptions {
        width: Some(1),
        ..FrameOutputOptions::default()
    };
    assert_eq!(options.resolve_dimensions(1920, 2), (1, 1));

    let fixed = FrameOutputOptions {
        width: Some(0),
        height: Some(0),
        maintain_aspect_ratio: true,
    };
    assert_eq!(fixed.resolve_dimensions(1920, 1080), (1, 1));
}

// ── DocumentOptions ──────────────────────────────────────────────

#[test]
fn document_defaults() {
    let options = DocumentOptions::default();
    assert_eq!(options.caption_style, CaptionStyle::Timestamp);
    assert_eq!(options.jpeg_quality, 85);
    assert_eq!(options.slide_size, SlideSize::Widescreen);
}
