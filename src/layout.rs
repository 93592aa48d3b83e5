//! Deterministic frame placement for fixed-size pages and slides.
//!
//! Frames whose aspect ratio differs from their target area are letterboxed:
//! scaled uniformly by `min(area_w / w, area_h / h)`, truncated to whole
//! units, and centered with `floor((area - scaled) / 2)` offsets. Frames are
//! never cropped. All arithmetic is integer so the same inputs always yield
//! the same placement.

/// English Metric Units per inch (Office drawing unit).
pub const EMU_PER_INCH: u64 = 914_400;

/// Height of the caption band at the bottom of a slide (0.5 in).
pub const SLIDE_CAPTION_BAND: u64 = EMU_PER_INCH / 2;

const WIDESCREEN: (u64, u64) = (12_192_000, 6_858_000);
const STANDARD: (u64, u64) = (9_144_000, 6_858_000);

// PowerPoint rejects slides outside 1 in – 56 in on either side.
const MIN_SLIDE_SIDE: u64 = EMU_PER_INCH;
const MAX_SLIDE_SIDE: u64 = 56 * EMU_PER_INCH;

/// Slide dimensions for a deck. Fixed for the whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlideSize {
    /// 16:9, 13.333 in × 7.5 in.
    #[default]
    Widescreen,
    /// 4:3, 10 in × 7.5 in.
    Standard,
    /// 13.333 in wide; the image area takes the first frame's aspect ratio.
    MatchFirstFrame,
}

impl SlideSize {
    /// Slide `(width, height)` in EMU.
    ///
    /// `first_frame` is only consulted by [`SlideSize::MatchFirstFrame`];
    /// `caption_band` is added below the image area in that case.
    pub fn dimensions(self, first_frame: (u32, u32), caption_band: u64) -> (u64, u64) {
        match self {
            SlideSize::Widescreen => WIDESCREEN,
            SlideSize::Standard => STANDARD,
            SlideSize::MatchFirstFrame => {
                let (frame_width, frame_height) = first_frame;
                if frame_width == 0 || frame_height == 0 {
                    return WIDESCREEN;
                }
                let width = WIDESCREEN.0;
                let image_height = width as u128 * frame_height as u128 / frame_width as u128;
                let height = (image_height as u64).saturating_add(caption_band);
                (width, height.clamp(MIN_SLIDE_SIDE, MAX_SLIDE_SIDE))
            }
        }
    }
}

/// An axis-aligned rectangle, origin at the top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: u64,
    pub y: u64,
    pub width: u64,
    pub height: u64,
}

impl Placement {
    pub fn new(x: u64, y: u64, width: u64, height: u64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Fit a `source_width × source_height` image inside `area`, preserving
/// aspect ratio, and center it.
///
/// A zero-sized source yields a zero-sized placement at the area's center.
///
/// ```
/// use framedeck::layout::{Placement, letterbox};
///
/// // A 4:3 frame in a 16:9 area gets pillarboxed.
/// let area = Placement::new(0, 0, 1600, 900);
/// assert_eq!(letterbox(640, 480, area), Placement::new(200, 0, 1200, 900));
/// ```
pub fn letterbox(source_width: u32, source_height: u32, area: Placement) -> Placement {
    if source_width == 0 || source_height == 0 {
        return Placement::new(area.x + area.width / 2, area.y + area.height / 2, 0, 0);
    }

    let (w, h) = (source_width as u128, source_height as u128);
    let (area_w, area_h) = (area.width as u128, area.height as u128);

    // area_w / w <= area_h / h  <=>  area_w * h <= area_h * w
    let (width, height) = if area_w * h <= area_h * w {
        (area_w, h * area_w / w)
    } else {
        (w * area_h / h, area_h)
    };

    let (width, height) = (width as u64, height as u64);
    Placement::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
