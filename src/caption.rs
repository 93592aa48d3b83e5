//! Caption text for document pages and slides.

use std::time::Duration;

/// What text accompanies each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptionStyle {
    /// No caption; the frame fills its page or slide.
    None,
    /// The frame's timestamp, e.g. `00:01:00`.
    #[default]
    Timestamp,
    /// 1-based frame number and timestamp, e.g. `Frame 3 : 00:01:00`.
    Numbered,
}

impl CaptionStyle {
    /// Caption text for the frame at `index` (0-based) and `timestamp`, or
    /// `None` when captions are disabled.
    pub fn text(self, index: u64, timestamp: Duration) -> Option<String> {
        match self {
            CaptionStyle::None => None,
            CaptionStyle::Timestamp => Some(format_timestamp(timestamp)),
            CaptionStyle::Numbered => {
                Some(format!("Frame {} : {}", index + 1, format_timestamp(timestamp)))
            }
        }
    }

    /// Whether a caption band is reserved in the layout.
    pub fn is_enabled(self) -> bool {
        self != CaptionStyle::None
    }
}

/// Format a timestamp as `HH:MM:SS`, truncating fractional seconds.
///
/// Hours are not wrapped, so 100 hours renders as `100:00:00`.
///
/// ```
/// use std::time::Duration;
///
/// assert_eq!(framedeck::format_timestamp(Duration::from_secs(60)), "00:01:00");
/// assert_eq!(framedeck::format_timestamp(Duration::from_millis(3_725_900)), "01:02:05");
/// ```
pub fn format_timestamp(timestamp: Duration) -> String {
    let total = timestamp.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
