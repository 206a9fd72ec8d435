use crate::subtitle::SubtitleEntry;
use tracing::debug;

/// Seconds of context kept before an event's recorded start.
pub const LEAD_IN_SECS: f64 = 30.0;

/// The second-range of subtitle text relevant to one event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub start: f64,
    pub end: f64,
}

impl Window {
    /// Build the lead-in window for an event spanning `[start, end]` seconds.
    /// The window never starts before the beginning of the video.
    pub fn with_lead_in(event_start: f64, event_end: f64) -> Self {
        Self {
            start: (event_start - LEAD_IN_SECS).max(0.0),
            end: event_end,
        }
    }

    /// Strict interval intersection: entries that merely touch a window
    /// boundary do not overlap.
    pub fn overlaps(&self, entry: &SubtitleEntry) -> bool {
        entry.start < self.end && entry.end > self.start
    }
}

/// Collect the text of every entry overlapping the window, in the order
/// the entries appear in the input, joined by single spaces. Returns the
/// empty string when nothing overlaps.
pub fn extract_window_text(entries: &[SubtitleEntry], window: Window) -> String {
    let mut texts = Vec::new();
    for entry in entries {
        if window.overlaps(entry) {
            debug!(
                "Matched caption {:.2}s..{:.2}s: {}",
                entry.start, entry.end, entry.text
            );
            texts.push(entry.text.as_str());
        }
    }
    texts.join(" ")
}
