pub mod load;
pub mod window;

pub use load::{load_transcript, parse_transcript, Transcript};
pub use window::{extract_window_text, Window, LEAD_IN_SECS};

use serde::{Deserialize, Serialize};

/// One caption line on the video timeline, in seconds.
///
/// `start <= end` is not enforced and entries need not be time-sorted;
/// the overlap predicate in [`window`] works on entries as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleEntry {
    pub start: f64,
    pub end: f64,
    pub text: String,
}
