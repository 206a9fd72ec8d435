use crate::error::{CurateError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// One annotated occurrence in a video. Times are elapsed-time strings
/// (`SS`, `MM:SS`, or `HH:MM:SS`, optionally fractional); the label is the
/// raw annotation value, absent when the annotator marked nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub start: String,
    pub end: String,
    #[serde(rename = "event")]
    pub label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnnotationFile {
    replay_logos: Vec<Event>,
}

/// Load an event annotation file: a JSON object carrying the annotated
/// events under `replay_logos`. A missing key or mismatched shape is fatal.
pub fn load_events(path: &Path) -> Result<Vec<Event>> {
    if !path.exists() {
        return Err(CurateError::FileNotFound(path.display().to_string()));
    }
    let raw = std::fs::read_to_string(path)?;
    parse_events(&raw)
}

pub fn parse_events(raw: &str) -> Result<Vec<Event>> {
    let file: AnnotationFile = serde_json::from_str(raw)
        .map_err(|e| CurateError::Structural(format!("annotation file: {}", e)))?;
    debug!("Decoded {} annotated events", file.replay_logos.len());
    Ok(file.replay_logos)
}

/// Whether an event label is usable as a training target. Absent labels,
/// blank labels, and the literal `nothing` (any casing) are not; everything
/// else passes through verbatim.
pub fn is_trainable_label(label: Option<&str>) -> bool {
    match label {
        Some(l) => {
            let folded = l.trim().to_lowercase();
            !folded.is_empty() && folded != "nothing"
        }
        None => false,
    }
}
