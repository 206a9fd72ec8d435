use crate::error::{CurateError, Result};
use crate::subtitle::SubtitleEntry;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

/// A decoded subtitle transcript.
#[derive(Debug, Clone)]
pub struct Transcript {
    pub entries: Vec<SubtitleEntry>,
    /// Entries dropped because they were missing fields or mistyped.
    pub skipped: usize,
}

impl Transcript {
    /// The time span covered by the transcript, first entry to last,
    /// in input order.
    pub fn time_span(&self) -> Option<(f64, f64)> {
        let first = self.entries.first()?;
        let last = self.entries.last()?;
        Some((first.start, last.end))
    }
}

/// Load a subtitle transcript file: a JSON array of
/// `{start, end, text}` objects with times in seconds.
pub fn load_transcript(path: &Path) -> Result<Transcript> {
    if !path.exists() {
        return Err(CurateError::FileNotFound(path.display().to_string()));
    }
    let raw = std::fs::read_to_string(path)?;
    parse_transcript(&raw)
}

/// Decode transcript JSON. The top-level shape must be an array; that
/// failing is fatal. Individual malformed entries are skipped with a
/// diagnostic so one corrupt caption cannot discard the whole run.
pub fn parse_transcript(raw: &str) -> Result<Transcript> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| CurateError::Structural(format!("subtitle transcript: {}", e)))?;

    let Some(items) = value.as_array() else {
        return Err(CurateError::Structural(
            "subtitle transcript is not a JSON array".to_string(),
        ));
    };

    let mut entries = Vec::with_capacity(items.len());
    let mut skipped = 0;

    for (i, item) in items.iter().enumerate() {
        match decode_entry(item) {
            Some(entry) => entries.push(entry),
            None => {
                warn!("Skipping malformed subtitle entry {}: {}", i + 1, item);
                skipped += 1;
            }
        }
    }

    debug!(
        "Decoded {} subtitle entries ({} skipped)",
        entries.len(),
        skipped
    );

    Ok(Transcript { entries, skipped })
}

fn decode_entry(item: &Value) -> Option<SubtitleEntry> {
    let start = item.get("start")?.as_f64()?;
    let end = item.get("end")?.as_f64()?;
    let text = item.get("text")?.as_str()?.to_string();
    Some(SubtitleEntry { start, end, text })
}
