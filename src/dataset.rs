use crate::error::{CurateError, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// One curated training example: a subtitle snippet and its action label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub text: String,
    pub label: String,
}

/// Load the persisted dataset, or an empty one when none exists yet.
pub fn load_dataset(path: &Path) -> Result<Vec<TrainingExample>> {
    if !path.exists() {
        debug!("No dataset at {:?}, starting empty", path);
        return Ok(Vec::new());
    }
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|e| {
        CurateError::Structural(format!("dataset file {}: {}", path.display(), e))
    })
}

/// Append freshly curated examples to the existing dataset, existing
/// entries first, order preserved. No deduplication.
pub fn merge(
    mut existing: Vec<TrainingExample>,
    fresh: Vec<TrainingExample>,
) -> Vec<TrainingExample> {
    existing.extend(fresh);
    existing
}

/// Rewrite the dataset wholesale, pretty-printed UTF-8 with non-ASCII text
/// preserved. The JSON is staged in a temp file beside the target and moved
/// into place, so readers never observe a partial write.
pub fn save_dataset(path: &Path, dataset: &[TrainingExample]) -> Result<()> {
    let json = serde_json::to_string_pretty(dataset)?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(json.as_bytes())?;
    staged.persist(path).map_err(|e| CurateError::Io(e.error))?;

    debug!("Wrote {} examples to {:?}", dataset.len(), path);
    Ok(())
}
