use crate::annotation::{is_trainable_label, load_events, Event};
use crate::config::ParseErrorPolicy;
use crate::dataset::{load_dataset, merge, save_dataset, TrainingExample};
use crate::error::{CurateError, Result};
use crate::subtitle::{extract_window_text, load_transcript, SubtitleEntry, Window};
use crate::timecode::{parse_timecode, TimecodeError};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Configuration for a curation run.
#[derive(Debug, Clone)]
pub struct CurationConfig {
    /// What to do when an event carries a malformed time code.
    pub on_parse_error: ParseErrorPolicy,
    /// Show progress bars.
    pub show_progress: bool,
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            on_parse_error: ParseErrorPolicy::default(),
            show_progress: true,
        }
    }
}

/// Counters from one curation pass.
#[derive(Debug, Clone, Default)]
pub struct CurationStats {
    pub events_total: usize,
    pub invalid_label: usize,
    pub no_coverage: usize,
    pub parse_failures: usize,
    pub examples_added: usize,
    pub subtitles_skipped: usize,
}

/// Result of a full curation run.
#[derive(Debug)]
pub struct CurationReport {
    /// Path of the persisted dataset.
    pub dataset_path: PathBuf,
    /// Dataset size after the merge.
    pub dataset_len: usize,
    pub stats: CurationStats,
    pub total_time: Duration,
}

/// Resolve an event's lead-in window from its time-code strings.
fn event_window(event: &Event) -> std::result::Result<Window, TimecodeError> {
    let start = parse_timecode(&event.start)?;
    let end = parse_timecode(&event.end)?;
    Ok(Window::with_lead_in(start, end))
}

/// Run the per-event curation pass: validate the label, resolve the
/// lead-in window, extract overlapping subtitle text, and emit at most one
/// example per event. Output preserves event order.
pub fn curate_examples(
    events: &[Event],
    subtitles: &[SubtitleEntry],
    on_parse_error: ParseErrorPolicy,
) -> Result<(Vec<TrainingExample>, CurationStats)> {
    let mut stats = CurationStats {
        events_total: events.len(),
        ..Default::default()
    };
    let mut examples = Vec::new();

    for (i, event) in events.iter().enumerate() {
        let label = match event.label.as_deref() {
            Some(l) if is_trainable_label(Some(l)) => l,
            _ => {
                info!(
                    "Event {}: label {:?} not trainable, skipped",
                    i + 1,
                    event.label
                );
                stats.invalid_label += 1;
                continue;
            }
        };

        let window = match event_window(event) {
            Ok(w) => w,
            Err(e) => {
                stats.parse_failures += 1;
                match on_parse_error {
                    ParseErrorPolicy::Abort => {
                        return Err(CurateError::TimeFormat {
                            index: i + 1,
                            source: e,
                        });
                    }
                    ParseErrorPolicy::Skip => {
                        warn!("Event {}: {}, skipped", i + 1, e);
                        continue;
                    }
                }
            }
        };

        debug!(
            "Event {}: '{}' | {} ~ {} -> window {:.2}s..{:.2}s",
            i + 1,
            label,
            event.start,
            event.end,
            window.start,
            window.end
        );

        let snippet = extract_window_text(subtitles, window).trim().to_string();
        if snippet.is_empty() {
            info!("Event {}: no subtitles in range, skipped", i + 1);
            stats.no_coverage += 1;
            continue;
        }

        examples.push(TrainingExample {
            text: snippet,
            label: label.to_string(),
        });
        stats.examples_added += 1;
    }

    Ok((examples, stats))
}

/// Curate training examples from an annotation file and a subtitle
/// transcript, then append them to the persisted dataset.
///
/// The run is one abortable unit:
/// 1. Load the subtitle transcript
/// 2. Load the annotated events
/// 3. Curate one example per usable event
/// 4. Merge into the existing dataset and rewrite it atomically
///
/// A fatal error or cancellation before step 4 leaves the persisted
/// dataset untouched.
pub fn run_curation(
    annotations: &Path,
    subtitles: &Path,
    dataset_path: &Path,
    config: CurationConfig,
    cancelled: Arc<AtomicBool>,
) -> Result<CurationReport> {
    let start_time = Instant::now();

    // ═══════════════════════════════════════════════════════════════════════
    // Stage 1: Load inputs
    // ═══════════════════════════════════════════════════════════════════════
    info!("Stage 1/3: Loading {:?} and {:?}", subtitles, annotations);

    let transcript = load_transcript(subtitles)?;
    if let Some((first, last)) = transcript.time_span() {
        info!("Subtitle span: {:.1}s ~ {:.1}s", first, last);
    }
    if transcript.skipped > 0 {
        warn!("{} malformed subtitle entries skipped", transcript.skipped);
    }

    let events = load_events(annotations)?;
    info!("Loaded {} annotated events", events.len());

    if cancelled.load(Ordering::Relaxed) {
        return Err(CurateError::Cancelled);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Stage 2: Curate examples
    // ═══════════════════════════════════════════════════════════════════════
    info!("Stage 2/3: Curating examples from {} events", events.len());

    let curation_pb = if config.show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Aligning subtitle windows...");
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let (fresh, mut stats) =
        curate_examples(&events, &transcript.entries, config.on_parse_error)?;
    stats.subtitles_skipped = transcript.skipped;

    if let Some(pb) = curation_pb {
        pb.finish_with_message(format!("✓ Curated {} examples", fresh.len()));
    }

    if cancelled.load(Ordering::Relaxed) {
        return Err(CurateError::Cancelled);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Stage 3: Merge and persist
    // ═══════════════════════════════════════════════════════════════════════
    info!("Stage 3/3: Merging into {:?}", dataset_path);

    let existing = load_dataset(dataset_path)?;
    let existing_len = existing.len();
    let combined = merge(existing, fresh);
    save_dataset(dataset_path, &combined)?;

    info!(
        "Dataset grew {} -> {} examples",
        existing_len,
        combined.len()
    );

    Ok(CurationReport {
        dataset_path: dataset_path.to_path_buf(),
        dataset_len: combined.len(),
        stats,
        total_time: start_time.elapsed(),
    })
}

/// Print a summary of a curation run.
pub fn print_curation_summary(report: &CurationReport) {
    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("                       Curation Complete                        ");
    println!("═══════════════════════════════════════════════════════════════");
    println!();
    println!("  Dataset:    {}", report.dataset_path.display());
    println!("  Total size: {} examples", report.dataset_len);
    println!();
    println!("  Events:     {}", report.stats.events_total);
    println!("    Added:            {}", report.stats.examples_added);
    println!("    Invalid label:    {}", report.stats.invalid_label);
    println!("    No coverage:      {}", report.stats.no_coverage);
    println!("    Bad time codes:   {}", report.stats.parse_failures);
    if report.stats.subtitles_skipped > 0 {
        println!();
        println!(
            "  Note: {} malformed subtitle entries were skipped",
            report.stats.subtitles_skipped
        );
    }
    println!();
    println!("  Total:      {:.2}s", report.total_time.as_secs_f64());
    println!();
    println!("═══════════════════════════════════════════════════════════════");
}
