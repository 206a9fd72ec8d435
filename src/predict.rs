use crate::annotation::{load_events, Event};
use crate::classify::{classify_snippets, Classifier, PredictionRecord};
use crate::config::ParseErrorPolicy;
use crate::error::{CurateError, Result};
use crate::subtitle::{extract_window_text, load_transcript, SubtitleEntry, Window};
use crate::timecode::parse_timecode;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Configuration for a prediction run.
#[derive(Debug, Clone)]
pub struct PredictConfig {
    pub on_parse_error: ParseErrorPolicy,
    /// Concurrent classifier requests.
    pub concurrency: usize,
    /// Show progress bars.
    pub show_progress: bool,
}

impl Default for PredictConfig {
    fn default() -> Self {
        Self {
            on_parse_error: ParseErrorPolicy::default(),
            concurrency: 4,
            show_progress: true,
        }
    }
}

/// How an event lined up against the subtitle transcript.
#[derive(Debug, Clone, PartialEq)]
pub enum Alignment {
    /// Non-empty subtitle text in the event's lead-in window.
    Snippet(String),
    /// The window overlapped no subtitle text.
    NoCoverage,
    /// The event's time codes could not be parsed (skip policy only).
    BadTimecode(String),
}

/// One event paired with its alignment outcome.
#[derive(Debug, Clone)]
pub struct AlignedEvent {
    pub index: usize,
    pub event: Event,
    pub alignment: Alignment,
}

/// Counters from one prediction run.
#[derive(Debug, Clone, Default)]
pub struct PredictionStats {
    pub events_total: usize,
    pub classified: usize,
    pub no_coverage: usize,
    pub parse_failures: usize,
    pub classifier_failures: usize,
    pub correct: usize,
}

/// Result of a full prediction run.
#[derive(Debug)]
pub struct PredictionOutcome {
    pub report_path: PathBuf,
    pub pairs_path: PathBuf,
    /// True/predicted pairs for the reporting collaborator, event order.
    pub records: Vec<PredictionRecord>,
    pub stats: PredictionStats,
    pub total_time: Duration,
}

/// Align every event with its lead-in window of subtitle text. Label
/// validity is ignored here: predictions are attempted even for events
/// that would not qualify for training.
pub fn align_events(
    events: &[Event],
    subtitles: &[SubtitleEntry],
    on_parse_error: ParseErrorPolicy,
) -> Result<Vec<AlignedEvent>> {
    let mut aligned = Vec::with_capacity(events.len());

    for (i, event) in events.iter().enumerate() {
        let window = match (parse_timecode(&event.start), parse_timecode(&event.end)) {
            (Ok(start), Ok(end)) => Window::with_lead_in(start, end),
            (Err(e), _) | (_, Err(e)) => {
                match on_parse_error {
                    ParseErrorPolicy::Abort => {
                        return Err(CurateError::TimeFormat {
                            index: i + 1,
                            source: e,
                        });
                    }
                    ParseErrorPolicy::Skip => {
                        warn!("Event {}: {}", i + 1, e);
                        aligned.push(AlignedEvent {
                            index: i,
                            event: event.clone(),
                            alignment: Alignment::BadTimecode(e.to_string()),
                        });
                        continue;
                    }
                }
            }
        };

        let snippet = extract_window_text(subtitles, window).trim().to_string();
        let alignment = if snippet.is_empty() {
            info!("Event {}: no subtitles in range", i + 1);
            Alignment::NoCoverage
        } else {
            Alignment::Snippet(snippet)
        };

        aligned.push(AlignedEvent {
            index: i,
            event: event.clone(),
            alignment,
        });
    }

    Ok(aligned)
}

fn display_label(event: &Event) -> &str {
    event.label.as_deref().unwrap_or("none")
}

/// Render the human-readable per-event report: one block per event with
/// the time range, true label, and either the snippet plus prediction or
/// the reason no prediction was made.
fn render_report(aligned: &[AlignedEvent], predictions: &HashMap<usize, String>) -> String {
    let mut blocks = Vec::with_capacity(aligned.len());

    for item in aligned {
        let header = format!(
            "{} ~ {} ({})",
            item.event.start,
            item.event.end,
            display_label(&item.event)
        );

        let block = match &item.alignment {
            Alignment::Snippet(snippet) => match predictions.get(&item.index) {
                Some(predicted) => format!(
                    "{}\nSubtitle: {}\nPredicted: {}\n",
                    header, snippet, predicted
                ),
                None => format!("{}: classifier returned no label\n", header),
            },
            Alignment::NoCoverage => format!("{}: no subtitles in range\n", header),
            Alignment::BadTimecode(e) => format!("{}: {}\n", header, e),
        };

        blocks.push(block);
    }

    blocks.join("\n")
}

/// Default report path: `<subtitle stem>_predict.txt` beside the input.
pub fn derive_report_path(subtitles: &Path) -> PathBuf {
    sibling_with_suffix(subtitles, "_predict.txt")
}

/// Default pair-export path: `<subtitle stem>_pairs.json` beside the input.
pub fn derive_pairs_path(subtitles: &Path) -> PathBuf {
    sibling_with_suffix(subtitles, "_pairs.json")
}

fn sibling_with_suffix(input: &Path, suffix: &str) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    let mut output = input.to_path_buf();
    output.set_file_name(format!("{}{}", stem.to_string_lossy(), suffix));
    output
}

/// Align each annotated event against the subtitle transcript, classify
/// the covered snippets, and write the per-event report plus the
/// true/predicted pairs for the reporting collaborator.
pub async fn run_prediction(
    annotations: &Path,
    subtitles: &Path,
    report_path: &Path,
    pairs_path: &Path,
    classifier: Arc<dyn Classifier>,
    config: PredictConfig,
    cancelled: Arc<AtomicBool>,
) -> Result<PredictionOutcome> {
    let start_time = Instant::now();

    // ═══════════════════════════════════════════════════════════════════════
    // Stage 1: Load and align
    // ═══════════════════════════════════════════════════════════════════════
    info!("Stage 1/3: Loading {:?} and {:?}", subtitles, annotations);

    let transcript = load_transcript(subtitles)?;
    if transcript.skipped > 0 {
        warn!("{} malformed subtitle entries skipped", transcript.skipped);
    }
    let events = load_events(annotations)?;
    info!("Loaded {} annotated events", events.len());

    let aligned = align_events(&events, &transcript.entries, config.on_parse_error)?;

    if cancelled.load(Ordering::Relaxed) {
        return Err(CurateError::Cancelled);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Stage 2: Classify covered snippets
    // ═══════════════════════════════════════════════════════════════════════
    let snippets: Vec<(usize, String)> = aligned
        .iter()
        .filter_map(|a| match &a.alignment {
            Alignment::Snippet(s) => Some((a.index, s.clone())),
            _ => None,
        })
        .collect();

    info!(
        "Stage 2/3: Classifying {} snippets with {} (concurrency: {})",
        snippets.len(),
        classifier.name(),
        config.concurrency
    );

    let results = classify_snippets(
        classifier,
        snippets,
        config.concurrency,
        config.show_progress,
    )
    .await;

    let mut stats = PredictionStats {
        events_total: events.len(),
        ..Default::default()
    };
    let mut predictions: HashMap<usize, String> = HashMap::new();

    for result in &results {
        match &result.label {
            Some(label) => {
                predictions.insert(result.index, label.clone());
            }
            None => stats.classifier_failures += 1,
        }
    }

    if cancelled.load(Ordering::Relaxed) {
        return Err(CurateError::Cancelled);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Stage 3: Report and pair export
    // ═══════════════════════════════════════════════════════════════════════
    info!("Stage 3/3: Writing {:?} and {:?}", report_path, pairs_path);

    let mut records = Vec::new();
    for item in &aligned {
        match &item.alignment {
            Alignment::Snippet(_) => {
                if let Some(predicted) = predictions.get(&item.index) {
                    if item.event.label.as_deref() == Some(predicted.as_str()) {
                        stats.correct += 1;
                    }
                    records.push(PredictionRecord {
                        true_label: item.event.label.clone(),
                        predicted: predicted.clone(),
                    });
                    stats.classified += 1;
                }
            }
            Alignment::NoCoverage => stats.no_coverage += 1,
            Alignment::BadTimecode(_) => stats.parse_failures += 1,
        }
    }

    let report = render_report(&aligned, &predictions);
    std::fs::write(report_path, report)?;

    let pairs_json = serde_json::to_string_pretty(&records)?;
    std::fs::write(pairs_path, pairs_json)?;

    info!(
        "Classified {}/{} events ({} uncovered)",
        stats.classified,
        stats.events_total,
        stats.no_coverage
    );

    Ok(PredictionOutcome {
        report_path: report_path.to_path_buf(),
        pairs_path: pairs_path.to_path_buf(),
        records,
        stats,
        total_time: start_time.elapsed(),
    })
}

/// Print a summary of a prediction run.
pub fn print_prediction_summary(outcome: &PredictionOutcome) {
    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("                      Prediction Complete                       ");
    println!("═══════════════════════════════════════════════════════════════");
    println!();
    println!("  Report:     {}", outcome.report_path.display());
    println!("  Pairs:      {}", outcome.pairs_path.display());
    println!();
    println!("  Events:     {}", outcome.stats.events_total);
    println!("    Classified:       {}", outcome.stats.classified);
    println!("    No coverage:      {}", outcome.stats.no_coverage);
    if outcome.stats.parse_failures > 0 {
        println!("    Bad time codes:   {}", outcome.stats.parse_failures);
    }
    if outcome.stats.classifier_failures > 0 {
        println!("    Classifier fails: {}", outcome.stats.classifier_failures);
    }
    println!(
        "    Matching labels:  {}/{}",
        outcome.stats.correct, outcome.stats.classified
    );
    println!();
    println!("  Total:      {:.2}s", outcome.total_time.as_secs_f64());
    println!();
    println!("═══════════════════════════════════════════════════════════════");
}
