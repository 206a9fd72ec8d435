use crate::classify::Classifier;
use futures::stream::{FuturesUnordered, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Outcome of classifying one snippet.
#[derive(Debug)]
pub struct SnippetResult {
    /// Position of the source event in the annotation file.
    pub index: usize,
    pub label: Option<String>,
    pub error: Option<String>,
}

/// Classify snippets with bounded concurrency.
///
/// Results come back sorted by event index, so callers observe the same
/// order a sequential pass would have produced regardless of which
/// requests finished first.
pub async fn classify_snippets(
    classifier: Arc<dyn Classifier>,
    snippets: Vec<(usize, String)>,
    concurrency: usize,
    show_progress: bool,
) -> Vec<SnippetResult> {
    if snippets.is_empty() {
        return Vec::new();
    }

    let total = snippets.len();
    debug!(
        "Classifying {} snippets with {} concurrent requests using {}",
        total,
        concurrency,
        classifier.name()
    );

    let progress_bar = if show_progress {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} events ({eta})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    // Use semaphore to limit concurrency
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut futures = FuturesUnordered::new();

    for (index, snippet) in snippets {
        let sem = semaphore.clone();
        let classifier = classifier.clone();
        let pb = progress_bar.clone();

        futures.push(async move {
            let _permit = sem.acquire().await.expect("Semaphore closed");

            let result = classifier.classify(&snippet).await;

            if let Some(ref pb) = pb {
                pb.inc(1);
            }

            match result {
                Ok(label) => SnippetResult {
                    index,
                    label: Some(label),
                    error: None,
                },
                Err(e) => {
                    warn!("Event {}: classification failed: {}", index + 1, e);
                    SnippetResult {
                        index,
                        label: None,
                        error: Some(e.to_string()),
                    }
                }
            }
        });
    }

    let mut results: Vec<SnippetResult> = Vec::with_capacity(total);
    while let Some(result) = futures.next().await {
        results.push(result);
    }

    if let Some(pb) = progress_bar {
        pb.finish_with_message("Classification complete");
    }

    // Restore event order
    results.sort_by_key(|r| r.index);
    results
}
