use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use subcurate::classify::HttpClassifier;
use subcurate::config::Config;
use subcurate::curate::{print_curation_summary, run_curation, CurationConfig};
use subcurate::predict::{
    derive_pairs_path, derive_report_path, print_prediction_summary, run_prediction,
    PredictConfig,
};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "subcurate")]
#[command(version, about = "Subtitle-aligned dataset curation for video event classification")]
#[command(
    long_about = "Curate text-classification training data from video-event annotations and subtitle transcripts, and align the same subtitle windows at inference time."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Curate training examples and append them to the persisted dataset
    Curate {
        /// Event annotation file (JSON object with `replay_logos`)
        #[arg(short, long)]
        annotations: PathBuf,

        /// Subtitle transcript file (JSON array of timed entries)
        #[arg(short, long)]
        subtitles: PathBuf,

        /// Persisted dataset to append to (created when missing)
        #[arg(short, long, default_value = "train_dataset.json")]
        dataset: PathBuf,

        /// Policy for malformed event time codes: abort, skip
        #[arg(long)]
        on_parse_error: Option<String>,
    },

    /// Classify the aligned snippet for every annotated event
    Predict {
        /// Event annotation file (JSON object with `replay_logos`)
        #[arg(short, long)]
        annotations: PathBuf,

        /// Subtitle transcript file (JSON array of timed entries)
        #[arg(short, long)]
        subtitles: PathBuf,

        /// Per-event report file (defaults to <subtitle stem>_predict.txt)
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// True/predicted pair export (defaults to <subtitle stem>_pairs.json)
        #[arg(short, long)]
        pairs: Option<PathBuf>,

        /// Label-inference service URL (overrides config)
        #[arg(long)]
        classifier_url: Option<String>,

        /// Number of concurrent classifier requests
        #[arg(short, long)]
        concurrency: Option<usize>,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let cancelled = Arc::new(AtomicBool::new(false));
    {
        let flag = cancelled.clone();
        ctrlc::set_handler(move || {
            flag.store(true, Ordering::Relaxed);
        })
        .context("Failed to install Ctrl-C handler")?;
    }

    let mut config = Config::load().context("Failed to load configuration")?;

    match cli.command {
        Command::Curate {
            annotations,
            subtitles,
            dataset,
            on_parse_error,
        } => {
            let policy = match on_parse_error {
                Some(raw) => raw.parse().map_err(|e: String| anyhow::anyhow!(e))?,
                None => config.on_parse_error,
            };

            info!("Annotations: {}", annotations.display());
            info!("Subtitles:   {}", subtitles.display());
            info!("Dataset:     {}", dataset.display());
            info!("On parse error: {}", policy);

            let curation_config = CurationConfig {
                on_parse_error: policy,
                show_progress: true,
            };

            let report = run_curation(
                &annotations,
                &subtitles,
                &dataset,
                curation_config,
                cancelled,
            )?;
            print_curation_summary(&report);
        }

        Command::Predict {
            annotations,
            subtitles,
            report,
            pairs,
            classifier_url,
            concurrency,
        } => {
            if let Some(url) = classifier_url {
                config.classifier_url = Some(url);
            }
            if let Some(c) = concurrency {
                config.concurrency = c;
            }
            config
                .validate_for_predict()
                .context("Configuration validation failed")?;

            let endpoint = config
                .classifier_url
                .clone()
                .context("Classifier URL not configured")?;
            let mut classifier = HttpClassifier::new(endpoint.clone());
            if let Some(ref key) = config.classifier_api_key {
                classifier = classifier.with_api_key(key.clone());
            }

            let report_path = report.unwrap_or_else(|| derive_report_path(&subtitles));
            let pairs_path = pairs.unwrap_or_else(|| derive_pairs_path(&subtitles));

            info!("Annotations: {}", annotations.display());
            info!("Subtitles:   {}", subtitles.display());
            info!("Classifier:  {}", endpoint);
            info!("Report:      {}", report_path.display());

            let predict_config = PredictConfig {
                on_parse_error: config.on_parse_error,
                concurrency: config.concurrency,
                show_progress: true,
            };

            let outcome = run_prediction(
                &annotations,
                &subtitles,
                &report_path,
                &pairs_path,
                Arc::new(classifier),
                predict_config,
                cancelled,
            )
            .await?;
            print_prediction_summary(&outcome);
        }
    }

    Ok(())
}
