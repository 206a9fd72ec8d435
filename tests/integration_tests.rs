//! Integration tests for subcurate
//!
//! These validate full curation and prediction runs over real files
//! without requiring an external inference service.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use subcurate::classify::Classifier;
use subcurate::config::ParseErrorPolicy;
use subcurate::curate::{run_curation, CurationConfig};
use subcurate::dataset::{load_dataset, TrainingExample};
use subcurate::error::{CurateError, Result};
use subcurate::predict::{run_prediction, PredictConfig};
use tempfile::TempDir;

fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn quiet_curation(policy: ParseErrorPolicy) -> CurationConfig {
    CurationConfig {
        on_parse_error: policy,
        show_progress: false,
    }
}

fn not_cancelled() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}

// ============================================================================
// Curation Run Tests
// ============================================================================

mod curation_tests {
    use super::*;

    #[test]
    fn test_curation_end_to_end() {
        let dir = TempDir::new().unwrap();
        let subs = write_file(
            &dir,
            "sub.json",
            r#"[
                {"start": 0, "end": 10, "text": "a"},
                {"start": 20, "end": 40, "text": "b"}
            ]"#,
        );
        let labs = write_file(
            &dir,
            "lab.json",
            r#"{"replay_logos": [{"start": "0:40", "end": "0:50", "event": "Goal"}]}"#,
        );
        let dataset = dir.path().join("train_dataset.json");

        let report = run_curation(
            &labs,
            &subs,
            &dataset,
            quiet_curation(ParseErrorPolicy::Abort),
            not_cancelled(),
        )
        .unwrap();

        // Window is [10, 50]: only the second caption overlaps.
        assert_eq!(report.dataset_len, 1);
        assert_eq!(report.stats.examples_added, 1);

        let stored = load_dataset(&dataset).unwrap();
        assert_eq!(
            stored,
            vec![TrainingExample {
                text: "b".to_string(),
                label: "Goal".to_string(),
            }]
        );
    }

    #[test]
    fn test_nothing_label_emits_no_example() {
        let dir = TempDir::new().unwrap();
        let subs = write_file(
            &dir,
            "sub.json",
            r#"[{"start": 0, "end": 100, "text": "plenty of context"}]"#,
        );
        let labs = write_file(
            &dir,
            "lab.json",
            r#"{"replay_logos": [{"start": "0:40", "end": "0:50", "event": "nothing"}]}"#,
        );
        let dataset = dir.path().join("train_dataset.json");

        let report = run_curation(
            &labs,
            &subs,
            &dataset,
            quiet_curation(ParseErrorPolicy::Abort),
            not_cancelled(),
        )
        .unwrap();

        assert_eq!(report.dataset_len, 0);
        assert_eq!(report.stats.invalid_label, 1);
        assert!(load_dataset(&dataset).unwrap().is_empty());
    }

    #[test]
    fn test_uncovered_event_emits_no_example() {
        let dir = TempDir::new().unwrap();
        let subs = write_file(
            &dir,
            "sub.json",
            r#"[{"start": 500, "end": 510, "text": "far away"}]"#,
        );
        let labs = write_file(
            &dir,
            "lab.json",
            r#"{"replay_logos": [{"start": "0:40", "end": "0:50", "event": "Goal"}]}"#,
        );
        let dataset = dir.path().join("train_dataset.json");

        let report = run_curation(
            &labs,
            &subs,
            &dataset,
            quiet_curation(ParseErrorPolicy::Abort),
            not_cancelled(),
        )
        .unwrap();

        assert_eq!(report.dataset_len, 0);
        assert_eq!(report.stats.no_coverage, 1);
    }

    #[test]
    fn test_repeated_runs_append_without_dedup() {
        let dir = TempDir::new().unwrap();
        let subs = write_file(
            &dir,
            "sub.json",
            r#"[{"start": 20, "end": 40, "text": "b"}]"#,
        );
        let labs = write_file(
            &dir,
            "lab.json",
            r#"{"replay_logos": [{"start": "0:40", "end": "0:50", "event": "Goal"}]}"#,
        );
        let dataset = dir.path().join("train_dataset.json");

        for _ in 0..2 {
            run_curation(
                &labs,
                &subs,
                &dataset,
                quiet_curation(ParseErrorPolicy::Abort),
                not_cancelled(),
            )
            .unwrap();
        }

        let stored = load_dataset(&dataset).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0], stored[1]);
    }

    #[test]
    fn test_abort_leaves_dataset_untouched() {
        let dir = TempDir::new().unwrap();
        let subs = write_file(
            &dir,
            "sub.json",
            r#"[{"start": 0, "end": 100, "text": "context"}]"#,
        );
        let labs = write_file(
            &dir,
            "lab.json",
            r#"{"replay_logos": [{"start": "1:2:3:4", "end": "0:50", "event": "Goal"}]}"#,
        );
        let dataset = dir.path().join("train_dataset.json");
        let prior = r#"[
  {
    "text": "existing",
    "label": "Foul"
  }
]"#;
        std::fs::write(&dataset, prior).unwrap();

        let result = run_curation(
            &labs,
            &subs,
            &dataset,
            quiet_curation(ParseErrorPolicy::Abort),
            not_cancelled(),
        );

        assert!(matches!(
            result,
            Err(CurateError::TimeFormat { index: 1, .. })
        ));
        assert_eq!(std::fs::read_to_string(&dataset).unwrap(), prior);
    }

    #[test]
    fn test_skip_policy_curates_remaining_events() {
        let dir = TempDir::new().unwrap();
        let subs = write_file(
            &dir,
            "sub.json",
            r#"[{"start": 0, "end": 100, "text": "context"}]"#,
        );
        let labs = write_file(
            &dir,
            "lab.json",
            r#"{"replay_logos": [
                {"start": "1:2:3:4", "end": "0:50", "event": "Foul"},
                {"start": "0:40", "end": "0:50", "event": "Goal"}
            ]}"#,
        );
        let dataset = dir.path().join("train_dataset.json");

        let report = run_curation(
            &labs,
            &subs,
            &dataset,
            quiet_curation(ParseErrorPolicy::Skip),
            not_cancelled(),
        )
        .unwrap();

        assert_eq!(report.dataset_len, 1);
        assert_eq!(report.stats.parse_failures, 1);
        assert_eq!(load_dataset(&dataset).unwrap()[0].label, "Goal");
    }

    #[test]
    fn test_structural_error_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let subs = write_file(
            &dir,
            "sub.json",
            r#"[{"start": 0, "end": 100, "text": "context"}]"#,
        );
        let labs = write_file(&dir, "lab.json", r#"{"wrong_key": []}"#);
        let dataset = dir.path().join("train_dataset.json");

        let result = run_curation(
            &labs,
            &subs,
            &dataset,
            quiet_curation(ParseErrorPolicy::Abort),
            not_cancelled(),
        );

        assert!(matches!(result, Err(CurateError::Structural(_))));
        assert!(!dataset.exists());
    }

    #[test]
    fn test_malformed_subtitle_entry_recovered() {
        let dir = TempDir::new().unwrap();
        let subs = write_file(
            &dir,
            "sub.json",
            r#"[
                {"start": 20, "end": 40},
                {"start": 20, "end": 40, "text": "usable"}
            ]"#,
        );
        let labs = write_file(
            &dir,
            "lab.json",
            r#"{"replay_logos": [{"start": "0:40", "end": "0:50", "event": "Goal"}]}"#,
        );
        let dataset = dir.path().join("train_dataset.json");

        let report = run_curation(
            &labs,
            &subs,
            &dataset,
            quiet_curation(ParseErrorPolicy::Abort),
            not_cancelled(),
        )
        .unwrap();

        assert_eq!(report.dataset_len, 1);
        assert_eq!(report.stats.subtitles_skipped, 1);
        assert_eq!(load_dataset(&dataset).unwrap()[0].text, "usable");
    }
}

// ============================================================================
// Prediction Run Tests
// ============================================================================

mod prediction_tests {
    use super::*;
    use subcurate::classify::PredictionRecord;

    /// Classifier that always answers with the same label.
    struct FixedClassifier(&'static str);

    #[async_trait]
    impl Classifier for FixedClassifier {
        async fn classify(&self, _snippet: &str) -> Result<String> {
            Ok(self.0.to_string())
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    fn quiet_predict() -> PredictConfig {
        PredictConfig {
            on_parse_error: ParseErrorPolicy::Abort,
            concurrency: 2,
            show_progress: false,
        }
    }

    fn write_prediction_inputs(dir: &TempDir) -> (PathBuf, PathBuf) {
        let subs = write_file(
            dir,
            "sub.json",
            r#"[
                {"start": 15, "end": 25, "text": "crowd goes wild"},
                {"start": 590, "end": 600, "text": "closing remarks"}
            ]"#,
        );
        let labs = write_file(
            dir,
            "lab.json",
            r#"{"replay_logos": [
                {"start": "0:40", "end": "0:50", "event": "Goal"},
                {"start": "3:00", "end": "3:10", "event": "Foul"},
                {"start": "10:00", "end": "10:05", "event": null}
            ]}"#,
        );
        (labs, subs)
    }

    #[tokio::test]
    async fn test_prediction_end_to_end() {
        let dir = TempDir::new().unwrap();
        let (labs, subs) = write_prediction_inputs(&dir);
        let report_path = dir.path().join("predict.txt");
        let pairs_path = dir.path().join("pairs.json");

        let outcome = run_prediction(
            &labs,
            &subs,
            &report_path,
            &pairs_path,
            Arc::new(FixedClassifier("Goal")),
            quiet_predict(),
            not_cancelled(),
        )
        .await
        .unwrap();

        // Events 1 and 3 are covered; event 2's window [150, 190] is not.
        assert_eq!(outcome.stats.events_total, 3);
        assert_eq!(outcome.stats.classified, 2);
        assert_eq!(outcome.stats.no_coverage, 1);
        assert_eq!(outcome.stats.correct, 1);

        assert_eq!(
            outcome.records,
            vec![
                PredictionRecord {
                    true_label: Some("Goal".to_string()),
                    predicted: "Goal".to_string(),
                },
                PredictionRecord {
                    true_label: None,
                    predicted: "Goal".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_prediction_report_contents() {
        let dir = TempDir::new().unwrap();
        let (labs, subs) = write_prediction_inputs(&dir);
        let report_path = dir.path().join("predict.txt");
        let pairs_path = dir.path().join("pairs.json");

        run_prediction(
            &labs,
            &subs,
            &report_path,
            &pairs_path,
            Arc::new(FixedClassifier("Goal")),
            quiet_predict(),
            not_cancelled(),
        )
        .await
        .unwrap();

        let report = std::fs::read_to_string(&report_path).unwrap();

        assert!(report.contains("0:40 ~ 0:50 (Goal)"));
        assert!(report.contains("Subtitle: crowd goes wild"));
        assert!(report.contains("Predicted: Goal"));
        assert!(report.contains("3:00 ~ 3:10 (Foul): no subtitles in range"));
        assert!(report.contains("10:00 ~ 10:05 (none)"));
    }

    #[tokio::test]
    async fn test_prediction_pairs_export() {
        let dir = TempDir::new().unwrap();
        let (labs, subs) = write_prediction_inputs(&dir);
        let report_path = dir.path().join("predict.txt");
        let pairs_path = dir.path().join("pairs.json");

        run_prediction(
            &labs,
            &subs,
            &report_path,
            &pairs_path,
            Arc::new(FixedClassifier("Goal")),
            quiet_predict(),
            not_cancelled(),
        )
        .await
        .unwrap();

        let raw = std::fs::read_to_string(&pairs_path).unwrap();
        let records: Vec<PredictionRecord> = serde_json::from_str(&raw).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].true_label.as_deref(), Some("Goal"));
        assert_eq!(records[1].true_label, None);
    }

    #[tokio::test]
    async fn test_prediction_aborts_on_bad_timecode() {
        let dir = TempDir::new().unwrap();
        let subs = write_file(
            &dir,
            "sub.json",
            r#"[{"start": 0, "end": 100, "text": "context"}]"#,
        );
        let labs = write_file(
            &dir,
            "lab.json",
            r#"{"replay_logos": [{"start": "ab:cd", "end": "0:50", "event": "Goal"}]}"#,
        );
        let report_path = dir.path().join("predict.txt");
        let pairs_path = dir.path().join("pairs.json");

        let result = run_prediction(
            &labs,
            &subs,
            &report_path,
            &pairs_path,
            Arc::new(FixedClassifier("Goal")),
            quiet_predict(),
            not_cancelled(),
        )
        .await;

        assert!(matches!(result, Err(CurateError::TimeFormat { .. })));
        assert!(!report_path.exists());
    }
}

// ============================================================================
// Library Surface Tests
// ============================================================================

mod library_tests {
    use super::*;
    use subcurate::annotation::parse_events;
    use subcurate::curate::curate_examples;
    use subcurate::subtitle::parse_transcript;

    #[test]
    fn test_curation_from_parsed_inputs() {
        let transcript = parse_transcript(
            r#"[
                {"start": 0, "end": 10, "text": "a"},
                {"start": 20, "end": 40, "text": "b"}
            ]"#,
        )
        .unwrap();
        let events = parse_events(
            r#"{"replay_logos": [{"start": "0:40", "end": "0:50", "event": "Goal"}]}"#,
        )
        .unwrap();

        let (examples, stats) =
            curate_examples(&events, &transcript.entries, ParseErrorPolicy::Abort).unwrap();

        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].text, "b");
        assert_eq!(stats.events_total, 1);
    }

    #[test]
    fn test_missing_input_files() {
        let dir = TempDir::new().unwrap();
        let dataset = dir.path().join("train_dataset.json");

        let result = run_curation(
            Path::new("/nonexistent/lab.json"),
            Path::new("/nonexistent/sub.json"),
            &dataset,
            quiet_curation(ParseErrorPolicy::Abort),
            not_cancelled(),
        );

        assert!(matches!(result, Err(CurateError::FileNotFound(_))));
    }
}
