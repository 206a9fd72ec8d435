pub mod http;
pub mod orchestrator;

pub use http::HttpClassifier;
pub use orchestrator::{classify_snippets, SnippetResult};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A true/predicted label pair for one classified event. Ephemeral: built
/// during a prediction run and exported for the reporting collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub true_label: Option<String>,
    pub predicted: String,
}

/// External text classifier: snippet text in, label out. Tokenization,
/// label vocabulary, and model weights live behind this boundary.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, snippet: &str) -> Result<String>;
    fn name(&self) -> &'static str;
}
