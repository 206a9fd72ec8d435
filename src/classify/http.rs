use crate::classify::Classifier;
use crate::error::{CurateError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Maximum retries for API calls.
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (milliseconds).
const BASE_DELAY_MS: u64 = 1000;

/// HTTP client for a label-inference service.
///
/// The service owns the tokenizer, model weights, and label vocabulary;
/// this client only ships snippet text and reads back the label string.
pub struct HttpClassifier {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpClassifier {
    /// Create a new classifier client for the given endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: None,
        }
    }

    /// Set a bearer token sent with every request.
    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = Some(api_key);
        self
    }

    /// Make a single API request.
    async fn call_api(&self, snippet: &str) -> Result<String> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&ClassifyRequest { text: snippet });

        if let Some(ref key) = self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await?;
        let status = response.status();
        debug!("Classifier response status: {}", status);

        if status.is_success() {
            let body = response.text().await?;
            let parsed: ClassifyResponse = serde_json::from_str(&body)?;
            return Ok(parsed.label);
        }

        // Handle error responses
        let error_body = response.text().await.unwrap_or_default();

        if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&error_body) {
            return Err(CurateError::Classifier(format!(
                "API error ({}): {}",
                status, api_error.error.message
            )));
        }

        Err(CurateError::Classifier(format!(
            "API error ({}): {}",
            status, error_body
        )))
    }

    /// Classify with retry logic and exponential backoff.
    async fn classify_with_retry(&self, snippet: &str) -> Result<String> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = BASE_DELAY_MS * 2u64.pow(attempt - 1);
                debug!("Retry attempt {} after {}ms delay", attempt, delay);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            match self.call_api(snippet).await {
                Ok(label) => return Ok(label),
                Err(e) => {
                    // Don't retry on client errors
                    let error_str = e.to_string();
                    if error_str.contains("API error (4") {
                        return Err(e);
                    }
                    warn!("Attempt {} failed: {}", attempt + 1, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| CurateError::Classifier("Unknown error".to_string())))
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, snippet: &str) -> Result<String> {
        let label = self.classify_with_retry(snippet).await?;
        Ok(label.trim().to_string())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

// API request/response types

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    label: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}
