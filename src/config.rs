use crate::error::{CurateError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Run-level policy for time-code parse failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseErrorPolicy {
    /// Fail the whole run on the first malformed time code.
    #[default]
    Abort,
    /// Log the offending event and keep going.
    Skip,
}

impl std::fmt::Display for ParseErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseErrorPolicy::Abort => write!(f, "abort"),
            ParseErrorPolicy::Skip => write!(f, "skip"),
        }
    }
}

impl std::str::FromStr for ParseErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "abort" => Ok(ParseErrorPolicy::Abort),
            "skip" => Ok(ParseErrorPolicy::Skip),
            _ => Err(format!("Unknown policy: {}. Use 'abort' or 'skip'", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub classifier_url: Option<String>,
    pub classifier_api_key: Option<String>,
    pub on_parse_error: ParseErrorPolicy,
    pub concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            classifier_url: None,
            classifier_api_key: None,
            on_parse_error: ParseErrorPolicy::default(),
            concurrency: 4,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // Load from config file if it exists
        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                if let Ok(file_config) = toml::from_str::<Config>(&contents) {
                    config = file_config;
                }
            }
        }

        // Override with environment variables
        if let Ok(url) = std::env::var("CLASSIFIER_URL") {
            config.classifier_url = Some(url);
        }
        if let Ok(key) = std::env::var("CLASSIFIER_API_KEY") {
            config.classifier_api_key = Some(key);
        }
        if let Ok(policy) = std::env::var("SUBCURATE_ON_PARSE_ERROR") {
            if let Ok(p) = policy.parse() {
                config.on_parse_error = p;
            }
        }
        if let Ok(concurrency) = std::env::var("SUBCURATE_CONCURRENCY") {
            if let Ok(c) = concurrency.parse() {
                config.concurrency = c;
            }
        }

        Ok(config)
    }

    /// Validate the fields a prediction run depends on.
    pub fn validate_for_predict(&self) -> Result<()> {
        if self.classifier_url.is_none() {
            return Err(CurateError::Config(
                "CLASSIFIER_URL not set. Point it at the label-inference service."
                    .to_string(),
            ));
        }

        if self.concurrency == 0 {
            return Err(CurateError::Config(
                "Concurrency must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("subcurate").join("config.toml"))
    }
}
