use crate::timecode::TimecodeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CurateError {
    #[error("Event {index}: {source}")]
    TimeFormat {
        index: usize,
        source: TimecodeError,
    },

    #[error("Structural error: {0}")]
    Structural(String),

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Run cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CurateError>;
