pub mod annotation;
pub mod classify;
pub mod config;
pub mod curate;
pub mod dataset;
pub mod error;
pub mod predict;
pub mod subtitle;
pub mod timecode;

pub use config::{Config, ParseErrorPolicy};
pub use curate::{
    print_curation_summary, run_curation, CurationConfig, CurationReport, CurationStats,
};
pub use error::{CurateError, Result};
pub use predict::{
    print_prediction_summary, run_prediction, PredictConfig, PredictionOutcome, PredictionStats,
};
