//! ICU Delirium Risk Prediction Service
//!
//! Scores a fixed set of first-day ICU measurements for sepsis patients with a
//! pretrained gradient-boosted classifier and a calibrated threshold, and
//! serves the result through a bilingual web form and a JSON API.

pub mod config;
pub mod error;
pub mod features;
pub mod metrics;
pub mod models;
pub mod types;
pub mod web;

pub use config::AppConfig;
pub use error::{AssessmentError, ScoringError, StartupError, ValidationError};
pub use features::FeatureSpec;
pub use models::{ModelSettings, OnnxScorer, Scorer, ScoringPipeline};
pub use types::{InputRecord, PredictionResult, RiskBucket, RiskLabel};
pub use web::{create_router, AppState};
