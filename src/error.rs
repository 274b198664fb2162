//! Error taxonomy for the risk service
//!
//! Startup failures are fatal. Validation and scoring failures belong to a
//! single submission and leave the service ready for the next one.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failure while loading configuration or model artifacts.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid model config {path}: {source}")]
    ConfigFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("optimal_threshold must be within [0, 1], got {0}")]
    ThresholdOutOfRange(f64),

    #[error("selected_features is empty")]
    NoFeatures,

    #[error("selected_features contains an invalid entry: {0:?}")]
    InvalidFeature(String),

    #[error("failed to load model from {path}: {reason}")]
    Model { path: PathBuf, reason: String },

    #[error("model expects {expected} features but config selects {actual}")]
    ModelShape { expected: usize, actual: usize },

    #[error("layout does not match selected features: {0}")]
    Layout(String),

    #[error("invalid settings: {0}")]
    Settings(String),
}

/// Why a single field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldIssue {
    Missing,
    NotNumeric,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldIssue::Missing => f.write_str("missing"),
            FieldIssue::NotNumeric => f.write_str("not numeric"),
        }
    }
}

/// One rejected field of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub feature: String,
    pub issue: FieldIssue,
}

/// Every field that failed validation, in feature order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} field(s) require a valid value: {}", .fields.len(), field_list(.fields))]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

fn field_list(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{} ({})", f.feature, f.issue))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationError {
    /// Names of the offending features.
    pub fn feature_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.feature.as_str()).collect()
    }
}

/// Failure of the classifier on a structurally valid input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    #[error("model inference failed: {0}")]
    Inference(String),

    #[error("model returned an invalid probability: {0}")]
    InvalidProbability(f64),

    #[error("feature vector has {actual} values, model expects {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("model session unavailable: {0}")]
    Lock(String),

    #[error("feature {0} was not part of the validated record")]
    UnvalidatedFeature(String),
}

/// Outcome of a failed assessment.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssessmentError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

pub type AppResult<T> = Result<T, AppError>;

/// Errors surfaced by the JSON API.
#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    Scoring(ScoringError),
    NotFound(String),
    BadRequest(String),
}

impl From<AssessmentError> for AppError {
    fn from(err: AssessmentError) -> Self {
        match err {
            AssessmentError::Validation(e) => AppError::Validation(e),
            AssessmentError::Scoring(e) => AppError::Scoring(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation(err) => {
                let status = StatusCode::UNPROCESSABLE_ENTITY;
                (
                    status,
                    json!({
                        "error": "Input errors",
                        "status": status.as_u16(),
                        "fields": err.fields,
                    }),
                )
            }
            AppError::Scoring(err) => {
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                (
                    status,
                    json!({
                        "error": format!("Prediction error: {}", err),
                        "hint": "Please check the input data format",
                        "status": status.as_u16(),
                    }),
                )
            }
            AppError::NotFound(msg) => {
                let status = StatusCode::NOT_FOUND;
                (status, json!({ "error": msg, "status": status.as_u16() }))
            }
            AppError::BadRequest(msg) => {
                let status = StatusCode::BAD_REQUEST;
                (status, json!({ "error": msg, "status": status.as_u16() }))
            }
        };

        (status, Json(body)).into_response()
    }
}
