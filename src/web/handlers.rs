//! HTTP handlers

use super::render::Outcome;
use super::AppState;
use crate::error::{AppError, AppResult, AssessmentError};
use crate::metrics::MetricsSnapshot;
use crate::types::assessment::PredictionResult;
use crate::types::record::InputRecord;
use axum::{
    extract::{rejection::JsonRejection, Form, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

/// Empty form
pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(state.page.render(None, &Outcome::Empty, state.downloads()))
}

/// Form submission
pub async fn submit(
    State(state): State<AppState>,
    Form(fields): Form<HashMap<String, String>>,
) -> (StatusCode, Html<String>) {
    let record = InputRecord::from_form(fields);

    let (status, outcome) = match state.assess_blocking(record.clone()).await {
        Ok(result) => (StatusCode::OK, Outcome::Predicted(result)),
        Err(AssessmentError::Validation(err)) => {
            (StatusCode::UNPROCESSABLE_ENTITY, Outcome::Invalid(err))
        }
        Err(AssessmentError::Scoring(err)) => {
            (StatusCode::INTERNAL_SERVER_ERROR, Outcome::Failed(err))
        }
    };

    (
        status,
        Html(state.page.render(Some(&record), &outcome, state.downloads())),
    )
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub features: InputRecord,
}

/// JSON scoring endpoint
pub async fn api_predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> AppResult<Json<PredictionResult>> {
    let Json(req) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let result = state.assess_blocking(req.features).await?;
    Ok(Json(result))
}

#[derive(Debug, Serialize)]
pub struct ModelInfo {
    algorithm: String,
    model: String,
    threshold: f64,
    features: Vec<String>,
}

pub async fn model_info(State(state): State<AppState>) -> Json<ModelInfo> {
    Json(ModelInfo {
        algorithm: state.page.algorithm.clone(),
        model: state.pipeline.model_name().to_string(),
        threshold: state.pipeline.threshold(),
        features: state.pipeline.features().names().to_vec(),
    })
}

pub async fn stats(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

pub async fn download_model(State(state): State<AppState>) -> AppResult<Response> {
    serve_file(
        &state.artifacts.model_path,
        &state.artifacts.model_download_name,
        "application/octet-stream",
        "Model file not available for download",
    )
    .await
}

pub async fn download_config(State(state): State<AppState>) -> AppResult<Response> {
    serve_file(
        &state.artifacts.config_path,
        &state.artifacts.config_download_name,
        "application/json",
        "Config file not available for download",
    )
    .await
}

/// Send an artifact as an attachment; a missing file is a 404, not a failure
async fn serve_file(
    path: &Path,
    download_name: &str,
    content_type: &'static str,
    unavailable: &str,
) -> AppResult<Response> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        warn!(path = %path.display(), error = %e, "Artifact not available for download");
        AppError::NotFound(unavailable.to_string())
    })?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        download_name.replace(['"', '\\'], "_")
    );

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: i64,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
    })
}
