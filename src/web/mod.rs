//! HTTP surface: prediction form, JSON API and artifact downloads

pub mod handlers;
pub mod layout;
pub mod render;

use crate::config::{AppConfig, ArtifactsConfig};
use crate::error::{AssessmentError, ScoringError, StartupError};
use crate::metrics::AssessmentMetrics;
use crate::models::pipeline::ScoringPipeline;
use crate::types::assessment::PredictionResult;
use crate::types::record::InputRecord;
use axum::{
    routing::{get, post},
    Router,
};
use layout::FormLayout;
use render::{Downloads, PageContext};
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ScoringPipeline>,
    pub metrics: Arc<AssessmentMetrics>,
    pub page: Arc<PageContext>,
    pub artifacts: Arc<ArtifactsConfig>,
}

impl AppState {
    /// Assemble state, checking the form layout against the model features
    pub fn new(config: &AppConfig, pipeline: ScoringPipeline) -> Result<Self, StartupError> {
        let layout = FormLayout::resolve(&config.ui, pipeline.features())?;

        let page = PageContext {
            ui: config.ui.clone(),
            layout,
            algorithm: config.model.algorithm.clone(),
            threshold: pipeline.threshold(),
            features: pipeline.features().names().to_vec(),
        };

        Ok(Self {
            pipeline: Arc::new(pipeline),
            metrics: Arc::new(AssessmentMetrics::new()),
            page: Arc::new(page),
            artifacts: Arc::new(config.artifacts.clone()),
        })
    }

    /// Score one submission and record its outcome
    pub fn assess(&self, record: &InputRecord) -> Result<PredictionResult, AssessmentError> {
        let start = Instant::now();

        match self.pipeline.assess(record) {
            Ok(result) => {
                let elapsed = start.elapsed();
                self.metrics
                    .record_prediction(elapsed, result.label, result.bucket);
                info!(
                    assessment_id = %result.assessment_id,
                    probability = result.probability,
                    label = result.label.as_str(),
                    bucket = result.bucket.as_str(),
                    elapsed_us = elapsed.as_micros() as u64,
                    "Prediction complete"
                );
                Ok(result)
            }
            Err(AssessmentError::Validation(err)) => {
                self.metrics.record_validation_failure();
                warn!(fields = ?err.feature_names(), "Submission rejected");
                Err(AssessmentError::Validation(err))
            }
            Err(AssessmentError::Scoring(err)) => {
                self.metrics.record_scoring_failure();
                error!(error = %err, "Scoring failed");
                Err(AssessmentError::Scoring(err))
            }
        }
    }

    /// Run [`AppState::assess`] on the blocking pool.
    ///
    /// The ONNX session call is synchronous and serialized by a mutex, so it
    /// must not hold a runtime worker.
    pub async fn assess_blocking(
        &self,
        record: InputRecord,
    ) -> Result<PredictionResult, AssessmentError> {
        let state = self.clone();
        tokio::task::spawn_blocking(move || state.assess(&record))
            .await
            .unwrap_or_else(|e| {
                self.metrics.record_scoring_failure();
                error!(error = %e, "Scoring task failed");
                Err(AssessmentError::Scoring(ScoringError::Inference(format!(
                    "scoring task failed: {}",
                    e
                ))))
            })
    }

    /// Which artifact files currently exist on disk
    pub fn downloads(&self) -> Downloads {
        Downloads {
            model: self.artifacts.model_path.is_file(),
            config: self.artifacts.config_path.is_file(),
        }
    }
}

/// Create the router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/predict", post(handlers::submit))
        .route("/api/v1/predict", post(handlers::api_predict))
        .route("/api/v1/model", get(handlers::model_info))
        .route("/api/v1/stats", get(handlers::stats))
        .route("/download/model", get(handlers::download_model))
        .route("/download/config", get(handlers::download_config))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
