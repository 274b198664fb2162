//! Delirium Risk Service - Main Entry Point
//!
//! Loads the model artifacts once, then serves the prediction form and JSON
//! API until interrupted.

use anyhow::{Context, Result};
use delirium_risk::{
    config::{AppConfig, LoggingConfig},
    create_router, AppState, ModelSettings, OnnxScorer, ScoringPipeline, StartupError,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;

    init_logging(&config.logging);
    info!("Starting Delirium Risk Service");

    let state = match load_state(&config) {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "Model loading failed");
            return Err(e).context("Model loading failed");
        }
    };

    info!(
        algorithm = %config.model.algorithm,
        threshold = format!("{:.4}", state.pipeline.threshold()),
        features = state.pipeline.features().len(),
        layout = ?state.page.layout.kind,
        "Model ready"
    );

    let metrics = state.metrics.clone();
    let app = create_router(state);

    let addr = config.listen_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Service shutting down...");
    metrics.print_summary();

    Ok(())
}

fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Load both artifacts and build the shared state; any failure is fatal
fn load_state(config: &AppConfig) -> Result<AppState, StartupError> {
    let settings = ModelSettings::load(&config.artifacts.config_path)?;
    let scorer = OnnxScorer::load(&config.artifacts.model_path, config.artifacts.onnx_threads)?;
    let pipeline = ScoringPipeline::new(settings, Arc::new(scorer))?;
    AppState::new(config, pipeline)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
