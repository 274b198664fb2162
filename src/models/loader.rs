//! Model artifact loading: threshold config and ONNX session

use crate::error::StartupError;
use crate::features::FeatureSpec;
use ort::session::{builder::GraphOptimizationLevel, Session};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// On-disk layout of the threshold/feature config artifact
#[derive(Debug, Deserialize)]
struct ThresholdFile {
    optimal_threshold: f64,
    selected_features: Vec<String>,
}

/// Threshold and feature order, fixed for the process lifetime
#[derive(Debug, Clone)]
pub struct ModelSettings {
    threshold: f64,
    features: FeatureSpec,
}

impl ModelSettings {
    pub fn new(threshold: f64, features: FeatureSpec) -> Result<Self, StartupError> {
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(StartupError::ThresholdOutOfRange(threshold));
        }
        Ok(Self {
            threshold,
            features,
        })
    }

    /// Parse a config artifact from JSON text
    pub fn from_json(text: &str, path: &Path) -> Result<Self, StartupError> {
        let file: ThresholdFile =
            serde_json::from_str(text).map_err(|source| StartupError::ConfigFormat {
                path: path.to_path_buf(),
                source,
            })?;

        Self::new(file.optimal_threshold, FeatureSpec::new(file.selected_features)?)
    }

    /// Load the config artifact from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StartupError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| StartupError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let settings = Self::from_json(&text, path)?;

        info!(
            path = %path.display(),
            threshold = settings.threshold,
            feature_count = settings.features.len(),
            "Model config loaded"
        );

        Ok(settings)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn features(&self) -> &FeatureSpec {
        &self.features
    }
}

/// Loaded ONNX model with metadata
pub struct LoadedModel {
    /// Model name
    pub name: String,
    /// ONNX Runtime session
    pub session: Session,
    /// Input name for the model
    pub input_name: String,
    /// Output name for probabilities
    pub output_name: String,
    /// Fixed input width declared by the graph, if any
    pub input_width: Option<usize>,
}

/// Loader for ONNX models
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Result<Self, StartupError> {
        ort::init()
            .with_name("delirium-risk")
            .commit()
            .map_err(|e| StartupError::Settings(format!("ONNX Runtime init failed: {e}")))?;
        info!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Ok(Self { onnx_threads })
    }

    /// Load a single ONNX model from file
    pub fn load_model<P: AsRef<Path>>(&self, path: P, name: &str) -> Result<LoadedModel, StartupError> {
        let path = path.as_ref();
        let model_error = |e: ort::Error| StartupError::Model {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        if !path.is_file() {
            return Err(StartupError::Model {
                path: path.to_path_buf(),
                reason: "file not found".to_string(),
            });
        }

        info!(model = %name, path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = Session::builder()
            .map_err(model_error)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(model_error)?
            .with_intra_threads(self.onnx_threads)
            .map_err(model_error)?
            .commit_from_file(path)
            .map_err(model_error)?;

        let input = session.inputs.first().ok_or_else(|| StartupError::Model {
            path: path.to_path_buf(),
            reason: "graph declares no inputs".to_string(),
        })?;
        let input_name = input.name.clone();
        let input_width = input
            .input_type
            .tensor_shape()
            .and_then(|shape| shape.last().copied())
            .filter(|&dim| dim > 0)
            .map(|dim| dim as usize);

        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.iter().find(|o| !o.name.contains("label")))
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "probabilities".to_string());

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            input_width = ?input_width,
            "Model loaded successfully"
        );

        Ok(LoadedModel {
            name: name.to_string(),
            session,
            input_name,
            output_name,
            input_width,
        })
    }
}
