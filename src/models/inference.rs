//! Classifier binding for delirium risk inference

use crate::error::{ScoringError, StartupError};
use crate::models::loader::{LoadedModel, ModelLoader};
use ort::memory::Allocator;
use ort::value::{DynMapValueType, DynSequenceValueType, DowncastableTarget};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

/// Opaque binary classifier.
///
/// Implementations must be deterministic for a given input and artifact.
pub trait Scorer: Send + Sync {
    /// Class probabilities `[P(class=0), P(class=1)]` for one ordered vector.
    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2], ScoringError>;

    /// Number of input columns, when the model declares one.
    fn input_width(&self) -> Option<usize> {
        None
    }

    /// Model name for logs
    fn name(&self) -> &str;
}

/// Gradient-boosted classifier exported to ONNX
pub struct OnnxScorer {
    /// Session needs exclusive access while running
    model: Mutex<LoadedModel>,
    name: String,
    input_width: Option<usize>,
}

impl OnnxScorer {
    /// Load the model artifact, failing startup on any error
    pub fn load<P: AsRef<Path>>(path: P, onnx_threads: usize) -> Result<Self, StartupError> {
        let loader = ModelLoader::with_threads(onnx_threads)?;
        let model = loader.load_model(path, "delirium")?;
        let name = model.name.clone();
        let input_width = model.input_width;

        Ok(Self {
            model: Mutex::new(model),
            name,
            input_width,
        })
    }

    fn run(&self, features: &[f64]) -> Result<f64, ScoringError> {
        use ort::value::Tensor;

        let mut model = self
            .model
            .lock()
            .map_err(|e| ScoringError::Lock(e.to_string()))?;
        let model = &mut *model;

        // Prepare input tensor - shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let data: Vec<f32> = features.iter().map(|&v| v as f32).collect();
        let input_tensor = Tensor::from_array((shape, data))
            .map_err(|e| ScoringError::Inference(format!("failed to create input tensor: {e}")))?;

        let outputs = model
            .session
            .run(ort::inputs![&model.input_name => input_tensor])
            .map_err(|e| ScoringError::Inference(e.to_string()))?;

        extract_probability(&outputs, &model.output_name, &model.name)
    }
}

impl Scorer for OnnxScorer {
    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2], ScoringError> {
        let positive = self.run(features)?;
        Ok([1.0 - positive, positive])
    }

    fn input_width(&self) -> Option<usize> {
        self.input_width
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Extract the positive-class probability from model output.
///
/// Handles tensor outputs and the seq(map) outputs of CatBoost/LightGBM exports.
fn extract_probability(
    outputs: &ort::session::SessionOutputs,
    output_name: &str,
    model_name: &str,
) -> Result<f64, ScoringError> {
    if let Some(output) = outputs.get(output_name) {
        if let Some(prob) = probability_from_value(&output, model_name)? {
            return Ok(prob);
        }
    }

    for (name, output) in outputs.iter() {
        if name.contains("label") || name == output_name {
            continue;
        }
        if let Some(prob) = probability_from_value(&output, model_name)? {
            debug!(model = %model_name, output = %name, "Probability read from fallback output");
            return Ok(prob);
        }
    }

    Err(ScoringError::Inference(format!(
        "no probability output found in model '{model_name}'"
    )))
}

fn probability_from_value(
    output: &ort::value::DynValue,
    model_name: &str,
) -> Result<Option<f64>, ScoringError> {
    let dtype = output.dtype();

    if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
        let dims: Vec<i64> = shape.iter().copied().collect();
        let prob = positive_class_from_tensor(&dims, data)?;
        debug!(model = %model_name, prob = prob, "Extracted from tensor");
        return Ok(Some(prob));
    }

    if DynSequenceValueType::can_downcast(&dtype) {
        return extract_from_sequence_map(output, model_name).map(Some);
    }

    Ok(None)
}

/// Read class 1 from a `[batch, classes]`, `[classes]` or `[batch, 1]` tensor
fn positive_class_from_tensor(dims: &[i64], data: &[f32]) -> Result<f64, ScoringError> {
    let classes = dims.last().copied().unwrap_or(0);

    let value = match classes {
        c if c >= 2 => data.get(1),
        1 => data.first(),
        _ => None,
    };

    value.map(|&v| v as f64).ok_or_else(|| {
        ScoringError::Inference(format!("unexpected probability tensor shape {dims:?}"))
    })
}

/// Extract probability from seq(map(int64, float)) format
fn extract_from_sequence_map(
    output: &ort::value::DynValue,
    model_name: &str,
) -> Result<f64, ScoringError> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| ScoringError::Inference(format!("failed to downcast to sequence: {e}")))?;

    let maps = sequence
        .try_extract_sequence::<DynMapValueType>(&allocator)
        .map_err(|e| ScoringError::Inference(e.to_string()))?;

    // batch size is always 1
    let map_value = maps
        .first()
        .ok_or_else(|| ScoringError::Inference("empty probability sequence".to_string()))?;

    let kv_pairs = map_value
        .try_extract_key_values::<i64, f32>()
        .map_err(|e| ScoringError::Inference(e.to_string()))?;

    if let Some((_, prob)) = kv_pairs.iter().find(|(class_id, _)| *class_id == 1) {
        debug!(model = %model_name, prob = *prob, "Extracted from seq(map)");
        return Ok(*prob as f64);
    }

    if let Some((_, prob)) = kv_pairs.iter().find(|(class_id, _)| *class_id == 0) {
        return Ok(1.0 - *prob as f64);
    }

    Err(ScoringError::Inference("no probability found in map".to_string()))
}
