#![allow(dead_code)]

use delirium_risk::{
    AppConfig, AppState, FeatureSpec, InputRecord, ModelSettings, Scorer, ScoringError,
    ScoringPipeline,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

pub const THRESHOLD: f64 = 0.4585;

pub const FEATURES: [&str; 14] = [
    "admission_age",
    "hypertension",
    "sbp",
    "spo2",
    "temperature",
    "urineoutput_24h",
    "platelet",
    "creatinine",
    "potassium",
    "hemoglobin",
    "charlson_comorbidity_index",
    "gcs_min",
    "apsiii",
    "oasis",
];

/// Scorer returning a preset probability and counting calls
pub struct StubScorer {
    probability: f64,
    calls: AtomicUsize,
}

impl StubScorer {
    pub fn new(probability: f64) -> Arc<Self> {
        Arc::new(Self {
            probability,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Scorer for StubScorer {
    fn predict_proba(&self, _features: &[f64]) -> Result<[f64; 2], ScoringError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok([1.0 - self.probability, self.probability])
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// Deterministic logistic score over the ordered vector
pub struct LogisticScorer {
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl Scorer for LogisticScorer {
    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2], ScoringError> {
        if features.len() != self.weights.len() {
            return Err(ScoringError::Inference(format!(
                "expected {} columns, got {}",
                self.weights.len(),
                features.len()
            )));
        }
        let z: f64 = self.bias
            + features
                .iter()
                .zip(&self.weights)
                .map(|(x, w)| x * w)
                .sum::<f64>();
        let p = 1.0 / (1.0 + (-z).exp());
        Ok([1.0 - p, p])
    }

    fn input_width(&self) -> Option<usize> {
        Some(self.weights.len())
    }

    fn name(&self) -> &str {
        "logistic"
    }
}

/// Scorer whose runtime always fails
pub struct FailingScorer;

impl Scorer for FailingScorer {
    fn predict_proba(&self, _features: &[f64]) -> Result<[f64; 2], ScoringError> {
        Err(ScoringError::Inference(
            "Non-zero status code returned while running TreeEnsembleClassifier".to_string(),
        ))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Scorer that reports when a call starts and then waits to be released
pub struct GateScorer {
    probability: f64,
    started: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
}

impl GateScorer {
    /// Returns the scorer, a receiver signalled on entry and a release sender
    pub fn new(probability: f64) -> (Arc<Self>, Receiver<()>, Sender<()>) {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let scorer = Arc::new(Self {
            probability,
            started: Mutex::new(started_tx),
            release: Mutex::new(release_rx),
        });
        (scorer, started_rx, release_tx)
    }
}

impl Scorer for GateScorer {
    fn predict_proba(&self, _features: &[f64]) -> Result<[f64; 2], ScoringError> {
        let _ = self.started.lock().unwrap().send(());
        self.release
            .lock()
            .unwrap()
            .recv()
            .map_err(|e| ScoringError::Inference(e.to_string()))?;
        Ok([1.0 - self.probability, self.probability])
    }

    fn name(&self) -> &str {
        "gate"
    }
}

pub fn settings() -> ModelSettings {
    let features = FeatureSpec::new(FEATURES.iter().map(|f| f.to_string()).collect()).unwrap();
    ModelSettings::new(THRESHOLD, features).unwrap()
}

/// A plausible first-day record for every feature
pub fn full_record() -> InputRecord {
    InputRecord::new()
        .with("admission_age", 71.0)
        .with("hypertension", 1)
        .with("sbp", 104.0)
        .with("spo2", 95.5)
        .with("temperature", 38.2)
        .with("urineoutput_24h", 650.0)
        .with("platelet", 142.0)
        .with("creatinine", 1.9)
        .with("potassium", 4.6)
        .with("hemoglobin", 9.8)
        .with("charlson_comorbidity_index", 5)
        .with("gcs_min", 11)
        .with("apsiii", 58.0)
        .with("oasis", 37.0)
}

/// Write the threshold/feature artifact the way the training job does
pub fn write_model_config(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("shap_simplified_model_threshold.json");
    let body = serde_json::json!({
        "optimal_threshold": THRESHOLD,
        "selected_features": FEATURES,
    });
    std::fs::write(&path, serde_json::to_string_pretty(&body).unwrap()).unwrap();
    path
}

/// App state over a stub scorer with artifacts in `dir`
pub fn app_state(dir: &Path, scorer: Arc<dyn Scorer>) -> AppState {
    let mut config = AppConfig::default();
    config.artifacts.config_path = write_model_config(dir);
    config.artifacts.model_path = dir.join("shap_simplified_model.onnx");

    let settings = ModelSettings::load(&config.artifacts.config_path).unwrap();
    let pipeline = ScoringPipeline::new(settings, scorer).unwrap();
    AppState::new(&config, pipeline).unwrap()
}
