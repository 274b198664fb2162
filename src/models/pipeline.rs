//! Scoring pipeline: validate, order, score, classify and bucket

use crate::error::{AssessmentError, ScoringError, StartupError, ValidationError};
use crate::features::FeatureSpec;
use crate::models::inference::Scorer;
use crate::models::loader::ModelSettings;
use crate::types::assessment::{PredictionResult, RiskBucket, RiskLabel};
use crate::types::record::{FeatureVector, InputRecord, ValidRecord};
use std::sync::Arc;
use tracing::{debug, info};

/// Immutable scoring chain shared by every request
pub struct ScoringPipeline {
    settings: ModelSettings,
    scorer: Arc<dyn Scorer>,
}

impl ScoringPipeline {
    /// Bind settings to a scorer, checking the model accepts the feature count
    pub fn new(settings: ModelSettings, scorer: Arc<dyn Scorer>) -> Result<Self, StartupError> {
        if let Some(expected) = scorer.input_width() {
            let actual = settings.features().len();
            if expected != actual {
                return Err(StartupError::ModelShape { expected, actual });
            }
        }

        info!(
            model = %scorer.name(),
            threshold = settings.threshold(),
            feature_count = settings.features().len(),
            "Scoring pipeline ready"
        );

        Ok(Self { settings, scorer })
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    pub fn features(&self) -> &FeatureSpec {
        self.settings.features()
    }

    pub fn threshold(&self) -> f64 {
        self.settings.threshold()
    }

    pub fn model_name(&self) -> &str {
        self.scorer.name()
    }

    pub fn validate(&self, record: &InputRecord) -> Result<ValidRecord, ValidationError> {
        self.features().validate(record)
    }

    pub fn order(&self, record: &ValidRecord) -> Result<FeatureVector, ScoringError> {
        self.features().order(record)
    }

    /// Probability of the positive class for an ordered vector
    pub fn score(&self, vector: &FeatureVector) -> Result<f64, ScoringError> {
        let expected = self.features().len();
        if vector.len() != expected {
            return Err(ScoringError::ShapeMismatch {
                expected,
                actual: vector.len(),
            });
        }

        let [_, positive] = self.scorer.predict_proba(vector.as_slice())?;

        if !positive.is_finite() || !(0.0..=1.0).contains(&positive) {
            return Err(ScoringError::InvalidProbability(positive));
        }

        Ok(positive)
    }

    pub fn classify(&self, probability: f64) -> RiskLabel {
        RiskLabel::classify(probability, self.threshold())
    }

    pub fn bucket(&self, probability: f64) -> RiskBucket {
        RiskBucket::from_probability(probability)
    }

    /// Run the whole chain for one submission.
    ///
    /// The classifier is not invoked when validation fails.
    pub fn assess(&self, record: &InputRecord) -> Result<PredictionResult, AssessmentError> {
        let valid = self.validate(record)?;
        let vector = self.order(&valid)?;
        let probability = self.score(&vector)?;
        let result = PredictionResult::new(probability, self.threshold());

        debug!(
            assessment_id = %result.assessment_id,
            probability = result.probability,
            label = result.label.as_str(),
            bucket = result.bucket.as_str(),
            "Assessment complete"
        );

        Ok(result)
    }
}
