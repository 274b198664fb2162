mod common;

use common::{full_record, settings, LogisticScorer, StubScorer, FEATURES, THRESHOLD};
use delirium_risk::{
    AssessmentError, InputRecord, ModelSettings, RiskBucket, RiskLabel, ScoringError,
    ScoringPipeline, StartupError,
};
use std::sync::Arc;

fn pipeline_with(probability: f64) -> (ScoringPipeline, Arc<StubScorer>) {
    let scorer = StubScorer::new(probability);
    let pipeline = ScoringPipeline::new(settings(), scorer.clone()).unwrap();
    (pipeline, scorer)
}

#[test]
fn positive_submission_above_threshold() {
    let (pipeline, _) = pipeline_with(0.62);
    let result = pipeline.assess(&full_record()).unwrap();

    assert_eq!(result.label, RiskLabel::Positive);
    assert_eq!(result.label.headline(), "High Risk: Delirium Likely / 高风险：可能发生谵妄");
    // 0.62 sits in [0.3, 0.7)
    assert_eq!(result.bucket, RiskBucket::Moderate);
    assert_eq!(result.probability_display(), "0.6200");
    assert_eq!(result.threshold, THRESHOLD);
}

#[test]
fn negative_submission_low_bucket() {
    let (pipeline, _) = pipeline_with(0.10);
    let result = pipeline.assess(&full_record()).unwrap();

    assert_eq!(result.label, RiskLabel::Negative);
    assert_eq!(result.bucket, RiskBucket::Low);
    assert_eq!(result.recommendations[0].text, "Maintain routine monitoring");
}

#[test]
fn two_missing_fields_are_both_reported_without_scoring() {
    let (pipeline, scorer) = pipeline_with(0.5);
    let mut record = full_record();
    record.remove("spo2");
    record.remove("oasis");

    let err = pipeline.assess(&record).unwrap_err();

    match err {
        AssessmentError::Validation(v) => assert_eq!(v.feature_names(), vec!["spo2", "oasis"]),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(scorer.calls(), 0);
}

#[test]
fn probability_of_exactly_one_is_high() {
    let (pipeline, _) = pipeline_with(1.0);
    let result = pipeline.assess(&full_record()).unwrap();

    assert_eq!(result.label, RiskLabel::Positive);
    assert_eq!(result.bucket, RiskBucket::High);
}

#[test]
fn probability_equal_to_threshold_is_positive() {
    let (pipeline, _) = pipeline_with(THRESHOLD);
    assert_eq!(pipeline.assess(&full_record()).unwrap().label, RiskLabel::Positive);
}

#[test]
fn every_missing_field_is_listed() {
    let (pipeline, _) = pipeline_with(0.5);
    let err = pipeline.validate(&InputRecord::new()).unwrap_err();

    assert_eq!(err.fields.len(), FEATURES.len());
    assert_eq!(err.feature_names(), FEATURES.to_vec());
}

#[test]
fn order_matches_feature_spec_for_any_insertion_order() {
    let (pipeline, _) = pipeline_with(0.5);

    // Insert in reverse with distinct values so position errors show up
    let record: InputRecord = FEATURES
        .iter()
        .rev()
        .enumerate()
        .map(|(i, name)| (name.to_string(), (100 - i) as f64))
        .collect();

    let valid = pipeline.validate(&record).unwrap();
    let vector = pipeline.order(&valid).unwrap();

    assert_eq!(vector.len(), FEATURES.len());
    for (i, name) in FEATURES.iter().enumerate() {
        assert_eq!(vector.as_slice()[i], valid.get(name).unwrap());
    }
}

#[test]
fn scoring_is_deterministic() {
    let scorer = LogisticScorer {
        weights: (0..FEATURES.len()).map(|i| (i as f64 - 7.0) / 1000.0).collect(),
        bias: -0.2,
    };
    let pipeline = ScoringPipeline::new(settings(), Arc::new(scorer)).unwrap();

    let valid = pipeline.validate(&full_record()).unwrap();
    let vector = pipeline.order(&valid).unwrap();

    let first = pipeline.score(&vector).unwrap();
    let second = pipeline.score(&vector).unwrap();
    assert_eq!(first.to_bits(), second.to_bits());
    assert!((0.0..=1.0).contains(&first));
}

#[test]
fn scorer_failure_carries_original_message() {
    let pipeline = ScoringPipeline::new(settings(), Arc::new(common::FailingScorer)).unwrap();

    let err = pipeline.assess(&full_record()).unwrap_err();

    match err {
        AssessmentError::Scoring(ScoringError::Inference(msg)) => {
            assert!(msg.contains("TreeEnsembleClassifier"))
        }
        other => panic!("expected scoring error, got {other:?}"),
    }
}

#[test]
fn model_width_must_match_feature_count() {
    let scorer = LogisticScorer {
        weights: vec![0.1; 51],
        bias: 0.0,
    };

    match ScoringPipeline::new(settings(), Arc::new(scorer)) {
        Err(StartupError::ModelShape { expected, actual }) => {
            assert_eq!((expected, actual), (51, 14));
        }
        Err(other) => panic!("unexpected error {other}"),
        Ok(_) => panic!("mismatched model accepted"),
    }
}

#[test]
fn settings_load_from_artifact_file() {
    let tmp = tempfile::tempdir().unwrap();
    let path = common::write_model_config(tmp.path());

    let settings = ModelSettings::load(&path).unwrap();

    assert_eq!(settings.threshold(), THRESHOLD);
    assert_eq!(settings.features().names(), FEATURES.map(String::from).as_slice());
}

#[test]
fn corrupt_artifact_is_a_startup_error() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("threshold.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = ModelSettings::load(&path).unwrap_err();
    assert!(matches!(err, StartupError::ConfigFormat { .. }));
}
