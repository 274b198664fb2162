//! Feature validation and ordering for model inference.
//!
//! The classifier is positional: it was trained on a fixed column order, and
//! scoring a vector in any other order silently produces wrong probabilities.
//! [`FeatureSpec`] carries that order from the model config artifact.

use crate::error::{FieldError, ScoringError, StartupError, ValidationError};
use crate::types::record::{FeatureVector, InputRecord, ValidRecord};
use std::collections::{HashMap, HashSet};

/// Ordered feature names the model was trained on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSpec {
    names: Vec<String>,
}

impl FeatureSpec {
    /// Build the feature list, rejecting empty, blank or duplicate names.
    pub fn new(names: Vec<String>) -> Result<Self, StartupError> {
        if names.is_empty() {
            return Err(StartupError::NoFeatures);
        }

        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if name.trim().is_empty() || !seen.insert(name.as_str()) {
                return Err(StartupError::InvalidFeature(name.clone()));
            }
        }

        Ok(Self { names })
    }

    /// Get the number of features expected by the model.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Feature names in model column order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Check every required field, collecting all violations.
    pub fn validate(&self, record: &InputRecord) -> Result<ValidRecord, ValidationError> {
        let mut values = HashMap::with_capacity(self.names.len());
        let mut fields = Vec::new();

        for name in &self.names {
            match record.numeric(name) {
                Ok(value) => {
                    values.insert(name.clone(), value);
                }
                Err(issue) => fields.push(FieldError {
                    feature: name.clone(),
                    issue,
                }),
            }
        }

        if fields.is_empty() {
            Ok(ValidRecord::new(values))
        } else {
            Err(ValidationError { fields })
        }
    }

    /// Lay out a validated record in model column order.
    ///
    /// Fails when the record was validated against a different feature list.
    pub fn order(&self, record: &ValidRecord) -> Result<FeatureVector, ScoringError> {
        self.names
            .iter()
            .map(|name| {
                record
                    .get(name)
                    .ok_or_else(|| ScoringError::UnvalidatedFeature(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(FeatureVector::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FieldIssue;

    fn spec() -> FeatureSpec {
        FeatureSpec::new(vec![
            "admission_age".to_string(),
            "sbp".to_string(),
            "gcs_min".to_string(),
        ])
        .unwrap()
    }

    #[test]
    fn test_rejects_bad_feature_lists() {
        assert!(matches!(FeatureSpec::new(vec![]), Err(StartupError::NoFeatures)));
        assert!(matches!(
            FeatureSpec::new(vec!["a".to_string(), "a".to_string()]),
            Err(StartupError::InvalidFeature(name)) if name == "a"
        ));
        assert!(matches!(
            FeatureSpec::new(vec![" ".to_string()]),
            Err(StartupError::InvalidFeature(_))
        ));
    }

    #[test]
    fn test_order_follows_spec_not_insertion() {
        let record = InputRecord::new()
            .with("gcs_min", 14)
            .with("sbp", 110.0)
            .with("admission_age", 72.0)
            .with("extra", 1.0);

        let spec = spec();
        let valid = spec.validate(&record).unwrap();
        let vector = spec.order(&valid).unwrap();

        assert_eq!(vector.len(), spec.len());
        assert_eq!(vector.as_slice(), &[72.0, 110.0, 14.0]);
    }

    #[test]
    fn test_order_rejects_record_from_other_feature_list() {
        let narrow = FeatureSpec::new(vec!["sbp".to_string()]).unwrap();
        let valid = narrow.validate(&InputRecord::new().with("sbp", 110.0)).unwrap();

        let err = spec().order(&valid).unwrap_err();

        assert_eq!(err, ScoringError::UnvalidatedFeature("admission_age".to_string()));
    }

    #[test]
    fn test_validate_reports_every_missing_field() {
        let record = InputRecord::new().with("sbp", 110.0);

        let err = spec().validate(&record).unwrap_err();

        assert_eq!(err.feature_names(), vec!["admission_age", "gcs_min"]);
        assert!(err.fields.iter().all(|f| f.issue == FieldIssue::Missing));
    }

    #[test]
    fn test_validate_mixes_missing_and_non_numeric() {
        let record = InputRecord::new()
            .with("admission_age", "sixty")
            .with("gcs_min", 15);

        let err = spec().validate(&record).unwrap_err();

        assert_eq!(err.fields.len(), 2);
        assert_eq!(err.fields[0].issue, FieldIssue::NotNumeric);
        assert_eq!(err.fields[1].feature, "sbp");
        assert_eq!(err.fields[1].issue, FieldIssue::Missing);
    }
}
