//! Prediction results and their derived labels

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ascending bucket boundaries: [0, 0.3) Low, [0.3, 0.7) Moderate, [0.7, 1.0] High
pub const BUCKET_BOUNDARIES: [f64; 4] = [0.0, 0.3, 0.7, 1.0];

/// Binary decision derived from the calibrated threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLabel {
    /// Delirium likely
    Positive,
    /// Delirium unlikely
    Negative,
}

impl RiskLabel {
    /// Positive iff `probability >= threshold`
    pub fn classify(probability: f64, threshold: f64) -> Self {
        if probability >= threshold {
            RiskLabel::Positive
        } else {
            RiskLabel::Negative
        }
    }

    pub fn is_positive(self) -> bool {
        self == RiskLabel::Positive
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLabel::Positive => "positive",
            RiskLabel::Negative => "negative",
        }
    }

    pub fn headline(self) -> &'static str {
        match self {
            RiskLabel::Positive => "High Risk: Delirium Likely / 高风险：可能发生谵妄",
            RiskLabel::Negative => "Low Risk: Delirium Unlikely / 低风险：可能不会发生谵妄",
        }
    }

    /// Static clinical advice, keyed only by the label
    pub fn recommendations(self) -> Vec<Recommendation> {
        let items: &[(&str, &str)] = match self {
            RiskLabel::Positive => &[
                ("Notify the attending physician immediately", "立即通知主治医师"),
                ("Implement delirium prevention measures", "实施谵妄预防措施"),
                ("Increase monitoring frequency", "增加监护频率"),
            ],
            RiskLabel::Negative => &[
                ("Maintain routine monitoring", "维持常规监护"),
                ("Observe changes in mental status", "观察精神状态变化"),
                ("Conduct regular risk assessments", "定期评估风险"),
            ],
        };

        items
            .iter()
            .map(|(en, zh)| Recommendation {
                text: en.to_string(),
                text_zh: zh.to_string(),
            })
            .collect()
    }
}

/// Coarse display band for a probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBucket {
    Low,
    Moderate,
    High,
}

impl RiskBucket {
    const ORDERED: [RiskBucket; 3] = [RiskBucket::Low, RiskBucket::Moderate, RiskBucket::High];

    /// Pick the first bucket whose upper bound exceeds the probability.
    ///
    /// Values at or above the last bound (exactly 1.0) land in `High`.
    pub fn from_probability(probability: f64) -> Self {
        BUCKET_BOUNDARIES
            .iter()
            .skip(1)
            .position(|&upper| probability < upper)
            .map(|idx| Self::ORDERED[idx])
            .unwrap_or(RiskBucket::High)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskBucket::Low => "low",
            RiskBucket::Moderate => "moderate",
            RiskBucket::High => "high",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskBucket::Low => "Low Risk / 低风险",
            RiskBucket::Moderate => "Moderate Risk / 中度风险",
            RiskBucket::High => "High Risk / 高风险",
        }
    }
}

/// One line of clinical advice in both languages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub text: String,
    pub text_zh: String,
}

/// Outcome of scoring one submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Unique assessment identifier
    pub assessment_id: String,

    /// Probability of delirium within 7 days (0.0 - 1.0)
    pub probability: f64,

    /// Threshold the label was derived from
    pub threshold: f64,

    pub label: RiskLabel,

    pub bucket: RiskBucket,

    pub recommendations: Vec<Recommendation>,

    pub assessed_at: DateTime<Utc>,
}

impl PredictionResult {
    /// Derive label, bucket and advice from a probability
    pub fn new(probability: f64, threshold: f64) -> Self {
        let label = RiskLabel::classify(probability, threshold);

        Self {
            assessment_id: Uuid::new_v4().to_string(),
            probability,
            threshold,
            label,
            bucket: RiskBucket::from_probability(probability),
            recommendations: label.recommendations(),
            assessed_at: Utc::now(),
        }
    }

    /// Probability formatted for display
    pub fn probability_display(&self) -> String {
        format!("{:.4}", self.probability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(RiskBucket::from_probability(0.0), RiskBucket::Low);
        assert_eq!(RiskBucket::from_probability(0.2999), RiskBucket::Low);
        assert_eq!(RiskBucket::from_probability(0.3), RiskBucket::Moderate);
        assert_eq!(RiskBucket::from_probability(0.6999), RiskBucket::Moderate);
        assert_eq!(RiskBucket::from_probability(0.7), RiskBucket::High);
        assert_eq!(RiskBucket::from_probability(0.9999), RiskBucket::High);
    }

    #[test]
    fn test_bucket_at_exactly_one_is_high() {
        assert_eq!(RiskBucket::from_probability(1.0), RiskBucket::High);
    }

    #[test]
    fn test_classify_is_inclusive_at_threshold() {
        assert_eq!(RiskLabel::classify(0.4585, 0.4585), RiskLabel::Positive);
        assert_eq!(RiskLabel::classify(0.4584, 0.4585), RiskLabel::Negative);
    }

    #[test]
    fn test_classify_is_monotonic() {
        let threshold = 0.4585;
        let steps: Vec<f64> = (0..=100).map(|i| i as f64 / 100.0).collect();

        for (i, &p1) in steps.iter().enumerate() {
            if RiskLabel::classify(p1, threshold).is_positive() {
                for &p2 in &steps[i..] {
                    assert_eq!(RiskLabel::classify(p2, threshold), RiskLabel::Positive);
                }
            }
        }
    }

    #[test]
    fn test_recommendations_depend_only_on_label() {
        let high = PredictionResult::new(0.95, 0.4585);
        let moderate = PredictionResult::new(0.5, 0.4585);

        assert_ne!(high.bucket, moderate.bucket);
        assert_eq!(high.recommendations, moderate.recommendations);
        assert_eq!(high.recommendations.len(), 3);
        assert_eq!(
            high.recommendations[0].text,
            "Notify the attending physician immediately"
        );
    }

    #[test]
    fn test_prediction_result_serialization() {
        let result = PredictionResult::new(0.62, 0.4585);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["label"], "positive");
        assert_eq!(json["bucket"], "moderate");
        assert_eq!(result.probability_display(), "0.6200");
    }
}
