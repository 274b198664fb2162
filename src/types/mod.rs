//! Type definitions for the risk service

pub mod assessment;
pub mod record;

pub use assessment::{PredictionResult, Recommendation, RiskBucket, RiskLabel};
pub use record::{FeatureVector, InputRecord, ValidRecord};
