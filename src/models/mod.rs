//! ML model loading, inference and the scoring pipeline

pub mod inference;
pub mod loader;
pub mod pipeline;

pub use inference::{OnnxScorer, Scorer};
pub use loader::{ModelLoader, ModelSettings};
pub use pipeline::ScoringPipeline;
