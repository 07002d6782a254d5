//! Validators for onboarding data

pub mod data_quality_scorer;

pub use data_quality_scorer::{DataQualityScorer, QualityAssessor, SourceScores};
