//! Data models for the onboarding pipeline

pub mod integrated_data;
pub mod quality;
pub mod records;
pub mod strategy;

pub use integrated_data::{has_content, IntegratedData, IntegratedOnboarding, SourceKind, SourceMap};
pub use quality::{DataQualityAssessment, QualityLevel};
pub use records::{
    to_source_map, ApiKeyRecord, IntegrationSnapshot, OnboardingSessionRecord, ResearchPreferencesRecord,
    WebsiteAnalysisRecord,
};
pub use strategy::ContentStrategy;
