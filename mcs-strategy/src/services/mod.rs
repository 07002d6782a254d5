//! Pipeline services

pub mod onboarding_integration;
pub mod recommendation;
pub mod strategy_orchestrator;

pub use onboarding_integration::OnboardingDataIntegrationService;
pub use recommendation::{RecommendationProvider, UnconfiguredProvider};
pub use strategy_orchestrator::StrategyOrchestrator;
