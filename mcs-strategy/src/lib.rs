//! mcs-strategy library interface
//!
//! Onboarding data integration, quality scoring, field transformation and
//! strategy orchestration. Exposed as a library so integration tests and the
//! `mcs-strategy` binary share one wiring path ([`StrategyContext`]).

pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod transform;
pub mod validators;

pub use crate::error::{StrategyError, StrategyResult};

use crate::db::SqliteOnboardingStore;
use crate::services::{
    OnboardingDataIntegrationService, RecommendationProvider, StrategyOrchestrator, UnconfiguredProvider,
};
use crate::transform::FieldTransformationEngine;
use chrono::{DateTime, Utc};
use mcs_common::config::TomlConfig;
use mcs_common::CacheService;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Shared services for one process
#[derive(Clone)]
pub struct StrategyContext {
    pub db: SqlitePool,
    pub cache: Arc<CacheService>,
    pub engine: Arc<FieldTransformationEngine>,
    pub integration: Arc<OnboardingDataIntegrationService>,
    pub orchestrator: Arc<StrategyOrchestrator>,
    pub startup_time: DateTime<Utc>,
}

impl StrategyContext {
    /// Wire every service over `db` and an already constructed cache
    pub fn new(
        db: SqlitePool,
        config: &TomlConfig,
        cache: Arc<CacheService>,
        ai: Arc<dyn RecommendationProvider>,
    ) -> StrategyResult<Self> {
        let engine = Arc::new(FieldTransformationEngine::new()?);
        let store = Arc::new(SqliteOnboardingStore::new(db.clone()));
        let integration = Arc::new(OnboardingDataIntegrationService::new(
            store,
            &config.integration,
            &config.quality,
        ));
        let orchestrator = Arc::new(StrategyOrchestrator::new(
            db.clone(),
            Arc::clone(&integration),
            Arc::clone(&engine),
            Arc::clone(&cache),
            ai,
            config.ai.timeout(),
        ));

        Ok(Self {
            db,
            cache,
            engine,
            integration,
            orchestrator,
            startup_time: Utc::now(),
        })
    }

    /// Connect the configured cache backend, then wire services
    ///
    /// No AI provider is configured through TOML; strategies are created
    /// without recommendations.
    pub async fn connect(db: SqlitePool, config: &TomlConfig) -> StrategyResult<Self> {
        let cache = Arc::new(CacheService::connect(config.cache.clone()).await);
        Self::new(db, config, cache, Arc::new(UnconfiguredProvider))
    }
}
