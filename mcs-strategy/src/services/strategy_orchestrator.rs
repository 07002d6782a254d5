//! Strategy Orchestrator
//!
//! Builds a [`ContentStrategy`] from a user's integrated onboarding data:
//! integrate, transform, persist, ask the AI collaborator, persist again,
//! cache. Missing onboarding data never blocks creation; the engine's
//! defaults fill every field.

use crate::db::strategies::{load_strategy, save_strategy};
use crate::error::{AiError, StrategyError, StrategyResult};
use crate::models::{ContentStrategy, IntegratedOnboarding};
use crate::services::onboarding_integration::OnboardingDataIntegrationService;
use crate::services::recommendation::{
    build_recommendation_prompt, recommendation_schema, validate_response, RecommendationProvider,
};
use crate::transform::{FieldTransformationEngine, TransformResult};
use chrono::{DateTime, Utc};
use mcs_common::cache::CacheParams;
use mcs_common::{CacheService, CacheType};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Strategy Orchestrator
pub struct StrategyOrchestrator {
    pool: SqlitePool,
    integration: Arc<OnboardingDataIntegrationService>,
    engine: Arc<FieldTransformationEngine>,
    cache: Arc<CacheService>,
    ai: Arc<dyn RecommendationProvider>,
    ai_timeout: Duration,
}

impl StrategyOrchestrator {
    pub fn new(
        pool: SqlitePool,
        integration: Arc<OnboardingDataIntegrationService>,
        engine: Arc<FieldTransformationEngine>,
        cache: Arc<CacheService>,
        ai: Arc<dyn RecommendationProvider>,
        ai_timeout: Duration,
    ) -> Self {
        Self {
            pool,
            integration,
            engine,
            cache,
            ai,
            ai_timeout,
        }
    }

    /// Cached onboarding data, else the integration service, else the empty shape
    pub async fn integrated_data(&self, user_id: i64) -> IntegratedOnboarding {
        if let Some(cached) = self.cache.get_cached_onboarding_data::<IntegratedOnboarding>(user_id).await {
            debug!(user_id, "Onboarding data served from cache");
            return cached;
        }

        match self.integration.get_integrated(user_id).await {
            Some(onboarding) => {
                self.cache.cache_onboarding_data(user_id, &onboarding).await;
                onboarding
            }
            None => {
                warn!(user_id, "No integrated onboarding data, continuing with defaults");
                IntegratedOnboarding::fallback(user_id, Utc::now())
            }
        }
    }

    /// Engine output for the user's current onboarding data
    pub async fn transform_for_user(&self, user_id: i64) -> TransformResult {
        let onboarding = self.integrated_data(user_id).await;
        self.transform_onboarding(&onboarding).await
    }

    /// Transform, reusing a cached result for the same processed snapshot
    ///
    /// Fallback data is never cached so a later successful integration is
    /// picked up immediately.
    async fn transform_onboarding(&self, onboarding: &IntegratedOnboarding) -> TransformResult {
        let identifier = onboarding.user_id.to_string();
        let params = CacheParams::from([(
            "processed_at".to_string(),
            json!(onboarding.processed_at.to_rfc3339()),
        )]);

        if !onboarding.is_fallback {
            if let Some(cached) = self.cache.get(CacheType::FieldTransformation, &identifier, &params).await {
                match serde_json::from_value::<TransformResult>(cached) {
                    Ok(result) => {
                        debug!(user_id = onboarding.user_id, "Transform result served from cache");
                        return result;
                    }
                    Err(e) => warn!(user_id = onboarding.user_id, "Cached transform result unreadable: {}", e),
                }
            }
        }

        let result = self.engine.transform(&onboarding.data);

        if !onboarding.is_fallback {
            match serde_json::to_value(&result) {
                Ok(value) => {
                    self.cache
                        .set(CacheType::FieldTransformation, &identifier, value, &params)
                        .await;
                }
                Err(e) => warn!(user_id = onboarding.user_id, "Transform result not cacheable: {}", e),
            }
        }

        result
    }

    /// Create, persist and cache a new strategy for `user_id`
    pub async fn create_strategy(&self, user_id: i64, name: Option<&str>) -> StrategyResult<ContentStrategy> {
        let onboarding = self.integrated_data(user_id).await;
        let transformed = self.transform_onboarding(&onboarding).await;

        let name = name
            .map(str::to_string)
            .unwrap_or_else(|| format!("Content strategy for user {}", user_id));
        let strategy = build_strategy(Uuid::new_v4(), name, Utc::now(), &onboarding, &transformed);

        info!(
            user_id,
            strategy_id = %strategy.id,
            average_confidence = strategy.average_confidence(),
            "Creating content strategy"
        );
        self.finish(strategy).await
    }

    /// Strategy by id: cache first, then the store (repopulating the cache)
    pub async fn get_strategy(&self, id: Uuid) -> StrategyResult<ContentStrategy> {
        let key = id.to_string();
        if let Some(strategy) = self.cache.get_cached_strategy::<ContentStrategy>(&key).await {
            debug!(strategy_id = %id, "Strategy served from cache");
            return Ok(strategy);
        }

        let strategy = load_strategy(&self.pool, id)
            .await?
            .ok_or_else(|| StrategyError::NotFound(key.clone()))?;
        self.cache.cache_strategy(&key, &strategy).await;
        Ok(strategy)
    }

    /// Rebuild a strategy from freshly processed onboarding data
    ///
    /// Keeps id, name and `created_at`; everything else is regenerated.
    pub async fn refresh_strategy(&self, id: Uuid) -> StrategyResult<ContentStrategy> {
        let existing = load_strategy(&self.pool, id)
            .await?
            .ok_or_else(|| StrategyError::NotFound(id.to_string()))?;
        let user_id = existing.user_id;

        self.cache.invalidate_strategy(&id.to_string()).await;
        self.cache
            .invalidate(CacheType::OnboardingIntegration, &user_id.to_string(), &CacheParams::new())
            .await;

        let onboarding = self.integration.process(user_id).await;
        if !onboarding.is_fallback {
            self.cache.cache_onboarding_data(user_id, &onboarding).await;
        }
        let transformed = self.transform_onboarding(&onboarding).await;

        let strategy = build_strategy(id, existing.name, existing.created_at, &onboarding, &transformed);
        info!(user_id, strategy_id = %id, "Refreshing content strategy");
        self.finish(strategy).await
    }

    /// Persist, attach AI recommendations, persist again, cache
    async fn finish(&self, mut strategy: ContentStrategy) -> StrategyResult<ContentStrategy> {
        save_strategy(&self.pool, &strategy).await?;

        strategy.ai_recommendations = self.recommendations(&strategy).await;
        strategy.updated_at = Utc::now();
        save_strategy(&self.pool, &strategy).await?;

        if !self.cache.cache_strategy(&strategy.id.to_string(), &strategy).await {
            warn!(strategy_id = %strategy.id, "Strategy was saved but could not be cached");
        }
        Ok(strategy)
    }

    /// AI recommendations for the strategy, or `None` on failure or timeout
    ///
    /// Responses are cached per user and prompt.
    async fn recommendations(&self, strategy: &ContentStrategy) -> Option<Value> {
        if !self.ai.is_available() {
            debug!(provider = self.ai.name(), "AI provider unavailable, skipping recommendations");
            return None;
        }

        let prompt = build_recommendation_prompt(strategy);
        let identifier = strategy.user_id.to_string();
        let params = CacheParams::from([("prompt".to_string(), json!(prompt))]);

        if let Some(cached) = self.cache.get(CacheType::AiAnalysis, &identifier, &params).await {
            debug!(strategy_id = %strategy.id, "AI recommendations served from cache");
            return Some(cached);
        }

        let schema = recommendation_schema();
        let outcome = match tokio::time::timeout(self.ai_timeout, self.ai.call(&prompt, &schema)).await {
            Ok(result) => result.and_then(validate_response),
            Err(_) => Err(AiError::Timeout(self.ai_timeout)),
        };

        match outcome {
            Ok(response) => {
                self.cache
                    .set(CacheType::AiAnalysis, &identifier, response.clone(), &params)
                    .await;
                Some(response)
            }
            Err(e) => {
                warn!(
                    strategy_id = %strategy.id,
                    provider = self.ai.name(),
                    "AI recommendations unavailable: {}",
                    e
                );
                None
            }
        }
    }
}

/// Assemble a strategy record from engine output
pub fn build_strategy(
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
    onboarding: &IntegratedOnboarding,
    transformed: &TransformResult,
) -> ContentStrategy {
    let mut strategy = ContentStrategy {
        id,
        user_id: onboarding.user_id,
        name,
        fields: Default::default(),
        field_confidence: Default::default(),
        field_sources: Default::default(),
        data_quality: onboarding.data_quality.clone(),
        ai_recommendations: None,
        created_at,
        updated_at: Utc::now(),
    };

    for (field, output) in &transformed.fields {
        strategy.fields.insert(field.clone(), output.value.clone());
        strategy.field_confidence.insert(field.clone(), output.confidence);
        strategy.field_sources.insert(field.clone(), output.source.clone());
    }

    strategy
}
