//! Onboarding Data Integration Service
//!
//! Gathers a user's onboarding records, assembles them into IntegratedData,
//! scores the result, and keeps one snapshot per user in the store.
//!
//! **Failure handling**
//! - A source that is missing or fails to load becomes an empty object
//! - Any other failure yields [`IntegratedOnboarding::fallback`]; `process`
//!   never returns an error

use crate::db::OnboardingStore;
use crate::models::{
    to_source_map, ApiKeyRecord, IntegratedData, IntegratedOnboarding, IntegrationSnapshot, SourceMap,
};
use crate::validators::{DataQualityScorer, QualityAssessor};
use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use mcs_common::config::{IntegrationConfig, QualityConfig};
use mcs_common::time::freshness_score;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Confidence for a website analysis whose status is `completed`
pub const WEBSITE_COMPLETED_CONFIDENCE: f64 = 0.9;
/// Confidence for a website analysis in any other status
pub const WEBSITE_PENDING_CONFIDENCE: f64 = 0.5;
pub const RESEARCH_CONFIDENCE: f64 = 0.9;
pub const API_KEYS_CONFIDENCE: f64 = 0.8;
pub const SESSION_CONFIDENCE: f64 = 0.7;

/// Providers that count as an analytics connection
const ANALYTICS_PROVIDERS: [&str; 3] = ["google_analytics", "analytics", "ga4"];
/// Providers that count as a search console connection
const SEARCH_CONSOLE_PROVIDERS: [&str; 3] = ["google_search_console", "search_console", "gsc"];

/// Onboarding Data Integration Service
pub struct OnboardingDataIntegrationService {
    store: Arc<dyn OnboardingStore>,
    scorer: Arc<dyn QualityAssessor>,
    snapshot_fresh_for: Duration,
    source_max_age: Duration,
}

impl OnboardingDataIntegrationService {
    pub fn new(store: Arc<dyn OnboardingStore>, integration: &IntegrationConfig, quality: &QualityConfig) -> Self {
        Self::with_assessor(
            store,
            integration,
            Arc::new(DataQualityScorer::new(quality.max_age_days)),
        )
    }

    /// Service scoring through a caller-supplied assessor
    pub fn with_assessor(
        store: Arc<dyn OnboardingStore>,
        integration: &IntegrationConfig,
        scorer: Arc<dyn QualityAssessor>,
    ) -> Self {
        Self {
            store,
            scorer,
            snapshot_fresh_for: Duration::hours(integration.snapshot_fresh_hours),
            source_max_age: Duration::days(integration.source_max_age_days),
        }
    }

    /// Assemble, score and persist a user's onboarding data
    pub async fn process(&self, user_id: i64) -> IntegratedOnboarding {
        self.process_at(user_id, Utc::now()).await
    }

    /// [`process`](Self::process) as of `now`
    pub async fn process_at(&self, user_id: i64, now: DateTime<Utc>) -> IntegratedOnboarding {
        match self.try_process(user_id, now).await {
            Ok(result) => result,
            Err(e) => {
                error!(user_id, "Onboarding integration failed, using empty fallback: {:#}", e);
                IntegratedOnboarding::fallback(user_id, now)
            }
        }
    }

    /// Stored snapshot if fresh, else a newly processed (and persisted) one
    ///
    /// `None` only when processing fell back to the empty result.
    pub async fn get_integrated(&self, user_id: i64) -> Option<IntegratedOnboarding> {
        self.get_integrated_at(user_id, Utc::now()).await
    }

    pub async fn get_integrated_at(&self, user_id: i64, now: DateTime<Utc>) -> Option<IntegratedOnboarding> {
        match self.store.load_integration_snapshot(user_id).await {
            Ok(Some(snapshot)) if now - snapshot.updated_at <= self.snapshot_fresh_for => {
                debug!(user_id, updated_at = %snapshot.updated_at, "Using fresh integration snapshot");
                return Some(snapshot.into_onboarding());
            }
            Ok(Some(snapshot)) => {
                info!(user_id, updated_at = %snapshot.updated_at, "Integration snapshot is stale, reprocessing");
            }
            Ok(None) => {
                debug!(user_id, "No integration snapshot, processing");
            }
            Err(e) => {
                warn!(user_id, "Failed to load integration snapshot, reprocessing: {}", e);
            }
        }

        let result = self.process_at(user_id, now).await;
        if result.is_fallback {
            None
        } else {
            Some(result)
        }
    }

    async fn try_process(&self, user_id: i64, now: DateTime<Utc>) -> anyhow::Result<IntegratedOnboarding> {
        let data = IntegratedData {
            website_analysis: self.website_analysis_source(user_id, now).await?,
            research_preferences: self.research_preferences_source(user_id, now).await?,
            api_keys_data: self.api_keys_source(user_id, now).await,
            onboarding_session: self.onboarding_session_source(user_id, now).await?,
        };

        let data_quality = self
            .scorer
            .assess_at(&data, now)
            .context("data quality assessment failed")?;

        info!(
            user_id,
            overall_score = data_quality.overall_score,
            quality_level = %data_quality.quality_level,
            "Onboarding data integrated"
        );

        let snapshot = IntegrationSnapshot {
            user_id,
            data,
            data_quality,
            created_at: now,
            updated_at: now,
        };
        if let Err(e) = self.store.upsert_integration_snapshot(&snapshot).await {
            warn!(user_id, "Failed to persist integration snapshot: {}", e);
        }

        Ok(snapshot.into_onboarding())
    }

    fn annotate(&self, source: &mut SourceMap, timestamp: DateTime<Utc>, now: DateTime<Utc>, confidence: f64) {
        let freshness = freshness_score(timestamp, now, self.source_max_age);
        source.insert("data_freshness".to_string(), json!(freshness));
        source.insert("confidence_level".to_string(), json!(confidence));
    }

    async fn website_analysis_source(&self, user_id: i64, now: DateTime<Utc>) -> anyhow::Result<SourceMap> {
        let record = match self.store.load_website_analysis(user_id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                warn!(user_id, "No website analysis found");
                return Ok(SourceMap::new());
            }
            Err(e) => {
                warn!(user_id, "Failed to load website analysis: {}", e);
                return Ok(SourceMap::new());
            }
        };

        let confidence = if record.is_completed() {
            WEBSITE_COMPLETED_CONFIDENCE
        } else {
            WEBSITE_PENDING_CONFIDENCE
        };
        let mut source = to_source_map(&record).context("serialize website analysis")?;
        self.annotate(&mut source, record.updated_at, now, confidence);
        Ok(source)
    }

    async fn research_preferences_source(&self, user_id: i64, now: DateTime<Utc>) -> anyhow::Result<SourceMap> {
        let record = match self.store.load_research_preferences(user_id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                warn!(user_id, "No research preferences found");
                return Ok(SourceMap::new());
            }
            Err(e) => {
                warn!(user_id, "Failed to load research preferences: {}", e);
                return Ok(SourceMap::new());
            }
        };

        let mut source = to_source_map(&record).context("serialize research preferences")?;
        self.annotate(&mut source, record.updated_at, now, RESEARCH_CONFIDENCE);
        Ok(source)
    }

    async fn api_keys_source(&self, user_id: i64, now: DateTime<Utc>) -> SourceMap {
        let keys = match self.store.load_api_keys(user_id).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(user_id, "Failed to load API keys: {}", e);
                return SourceMap::new();
            }
        };
        if keys.is_empty() {
            warn!(user_id, "No API keys found");
            return SourceMap::new();
        }

        let (mut source, latest) = api_key_aggregate(&keys);
        self.annotate(&mut source, latest, now, API_KEYS_CONFIDENCE);
        source
    }

    async fn onboarding_session_source(&self, user_id: i64, now: DateTime<Utc>) -> anyhow::Result<SourceMap> {
        let record = match self.store.load_onboarding_session(user_id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                warn!(user_id, "No onboarding session found");
                return Ok(SourceMap::new());
            }
            Err(e) => {
                warn!(user_id, "Failed to load onboarding session: {}", e);
                return Ok(SourceMap::new());
            }
        };

        let mut source = to_source_map(&record).context("serialize onboarding session")?;
        self.annotate(&mut source, record.updated_at, now, SESSION_CONFIDENCE);
        Ok(source)
    }
}

fn provider_matches(provider: &str, names: &[&str]) -> bool {
    let provider = provider.to_lowercase();
    names.iter().any(|n| provider == *n || provider.contains(n))
}

/// Connection summary over a user's keys, plus the most recent activity time
///
/// Key material is never part of the record, so nothing secret reaches the
/// aggregate.
pub fn api_key_aggregate(keys: &[ApiKeyRecord]) -> (SourceMap, DateTime<Utc>) {
    let active: Vec<&ApiKeyRecord> = keys.iter().filter(|k| k.is_active).collect();

    let mut providers: Vec<String> = Vec::new();
    for key in &active {
        if !providers.contains(&key.provider) {
            providers.push(key.provider.clone());
        }
    }

    let last_used = keys.iter().filter_map(|k| k.last_used).max();
    let latest_created = keys.iter().map(|k| k.created_at).max();

    let connections: Vec<Value> = keys
        .iter()
        .map(|k| {
            json!({
                "provider": k.provider,
                "is_active": k.is_active,
                "last_used": k.last_used.map(|t| t.to_rfc3339()),
            })
        })
        .collect();

    let mut source = SourceMap::new();
    source.insert("providers".to_string(), json!(providers));
    source.insert("total_keys".to_string(), json!(keys.len()));
    source.insert("active_keys".to_string(), json!(active.len()));
    source.insert(
        "analytics_connected".to_string(),
        json!(active.iter().any(|k| provider_matches(&k.provider, &ANALYTICS_PROVIDERS))),
    );
    source.insert(
        "search_console_connected".to_string(),
        json!(active.iter().any(|k| provider_matches(&k.provider, &SEARCH_CONSOLE_PROVIDERS))),
    );
    if let Some(last_used) = last_used {
        source.insert("last_used".to_string(), json!(last_used.to_rfc3339()));
    }
    if let Some(created) = latest_created {
        source.insert("updated_at".to_string(), json!(created.to_rfc3339()));
    }
    source.insert("connections".to_string(), Value::Array(connections));

    let activity = last_used.into_iter().chain(latest_created).max().unwrap_or_else(Utc::now);
    (source, activity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(provider: &str, active: bool, last_used_hours_ago: Option<i64>) -> ApiKeyRecord {
        let now = Utc::now();
        ApiKeyRecord {
            provider: provider.to_string(),
            is_active: active,
            created_at: now - Duration::days(10),
            last_used: last_used_hours_ago.map(|h| now - Duration::hours(h)),
        }
    }

    #[test]
    fn test_api_key_aggregate() {
        let keys = vec![
            key("google_analytics", true, Some(5)),
            key("google_search_console", false, Some(1)),
            key("openai", true, None),
        ];
        let (source, activity) = api_key_aggregate(&keys);

        assert_eq!(source["providers"], json!(["google_analytics", "openai"]));
        assert_eq!(source["total_keys"], json!(3));
        assert_eq!(source["active_keys"], json!(2));
        assert_eq!(source["analytics_connected"], json!(true));
        // Search console key exists but is inactive
        assert_eq!(source["search_console_connected"], json!(false));
        assert!(source.contains_key("last_used"));
        assert!(Utc::now() - activity < Duration::hours(2));
    }

    #[test]
    fn test_aggregate_without_usage_falls_back_to_created() {
        let keys = vec![key("openai", true, None)];
        let (source, activity) = api_key_aggregate(&keys);
        assert!(!source.contains_key("last_used"));
        assert_eq!(activity, keys[0].created_at);
    }
}
