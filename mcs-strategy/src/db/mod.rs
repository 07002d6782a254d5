//! Persistence layer
//!
//! Free functions over a `SqlitePool` per table, plus the [`OnboardingStore`]
//! trait the integration service reads through.

pub mod onboarding;
pub mod strategies;

pub use onboarding::SqliteOnboardingStore;

use crate::models::{
    ApiKeyRecord, IntegrationSnapshot, OnboardingSessionRecord, ResearchPreferencesRecord, WebsiteAnalysisRecord,
};
use async_trait::async_trait;
use mcs_common::Result;

/// Record store consumed by the onboarding integration service
///
/// "Not found" is `Ok(None)` / an empty list, never an error.
#[async_trait]
pub trait OnboardingStore: Send + Sync {
    async fn load_website_analysis(&self, user_id: i64) -> Result<Option<WebsiteAnalysisRecord>>;

    async fn load_research_preferences(&self, user_id: i64) -> Result<Option<ResearchPreferencesRecord>>;

    async fn load_api_keys(&self, user_id: i64) -> Result<Vec<ApiKeyRecord>>;

    async fn load_onboarding_session(&self, user_id: i64) -> Result<Option<OnboardingSessionRecord>>;

    async fn load_integration_snapshot(&self, user_id: i64) -> Result<Option<IntegrationSnapshot>>;

    /// Insert or replace the user's snapshot
    async fn upsert_integration_snapshot(&self, snapshot: &IntegrationSnapshot) -> Result<()>;
}
