//! Onboarding record database operations
//!
//! Loaders return the user's most recent row (by `updated_at`). JSON-valued
//! columns are TEXT holding serialized JSON; timestamps are RFC 3339 TEXT.

use super::OnboardingStore;
use crate::models::{
    ApiKeyRecord, IntegratedData, IntegrationSnapshot, OnboardingSessionRecord, ResearchPreferencesRecord,
    WebsiteAnalysisRecord,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mcs_common::time::parse_timestamp;
use mcs_common::{Error, Result};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

// ============================================================================
// Column helpers
// ============================================================================

fn json_text(value: Option<&Value>) -> Result<Option<String>> {
    value.map(serde_json::to_string).transpose().map_err(Error::from)
}

fn json_column(row: &SqliteRow, column: &str) -> Result<Option<Value>> {
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|s| serde_json::from_str(&s))
        .transpose()
        .map_err(|e| Error::Internal(format!("Failed to deserialize {}: {}", column, e)))
}

fn timestamp_column(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>> {
    let raw: String = row.try_get(column)?;
    parse_timestamp(&raw).ok_or_else(|| Error::Internal(format!("Failed to parse {}: {}", column, raw)))
}

fn optional_timestamp_column(row: &SqliteRow, column: &str) -> Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|s| parse_timestamp(&s).ok_or_else(|| Error::Internal(format!("Failed to parse {}: {}", column, s))))
        .transpose()
}

// ============================================================================
// Website analyses
// ============================================================================

/// Insert a website analysis, returning its row id
pub async fn save_website_analysis(pool: &SqlitePool, record: &WebsiteAnalysisRecord) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO website_analyses (
            user_id, website_url, domain, industry, business_type,
            target_audience, content_goals, writing_style, content_characteristics,
            content_type, competitive_analysis, performance_metrics, traffic_sources,
            recommended_settings, status, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.user_id)
    .bind(&record.website_url)
    .bind(&record.domain)
    .bind(&record.industry)
    .bind(&record.business_type)
    .bind(json_text(record.target_audience.as_ref())?)
    .bind(json_text(record.content_goals.as_ref())?)
    .bind(json_text(record.writing_style.as_ref())?)
    .bind(json_text(record.content_characteristics.as_ref())?)
    .bind(json_text(record.content_type.as_ref())?)
    .bind(json_text(record.competitive_analysis.as_ref())?)
    .bind(json_text(record.performance_metrics.as_ref())?)
    .bind(json_text(record.traffic_sources.as_ref())?)
    .bind(json_text(record.recommended_settings.as_ref())?)
    .bind(&record.status)
    .bind(record.created_at.to_rfc3339())
    .bind(record.updated_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Most recent website analysis for a user
pub async fn load_website_analysis(pool: &SqlitePool, user_id: i64) -> Result<Option<WebsiteAnalysisRecord>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, website_url, domain, industry, business_type,
               target_audience, content_goals, writing_style, content_characteristics,
               content_type, competitive_analysis, performance_metrics, traffic_sources,
               recommended_settings, status, created_at, updated_at
        FROM website_analyses
        WHERE user_id = ?
        ORDER BY updated_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    Ok(Some(WebsiteAnalysisRecord {
        id: Some(row.try_get("id")?),
        user_id: row.try_get("user_id")?,
        website_url: row.try_get("website_url")?,
        domain: row.try_get("domain")?,
        industry: row.try_get("industry")?,
        business_type: row.try_get("business_type")?,
        target_audience: json_column(&row, "target_audience")?,
        content_goals: json_column(&row, "content_goals")?,
        writing_style: json_column(&row, "writing_style")?,
        content_characteristics: json_column(&row, "content_characteristics")?,
        content_type: json_column(&row, "content_type")?,
        competitive_analysis: json_column(&row, "competitive_analysis")?,
        performance_metrics: json_column(&row, "performance_metrics")?,
        traffic_sources: json_column(&row, "traffic_sources")?,
        recommended_settings: json_column(&row, "recommended_settings")?,
        status: row.try_get("status")?,
        created_at: timestamp_column(&row, "created_at")?,
        updated_at: timestamp_column(&row, "updated_at")?,
    }))
}

// ============================================================================
// Research preferences
// ============================================================================

pub async fn save_research_preferences(pool: &SqlitePool, record: &ResearchPreferencesRecord) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO research_preferences (
            user_id, research_depth, content_types, auto_research, factual_content,
            target_audience, research_topics, content_frequency, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.user_id)
    .bind(&record.research_depth)
    .bind(json_text(record.content_types.as_ref())?)
    .bind(record.auto_research)
    .bind(record.factual_content)
    .bind(json_text(record.target_audience.as_ref())?)
    .bind(json_text(record.research_topics.as_ref())?)
    .bind(&record.content_frequency)
    .bind(record.created_at.to_rfc3339())
    .bind(record.updated_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn load_research_preferences(pool: &SqlitePool, user_id: i64) -> Result<Option<ResearchPreferencesRecord>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, research_depth, content_types, auto_research, factual_content,
               target_audience, research_topics, content_frequency, created_at, updated_at
        FROM research_preferences
        WHERE user_id = ?
        ORDER BY updated_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    Ok(Some(ResearchPreferencesRecord {
        id: Some(row.try_get("id")?),
        user_id: row.try_get("user_id")?,
        research_depth: row.try_get("research_depth")?,
        content_types: json_column(&row, "content_types")?,
        auto_research: row.try_get("auto_research")?,
        factual_content: row.try_get("factual_content")?,
        target_audience: json_column(&row, "target_audience")?,
        research_topics: json_column(&row, "research_topics")?,
        content_frequency: row.try_get("content_frequency")?,
        created_at: timestamp_column(&row, "created_at")?,
        updated_at: timestamp_column(&row, "updated_at")?,
    }))
}

// ============================================================================
// API keys (connection metadata only)
// ============================================================================

pub async fn save_api_key(pool: &SqlitePool, user_id: i64, record: &ApiKeyRecord) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO api_keys (user_id, provider, is_active, created_at, last_used) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(&record.provider)
    .bind(record.is_active)
    .bind(record.created_at.to_rfc3339())
    .bind(record.last_used.map(|t| t.to_rfc3339()))
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn load_api_keys(pool: &SqlitePool, user_id: i64) -> Result<Vec<ApiKeyRecord>> {
    let rows = sqlx::query(
        "SELECT provider, is_active, created_at, last_used FROM api_keys WHERE user_id = ? ORDER BY id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<ApiKeyRecord> {
            Ok(ApiKeyRecord {
                provider: row.try_get("provider")?,
                is_active: row.try_get("is_active")?,
                created_at: timestamp_column(row, "created_at")?,
                last_used: optional_timestamp_column(row, "last_used")?,
            })
        })
        .collect()
}

// ============================================================================
// Onboarding sessions
// ============================================================================

pub async fn save_onboarding_session(pool: &SqlitePool, record: &OnboardingSessionRecord) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO onboarding_sessions (
            user_id, current_step, progress, business_size, budget, team_size,
            timeline, started_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.user_id)
    .bind(record.current_step)
    .bind(record.progress)
    .bind(&record.business_size)
    .bind(record.budget)
    .bind(record.team_size)
    .bind(&record.timeline)
    .bind(record.started_at.to_rfc3339())
    .bind(record.updated_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn load_onboarding_session(pool: &SqlitePool, user_id: i64) -> Result<Option<OnboardingSessionRecord>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, current_step, progress, business_size, budget, team_size,
               timeline, started_at, updated_at
        FROM onboarding_sessions
        WHERE user_id = ?
        ORDER BY updated_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    Ok(Some(OnboardingSessionRecord {
        id: Some(row.try_get("id")?),
        user_id: row.try_get("user_id")?,
        current_step: row.try_get("current_step")?,
        progress: row.try_get("progress")?,
        business_size: row.try_get("business_size")?,
        budget: row.try_get("budget")?,
        team_size: row.try_get("team_size")?,
        timeline: row.try_get("timeline")?,
        started_at: timestamp_column(&row, "started_at")?,
        updated_at: timestamp_column(&row, "updated_at")?,
    }))
}

// ============================================================================
// Integration snapshots
// ============================================================================

pub async fn load_integration_snapshot(pool: &SqlitePool, user_id: i64) -> Result<Option<IntegrationSnapshot>> {
    let row = sqlx::query(
        r#"
        SELECT user_id, website_analysis_data, research_preferences_data, api_keys_data,
               onboarding_session_data, data_quality, created_at, updated_at
        FROM onboarding_integrations
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let source = |column: &str| -> Result<crate::models::SourceMap> {
        match json_column(&row, column)? {
            Some(Value::Object(map)) => Ok(map),
            _ => Ok(Default::default()),
        }
    };

    let data = IntegratedData {
        website_analysis: source("website_analysis_data")?,
        research_preferences: source("research_preferences_data")?,
        api_keys_data: source("api_keys_data")?,
        onboarding_session: source("onboarding_session_data")?,
    };

    let quality: String = row.try_get("data_quality")?;
    let data_quality = serde_json::from_str(&quality)
        .map_err(|e| Error::Internal(format!("Failed to deserialize data_quality: {}", e)))?;

    Ok(Some(IntegrationSnapshot {
        user_id: row.try_get("user_id")?,
        data,
        data_quality,
        created_at: timestamp_column(&row, "created_at")?,
        updated_at: timestamp_column(&row, "updated_at")?,
    }))
}

/// Insert or replace a user's snapshot; `created_at` of an existing row is kept
pub async fn upsert_integration_snapshot(pool: &SqlitePool, snapshot: &IntegrationSnapshot) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO onboarding_integrations (
            user_id, website_analysis_data, research_preferences_data, api_keys_data,
            onboarding_session_data, data_quality, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            website_analysis_data = excluded.website_analysis_data,
            research_preferences_data = excluded.research_preferences_data,
            api_keys_data = excluded.api_keys_data,
            onboarding_session_data = excluded.onboarding_session_data,
            data_quality = excluded.data_quality,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(snapshot.user_id)
    .bind(serde_json::to_string(&snapshot.data.website_analysis)?)
    .bind(serde_json::to_string(&snapshot.data.research_preferences)?)
    .bind(serde_json::to_string(&snapshot.data.api_keys_data)?)
    .bind(serde_json::to_string(&snapshot.data.onboarding_session)?)
    .bind(serde_json::to_string(&snapshot.data_quality)?)
    .bind(snapshot.created_at.to_rfc3339())
    .bind(snapshot.updated_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

// ============================================================================
// OnboardingStore adapter
// ============================================================================

/// [`OnboardingStore`] backed by the SQLite database
#[derive(Debug, Clone)]
pub struct SqliteOnboardingStore {
    pool: SqlitePool,
}

impl SqliteOnboardingStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl OnboardingStore for SqliteOnboardingStore {
    async fn load_website_analysis(&self, user_id: i64) -> Result<Option<WebsiteAnalysisRecord>> {
        load_website_analysis(&self.pool, user_id).await
    }

    async fn load_research_preferences(&self, user_id: i64) -> Result<Option<ResearchPreferencesRecord>> {
        load_research_preferences(&self.pool, user_id).await
    }

    async fn load_api_keys(&self, user_id: i64) -> Result<Vec<ApiKeyRecord>> {
        load_api_keys(&self.pool, user_id).await
    }

    async fn load_onboarding_session(&self, user_id: i64) -> Result<Option<OnboardingSessionRecord>> {
        load_onboarding_session(&self.pool, user_id).await
    }

    async fn load_integration_snapshot(&self, user_id: i64) -> Result<Option<IntegrationSnapshot>> {
        load_integration_snapshot(&self.pool, user_id).await
    }

    async fn upsert_integration_snapshot(&self, snapshot: &IntegrationSnapshot) -> Result<()> {
        upsert_integration_snapshot(&self.pool, snapshot).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DataQualityAssessment;
    use chrono::Duration;
    use mcs_common::db::init_memory_database;
    use serde_json::json;

    #[tokio::test]
    async fn test_website_analysis_round_trip_latest_wins() {
        let pool = init_memory_database().await.unwrap();
        let now = Utc::now();

        let mut older = WebsiteAnalysisRecord::new(5, now - Duration::days(3));
        older.domain = Some("old.example.com".to_string());
        save_website_analysis(&pool, &older).await.unwrap();

        let mut newer = WebsiteAnalysisRecord::new(5, now);
        newer.domain = Some("example.com".to_string());
        newer.target_audience = Some(json!({"pain_points": ["time"]}));
        newer.status = "completed".to_string();
        save_website_analysis(&pool, &newer).await.unwrap();

        let loaded = load_website_analysis(&pool, 5).await.unwrap().unwrap();
        assert_eq!(loaded.domain.as_deref(), Some("example.com"));
        assert_eq!(loaded.target_audience, Some(json!({"pain_points": ["time"]})));
        assert!(loaded.is_completed());
        assert_eq!(loaded.industry, None);

        assert!(load_website_analysis(&pool, 6).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_api_keys_and_session() {
        let pool = init_memory_database().await.unwrap();
        let now = Utc::now();

        save_api_key(
            &pool,
            9,
            &ApiKeyRecord {
                provider: "google_analytics".to_string(),
                is_active: true,
                created_at: now,
                last_used: Some(now),
            },
        )
        .await
        .unwrap();
        save_api_key(
            &pool,
            9,
            &ApiKeyRecord {
                provider: "openai".to_string(),
                is_active: false,
                created_at: now,
                last_used: None,
            },
        )
        .await
        .unwrap();

        let keys = load_api_keys(&pool, 9).await.unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys[0].is_active);
        assert_eq!(keys[1].last_used, None);
        assert!(load_api_keys(&pool, 10).await.unwrap().is_empty());

        let mut session = OnboardingSessionRecord::new(9, now);
        session.budget = Some(2500.0);
        session.team_size = Some(3);
        save_onboarding_session(&pool, &session).await.unwrap();

        let loaded = load_onboarding_session(&pool, 9).await.unwrap().unwrap();
        assert_eq!(loaded.budget, Some(2500.0));
        assert_eq!(loaded.team_size, Some(3));
        assert_eq!(loaded.current_step, 1);
    }

    #[tokio::test]
    async fn test_snapshot_upsert_keeps_created_at() {
        let pool = init_memory_database().await.unwrap();
        let created = Utc::now() - Duration::hours(30);

        let mut snapshot = IntegrationSnapshot {
            user_id: 1,
            data: IntegratedData::default(),
            data_quality: DataQualityAssessment::empty(created),
            created_at: created,
            updated_at: created,
        };
        upsert_integration_snapshot(&pool, &snapshot).await.unwrap();

        let later = Utc::now();
        snapshot.created_at = later;
        snapshot.updated_at = later;
        snapshot.data.website_analysis.insert("domain".to_string(), json!("example.com"));
        upsert_integration_snapshot(&pool, &snapshot).await.unwrap();

        let loaded = load_integration_snapshot(&pool, 1).await.unwrap().unwrap();
        assert_eq!(loaded.created_at.timestamp(), created.timestamp());
        assert_eq!(loaded.updated_at.timestamp(), later.timestamp());
        assert_eq!(loaded.data.resolve("website_analysis.domain"), Some(&json!("example.com")));
    }
}
