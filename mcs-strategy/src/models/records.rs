//! Persistence DTOs
//!
//! One struct per onboarding table. The persistence adapter builds these
//! from rows; the integration service turns them into [`SourceMap`]s, with
//! unset optional fields omitted so they read as missing.

use super::integrated_data::{IntegratedData, IntegratedOnboarding, SourceMap};
use super::quality::DataQualityAssessment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Website analysis produced during onboarding step 1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebsiteAnalysisRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_audience: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_goals: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writing_style: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_characteristics: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competitive_analysis: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance_metrics: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traffic_sources: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_settings: Option<Value>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WebsiteAnalysisRecord {
    /// Blank record for `user_id`, timestamped `now`
    pub fn new(user_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            user_id,
            website_url: None,
            domain: None,
            industry: None,
            business_type: None,
            target_audience: None,
            content_goals: None,
            writing_style: None,
            content_characteristics: None,
            content_type: None,
            competitive_analysis: None,
            performance_metrics: None,
            traffic_sources: None,
            recommended_settings: None,
            status: "pending".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status.eq_ignore_ascii_case("completed")
    }
}

/// Research preferences chosen during onboarding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchPreferencesRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub research_depth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_types: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_research: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factual_content: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_audience: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub research_topics: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_frequency: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResearchPreferencesRecord {
    pub fn new(user_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            user_id,
            research_depth: None,
            content_types: None,
            auto_research: None,
            factual_content: None,
            target_audience: None,
            research_topics: None,
            content_frequency: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Connection metadata for one provider key (the key itself is never loaded)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKeyRecord {
    pub provider: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_used: Option<DateTime<Utc>>,
}

/// Onboarding wizard progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnboardingSessionRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub user_id: i64,
    pub current_step: i64,
    pub progress: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OnboardingSessionRecord {
    pub fn new(user_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            user_id,
            current_step: 1,
            progress: 0.0,
            business_size: None,
            budget: None,
            team_size: None,
            timeline: None,
            started_at: now,
            updated_at: now,
        }
    }
}

/// Stored integration result, one row per user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationSnapshot {
    pub user_id: i64,
    pub data: IntegratedData,
    pub data_quality: DataQualityAssessment,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IntegrationSnapshot {
    /// Reconstruct the integration result exactly as stored
    pub fn into_onboarding(self) -> IntegratedOnboarding {
        IntegratedOnboarding {
            user_id: self.user_id,
            data: self.data,
            data_quality: self.data_quality,
            processed_at: self.updated_at,
            is_fallback: false,
        }
    }
}

/// Serialize a record into a source document
pub fn to_source_map<T: Serialize>(record: &T) -> serde_json::Result<SourceMap> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        _ => Ok(SourceMap::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unset_fields_are_omitted() {
        let now = Utc::now();
        let mut record = WebsiteAnalysisRecord::new(7, now);
        record.domain = Some("example.com".to_string());
        record.content_goals = Some(json!(["Lead Generation"]));

        let map = to_source_map(&record).unwrap();
        assert_eq!(map.get("domain"), Some(&json!("example.com")));
        assert_eq!(map.get("content_goals"), Some(&json!(["Lead Generation"])));
        assert!(!map.contains_key("industry"));
        assert!(!map.contains_key("id"));
        assert_eq!(map.get("status"), Some(&json!("pending")));
        assert!(map.get("updated_at").and_then(Value::as_str).is_some());
    }

    #[test]
    fn test_completed_status() {
        let mut record = WebsiteAnalysisRecord::new(1, Utc::now());
        assert!(!record.is_completed());
        record.status = "Completed".to_string();
        assert!(record.is_completed());
    }
}
