//! Content strategy record

use super::quality::DataQualityAssessment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// A content strategy populated from onboarding data
///
/// `fields` holds the transformed field values; confidence and source path
/// per field are kept alongside so callers can surface how much of the
/// strategy came from real data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentStrategy {
    pub id: Uuid,
    pub user_id: i64,
    pub name: String,
    pub fields: BTreeMap<String, Value>,
    pub field_confidence: BTreeMap<String, f64>,
    pub field_sources: BTreeMap<String, String>,
    pub data_quality: DataQualityAssessment,
    /// AI collaborator output; absent when the call failed or timed out
    #[serde(default)]
    pub ai_recommendations: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentStrategy {
    /// Mean field confidence (0.0 for a strategy with no fields)
    pub fn average_confidence(&self) -> f64 {
        if self.field_confidence.is_empty() {
            return 0.0;
        }
        self.field_confidence.values().sum::<f64>() / self.field_confidence.len() as f64
    }
}
