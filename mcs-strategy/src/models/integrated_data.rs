//! IntegratedData: the four onboarding sources combined into one tree
//!
//! Every source is a JSON object. A missing source is an empty object,
//! never null, so dotted path lookups cannot fail.

use super::quality::DataQualityAssessment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One onboarding source document
pub type SourceMap = Map<String, Value>;

/// Top-level sources of IntegratedData
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    WebsiteAnalysis,
    ResearchPreferences,
    ApiKeysData,
    OnboardingSession,
}

impl SourceKind {
    pub const ALL: [SourceKind; 4] = [
        SourceKind::WebsiteAnalysis,
        SourceKind::ResearchPreferences,
        SourceKind::ApiKeysData,
        SourceKind::OnboardingSession,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::WebsiteAnalysis => "website_analysis",
            SourceKind::ResearchPreferences => "research_preferences",
            SourceKind::ApiKeysData => "api_keys_data",
            SourceKind::OnboardingSession => "onboarding_session",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == name)
    }

    /// Source named by the first segment of a dotted path
    pub fn of_path(path: &str) -> Option<Self> {
        path.split('.').next().and_then(Self::from_name)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Onboarding sources assembled for one user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegratedData {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub website_analysis: SourceMap,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub research_preferences: SourceMap,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub api_keys_data: SourceMap,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub onboarding_session: SourceMap,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<SourceMap, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<SourceMap>::deserialize(deserializer)?.unwrap_or_default())
}

impl IntegratedData {
    pub fn source(&self, kind: SourceKind) -> &SourceMap {
        match kind {
            SourceKind::WebsiteAnalysis => &self.website_analysis,
            SourceKind::ResearchPreferences => &self.research_preferences,
            SourceKind::ApiKeysData => &self.api_keys_data,
            SourceKind::OnboardingSession => &self.onboarding_session,
        }
    }

    pub fn source_mut(&mut self, kind: SourceKind) -> &mut SourceMap {
        match kind {
            SourceKind::WebsiteAnalysis => &mut self.website_analysis,
            SourceKind::ResearchPreferences => &mut self.research_preferences,
            SourceKind::ApiKeysData => &mut self.api_keys_data,
            SourceKind::OnboardingSession => &mut self.onboarding_session,
        }
    }

    /// True when all four sources are empty
    pub fn is_empty(&self) -> bool {
        SourceKind::ALL.iter().all(|k| self.source(*k).is_empty())
    }

    /// Resolve a dotted path such as `website_analysis.target_audience.pain_points`
    ///
    /// Resolves only if the first segment names a source and every
    /// intermediate key exists in an object. A bare source name does not
    /// resolve.
    pub fn resolve(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let kind = SourceKind::from_name(segments.next()?)?;

        let mut current = self.source(kind).get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }
}

/// True for values that carry information: not null, not an empty string
/// (after trimming), not an empty array or object
pub fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

/// IntegratedData plus its quality assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegratedOnboarding {
    pub user_id: i64,
    pub data: IntegratedData,
    pub data_quality: DataQualityAssessment,
    pub processed_at: DateTime<Utc>,
    /// Set when processing failed and this is the empty stand-in
    #[serde(default)]
    pub is_fallback: bool,
}

impl IntegratedOnboarding {
    /// Empty sources with an all-zero assessment
    pub fn fallback(user_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            data: IntegratedData::default(),
            data_quality: DataQualityAssessment::empty(now),
            processed_at: now,
            is_fallback: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> IntegratedData {
        serde_json::from_value(json!({
            "website_analysis": {
                "domain": "example.com",
                "target_audience": {"pain_points": ["time", "budget"], "demographics": "SMB owners"}
            },
            "research_preferences": null
        }))
        .unwrap()
    }

    #[test]
    fn test_null_and_missing_sources_are_empty() {
        let data = sample();
        assert!(data.research_preferences.is_empty());
        assert!(data.api_keys_data.is_empty());
        assert!(!data.is_empty());
        assert!(IntegratedData::default().is_empty());
    }

    #[test]
    fn test_resolve_nested_path() {
        let data = sample();
        assert_eq!(data.resolve("website_analysis.domain"), Some(&json!("example.com")));
        assert_eq!(
            data.resolve("website_analysis.target_audience.pain_points"),
            Some(&json!(["time", "budget"]))
        );
    }

    #[test]
    fn test_resolve_missing_paths() {
        let data = sample();
        assert_eq!(data.resolve("website_analysis.industry"), None);
        assert_eq!(data.resolve("website_analysis.target_audience.missing"), None);
        // Intermediate is a string, not an object
        assert_eq!(data.resolve("website_analysis.domain.tld"), None);
        assert_eq!(data.resolve("research_preferences.content_types"), None);
        assert_eq!(data.resolve("unknown_source.field"), None);
        assert_eq!(data.resolve("website_analysis"), None);
        assert_eq!(data.resolve(""), None);
    }

    #[test]
    fn test_has_content() {
        assert!(!has_content(&json!(null)));
        assert!(!has_content(&json!("  ")));
        assert!(!has_content(&json!([])));
        assert!(!has_content(&json!({})));
        assert!(has_content(&json!(false)));
        assert!(has_content(&json!(0)));
        assert!(has_content(&json!("x")));
    }

    #[test]
    fn test_source_kind_of_path() {
        assert_eq!(SourceKind::of_path("api_keys_data.providers"), Some(SourceKind::ApiKeysData));
        assert_eq!(SourceKind::of_path("nope.x"), None);
    }
}
