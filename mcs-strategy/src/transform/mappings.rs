//! Static field mapping table
//!
//! Each strategy field names the IntegratedData paths it reads and exactly
//! one transformation. The table is plain data with function pointers, so a
//! broken reference cannot exist at runtime; the engine additionally checks
//! it once at construction.

use super::normalizers;
use crate::error::TransformError;
use crate::models::{has_content, IntegratedData};
use serde_json::{Number, Value};

/// Values resolved from a field's source paths, in configured order
///
/// Paths that did not resolve have no entry. A path that resolves to null
/// or an empty value does have one; it just does not count as present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceData {
    entries: Vec<(String, Value)>,
}

impl SourceData {
    /// Resolve every path against the integrated data
    pub fn extract(paths: &[&str], data: &IntegratedData) -> Self {
        let entries = paths
            .iter()
            .filter_map(|path| data.resolve(path).map(|value| (path.to_string(), value.clone())))
            .collect();
        Self { entries }
    }

    /// Build directly from `(path, value)` pairs
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            entries: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.entries.iter().find(|(p, _)| p == path).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(p, v)| (p.as_str(), v))
    }

    /// First value carrying content, with its path
    pub fn first_present(&self) -> Option<(&str, &Value)> {
        self.iter().find(|(_, v)| has_content(v))
    }

    /// Number of resolved values carrying content
    pub fn present_count(&self) -> usize {
        self.entries.iter().filter(|(_, v)| has_content(v)).count()
    }

    /// Paths whose values carry content
    pub fn present_paths(&self) -> Vec<String> {
        self.iter()
            .filter(|(_, v)| has_content(v))
            .map(|(p, _)| p.to_string())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Target type for the default transformation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Raw value, unchanged
    Any,
    Float,
    Integer,
}

impl ValueKind {
    fn name(&self) -> &'static str {
        match self {
            ValueKind::Any => "any",
            ValueKind::Float => "float",
            ValueKind::Integer => "integer",
        }
    }

    /// Coerce a raw value; numeric strings like `"$1,500"` are accepted
    pub fn coerce(&self, field: &str, value: &Value) -> Result<Value, TransformError> {
        let coercion_error = || TransformError::Coercion {
            field: field.to_string(),
            value: value.to_string(),
            target: self.name(),
        };

        let number = match self {
            ValueKind::Any => return Ok(value.clone()),
            ValueKind::Float | ValueKind::Integer => match value {
                Value::Number(n) => n.as_f64().ok_or_else(coercion_error)?,
                Value::String(s) => {
                    let cleaned: String = s
                        .trim()
                        .chars()
                        .filter(|c| !matches!(c, '$' | ',' | ' '))
                        .collect();
                    cleaned.parse::<f64>().map_err(|_| coercion_error())?
                }
                _ => return Err(coercion_error()),
            },
        };

        if !number.is_finite() {
            return Err(coercion_error());
        }

        match self {
            ValueKind::Integer => Ok(Value::from(number.trunc() as i64)),
            _ => Number::from_f64(number).map(Value::Number).ok_or_else(coercion_error),
        }
    }
}

/// Per-field transformation: `(resolved sources, whole tree) -> value`
pub type TransformFn = fn(&SourceData, &IntegratedData) -> Result<Option<Value>, TransformError>;

/// How a field's value is derived
#[derive(Debug, Clone, Copy)]
pub enum Transformation {
    /// First present source value, coerced to the kind
    Direct(ValueKind),
    /// Named custom function
    Custom { name: &'static str, apply: TransformFn },
}

impl Transformation {
    pub fn name(&self) -> &'static str {
        match self {
            Transformation::Direct(ValueKind::Any) => "direct",
            Transformation::Direct(ValueKind::Float) => "direct_float",
            Transformation::Direct(ValueKind::Integer) => "direct_integer",
            Transformation::Custom { name, .. } => name,
        }
    }

    pub fn apply(
        &self,
        field: &str,
        source: &SourceData,
        data: &IntegratedData,
    ) -> Result<Option<Value>, TransformError> {
        match self {
            Transformation::Direct(kind) => source
                .first_present()
                .map(|(_, value)| kind.coerce(field, value))
                .transpose(),
            Transformation::Custom { apply, .. } => apply(source, data),
        }
    }
}

/// One strategy field's mapping
#[derive(Debug, Clone, Copy)]
pub struct FieldMapping {
    pub field_name: &'static str,
    /// Dotted IntegratedData paths, highest priority first (may be empty)
    pub source_paths: &'static [&'static str],
    pub transformation: Transformation,
}

const fn direct(field_name: &'static str, source_paths: &'static [&'static str]) -> FieldMapping {
    FieldMapping {
        field_name,
        source_paths,
        transformation: Transformation::Direct(ValueKind::Any),
    }
}

const fn custom(
    field_name: &'static str,
    source_paths: &'static [&'static str],
    name: &'static str,
    apply: TransformFn,
) -> FieldMapping {
    FieldMapping {
        field_name,
        source_paths,
        transformation: Transformation::Custom { name, apply },
    }
}

/// Every strategy field the engine produces
pub static FIELD_MAPPINGS: [FieldMapping; 30] = [
    // Business context
    custom(
        "business_objectives",
        &[
            "website_analysis.content_goals",
            "website_analysis.recommended_settings.business_objectives",
        ],
        "join_business_objectives",
        normalizers::business_objectives,
    ),
    custom(
        "target_metrics",
        &[
            "website_analysis.performance_metrics",
            "website_analysis.recommended_settings.target_metrics",
        ],
        "derive_target_metrics",
        normalizers::target_metrics,
    ),
    FieldMapping {
        field_name: "content_budget",
        source_paths: &[
            "onboarding_session.budget",
            "website_analysis.recommended_settings.content_budget",
        ],
        transformation: Transformation::Direct(ValueKind::Float),
    },
    FieldMapping {
        field_name: "team_size",
        source_paths: &["onboarding_session.team_size"],
        transformation: Transformation::Direct(ValueKind::Integer),
    },
    direct("implementation_timeline", &["onboarding_session.timeline"]),
    custom(
        "market_share",
        &[
            "website_analysis.performance_metrics.market_share",
            "onboarding_session.business_size",
        ],
        "estimate_market_share",
        normalizers::market_share,
    ),
    custom(
        "competitive_position",
        &[
            "website_analysis.competitive_analysis",
            "website_analysis.content_characteristics",
        ],
        "classify_competitive_position",
        normalizers::competitive_position,
    ),
    direct("performance_metrics", &["website_analysis.performance_metrics"]),
    // Audience intelligence
    custom(
        "content_preferences",
        &[
            "research_preferences.content_types",
            "website_analysis.writing_style.tone",
            "research_preferences.research_depth",
        ],
        "merge_content_preferences",
        normalizers::content_preferences,
    ),
    direct(
        "consumption_patterns",
        &[
            "website_analysis.target_audience.consumption_patterns",
            "website_analysis.content_characteristics.consumption_patterns",
        ],
    ),
    custom(
        "audience_pain_points",
        &[
            "website_analysis.target_audience.pain_points",
            "research_preferences.target_audience.pain_points",
        ],
        "collect_pain_points",
        normalizers::audience_pain_points,
    ),
    direct("buying_journey", &["website_analysis.target_audience.buying_journey"]),
    direct(
        "seasonal_trends",
        &[
            "website_analysis.performance_metrics.seasonal_trends",
            "website_analysis.target_audience.seasonal_patterns",
        ],
    ),
    custom(
        "engagement_metrics",
        &["website_analysis.performance_metrics"],
        "select_engagement_metrics",
        normalizers::engagement_metrics,
    ),
    // Competitive intelligence
    custom(
        "top_competitors",
        &[
            "website_analysis.competitive_analysis.competitors",
            "website_analysis.competitive_analysis.top_competitors",
        ],
        "collect_competitor_names",
        normalizers::top_competitors,
    ),
    direct(
        "competitor_content_strategies",
        &[
            "website_analysis.competitive_analysis.content_strategies",
            "website_analysis.competitive_analysis.competitor_strategies",
        ],
    ),
    custom(
        "market_gaps",
        &[
            "website_analysis.competitive_analysis.market_gaps",
            "website_analysis.competitive_analysis.opportunities",
            "website_analysis.content_characteristics.content_gaps",
        ],
        "collect_market_gaps",
        normalizers::market_gaps,
    ),
    custom(
        "industry_trends",
        &["website_analysis.industry", "research_preferences.research_topics"],
        "describe_industry_trends",
        normalizers::industry_trends,
    ),
    direct(
        "emerging_trends",
        &[
            "website_analysis.competitive_analysis.emerging_trends",
            "research_preferences.research_topics",
        ],
    ),
    // Content strategy
    custom(
        "preferred_formats",
        &[
            "research_preferences.content_types",
            "website_analysis.content_type.secondary_types",
            "website_analysis.content_type.primary_type",
        ],
        "extract_preferred_formats",
        normalizers::preferred_formats,
    ),
    custom(
        "content_mix",
        &[
            "research_preferences.content_types",
            "website_analysis.content_type.secondary_types",
            "website_analysis.content_type.primary_type",
        ],
        "distribute_content_mix",
        normalizers::content_mix,
    ),
    direct(
        "content_frequency",
        &[
            "research_preferences.content_frequency",
            "website_analysis.recommended_settings.content_frequency",
        ],
    ),
    direct(
        "optimal_timing",
        &[
            "website_analysis.performance_metrics.optimal_timing",
            "website_analysis.recommended_settings.optimal_timing",
        ],
    ),
    custom(
        "quality_metrics",
        &["research_preferences.factual_content", "research_preferences.research_depth"],
        "derive_quality_metrics",
        normalizers::quality_metrics,
    ),
    custom(
        "editorial_guidelines",
        &["website_analysis.writing_style", "website_analysis.recommended_settings.guidelines"],
        "compose_editorial_guidelines",
        normalizers::editorial_guidelines,
    ),
    direct(
        "brand_voice",
        &["website_analysis.writing_style.voice", "website_analysis.writing_style.tone"],
    ),
    // Performance and analytics
    direct("traffic_sources", &["website_analysis.traffic_sources"]),
    direct(
        "conversion_rates",
        &[
            "website_analysis.performance_metrics.conversion_rates",
            "website_analysis.performance_metrics.conversion_rate",
        ],
    ),
    direct("content_roi_targets", &[]),
    custom(
        "ab_testing_capabilities",
        &["api_keys_data.analytics_connected", "onboarding_session.team_size"],
        "assess_ab_testing",
        normalizers::ab_testing_capabilities,
    ),
];

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_float() {
        assert_eq!(ValueKind::Float.coerce("b", &json!(1500)).unwrap(), json!(1500.0));
        assert_eq!(ValueKind::Float.coerce("b", &json!("$1,500.50")).unwrap(), json!(1500.5));
        assert!(matches!(
            ValueKind::Float.coerce("b", &json!("lots")),
            Err(TransformError::Coercion { target: "float", .. })
        ));
        assert!(ValueKind::Float.coerce("b", &json!(true)).is_err());
    }

    #[test]
    fn test_coerce_integer_truncates() {
        assert_eq!(ValueKind::Integer.coerce("t", &json!(4.8)).unwrap(), json!(4));
        assert_eq!(ValueKind::Integer.coerce("t", &json!(" 12 ")).unwrap(), json!(12));
        assert!(ValueKind::Integer.coerce("t", &json!(["3"])).is_err());
    }

    #[test]
    fn test_source_data_presence() {
        let source = SourceData::from_pairs([
            ("a.x", json!(null)),
            ("a.y", json!("")),
            ("a.z", json!(false)),
        ]);
        assert_eq!(source.present_count(), 1);
        assert_eq!(source.first_present(), Some(("a.z", &json!(false))));
        assert_eq!(source.get("a.x"), Some(&json!(null)));
        assert_eq!(source.get("a.w"), None);
    }

    #[test]
    fn test_direct_takes_first_present() {
        let source = SourceData::from_pairs([("p1", json!("")), ("p2", json!("Weekly")), ("p3", json!("Daily"))]);
        let value = Transformation::Direct(ValueKind::Any)
            .apply("content_frequency", &source, &IntegratedData::default())
            .unwrap();
        assert_eq!(value, Some(json!("Weekly")));
    }

    #[test]
    fn test_table_has_thirty_unique_fields() {
        let mut names: Vec<_> = FIELD_MAPPINGS.iter().map(|m| m.field_name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 30);
    }
}
