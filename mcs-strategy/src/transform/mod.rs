//! Field Transformation Engine
//!
//! Maps IntegratedData onto the fixed set of strategy fields. For each field:
//!
//! 1. Resolve the configured source paths ([`SourceData::extract`])
//! 2. Apply the field's transformation
//! 3. Substitute the static default when the result is empty
//! 4. Score confidence from how many source paths carried data
//!
//! A field whose transformation fails is logged and left out of the output;
//! `transform` itself never fails.

pub mod defaults;
pub mod mappings;
pub mod normalizers;

pub use mappings::{FieldMapping, SourceData, Transformation, ValueKind, FIELD_MAPPINGS};
pub use normalizers::{extract_preferred_formats, CANONICAL_FORMATS};

use crate::error::TransformError;
use crate::models::{has_content, IntegratedData, SourceKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, info, warn};

/// Confidence used when a field has no source data at all
pub const NO_DATA_CONFIDENCE: f64 = 0.3;

/// Source label for fields without configured paths
pub const DEFAULT_SOURCE: &str = "default";

/// One transformed strategy field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformedField {
    /// Never null and never an empty string
    pub value: Value,
    /// First configured source path, or `"default"`
    pub source: String,
    /// 0.0..=1.0
    pub confidence: f64,
    pub auto_populated: bool,
}

/// Where a field's value came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub source_paths: Vec<String>,
    /// Configured paths that resolved to a value with content
    pub resolved_paths: Vec<String>,
    pub transformation: String,
    /// Static default substituted for an empty result
    pub used_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationMetadata {
    pub total_fields: usize,
    pub populated_fields: usize,
    /// Top-level sources that contributed at least one value
    pub data_sources_used: Vec<String>,
    pub confidence_scores: BTreeMap<String, f64>,
    /// Fields omitted because their transformation failed
    #[serde(default)]
    pub failed_fields: Vec<String>,
    pub transformed_at: DateTime<Utc>,
}

/// Output of one transformation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformResult {
    pub fields: BTreeMap<String, TransformedField>,
    pub sources: BTreeMap<String, SourceInfo>,
    pub transformation_metadata: TransformationMetadata,
}

impl TransformResult {
    /// Plain field values
    pub fn values(&self) -> BTreeMap<String, Value> {
        self.fields
            .iter()
            .map(|(name, field)| (name.clone(), field.value.clone()))
            .collect()
    }
}

/// `min(1, (data_quality + source_availability) / 2)`, both `present / total`
///
/// Fixed at [`NO_DATA_CONFIDENCE`] when nothing is present or no paths are
/// configured.
pub fn field_confidence(present: usize, total: usize) -> f64 {
    if present == 0 || total == 0 {
        return NO_DATA_CONFIDENCE;
    }
    let data_quality = present as f64 / total as f64;
    let source_availability = present as f64 / total as f64;
    ((data_quality + source_availability) / 2.0).min(1.0)
}

struct ConfiguredField {
    mapping: FieldMapping,
    default: Value,
}

struct FieldOutcome {
    field: TransformedField,
    info: SourceInfo,
    populated: bool,
}

/// Field Transformation Engine
pub struct FieldTransformationEngine {
    fields: Vec<ConfiguredField>,
}

impl FieldTransformationEngine {
    /// Engine over the built-in mapping table
    pub fn new() -> Result<Self, TransformError> {
        Self::with_mappings(FIELD_MAPPINGS.to_vec())
    }

    /// Engine over a custom table
    ///
    /// Fails when a field name repeats, a field has no usable default, or a
    /// source path does not start with a known source.
    pub fn with_mappings(mappings: Vec<FieldMapping>) -> Result<Self, TransformError> {
        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(mappings.len());

        for mapping in mappings {
            if !seen.insert(mapping.field_name) {
                return Err(TransformError::Configuration(format!(
                    "duplicate field mapping: {}",
                    mapping.field_name
                )));
            }

            if let Some(path) = mapping
                .source_paths
                .iter()
                .find(|p| SourceKind::of_path(p).is_none())
            {
                return Err(TransformError::Configuration(format!(
                    "field {} reads unknown source path {}",
                    mapping.field_name, path
                )));
            }

            let default = defaults::default_value(mapping.field_name)
                .filter(has_content)
                .ok_or_else(|| {
                    TransformError::Configuration(format!("field {} has no default value", mapping.field_name))
                })?;

            fields.push(ConfiguredField { mapping, default });
        }

        Ok(Self { fields })
    }

    /// Number of configured fields
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.mapping.field_name)
    }

    /// Transform integrated onboarding data into strategy fields
    pub fn transform(&self, data: &IntegratedData) -> TransformResult {
        let mut fields = BTreeMap::new();
        let mut sources = BTreeMap::new();
        let mut confidence_scores = BTreeMap::new();
        let mut sources_used: BTreeSet<SourceKind> = BTreeSet::new();
        let mut failed_fields = Vec::new();
        let mut populated_fields = 0;

        for configured in &self.fields {
            let name = configured.mapping.field_name;
            match Self::transform_field(configured, data) {
                Ok(outcome) => {
                    if outcome.populated {
                        populated_fields += 1;
                    }
                    sources_used.extend(
                        outcome
                            .info
                            .resolved_paths
                            .iter()
                            .filter_map(|p| SourceKind::of_path(p)),
                    );
                    confidence_scores.insert(name.to_string(), outcome.field.confidence);
                    sources.insert(name.to_string(), outcome.info);
                    fields.insert(name.to_string(), outcome.field);
                }
                Err(e) => {
                    warn!(field = name, "Field transformation failed, omitting field: {}", e);
                    failed_fields.push(name.to_string());
                }
            }
        }

        let metadata = TransformationMetadata {
            total_fields: self.fields.len(),
            populated_fields,
            data_sources_used: sources_used.iter().map(|k| k.as_str().to_string()).collect(),
            confidence_scores,
            failed_fields,
            transformed_at: Utc::now(),
        };

        info!(
            total = metadata.total_fields,
            populated = metadata.populated_fields,
            failed = metadata.failed_fields.len(),
            "Field transformation complete"
        );

        TransformResult {
            fields,
            sources,
            transformation_metadata: metadata,
        }
    }

    fn transform_field(configured: &ConfiguredField, data: &IntegratedData) -> Result<FieldOutcome, TransformError> {
        let mapping = &configured.mapping;
        let source = SourceData::extract(mapping.source_paths, data);

        let produced = mapping
            .transformation
            .apply(mapping.field_name, &source, data)?
            .filter(has_content);
        let populated = produced.is_some();
        let value = produced.unwrap_or_else(|| configured.default.clone());

        let confidence = field_confidence(source.present_count(), mapping.source_paths.len());

        debug!(
            field = mapping.field_name,
            populated,
            confidence,
            "Field transformed"
        );

        Ok(FieldOutcome {
            field: TransformedField {
                value,
                source: mapping
                    .source_paths
                    .first()
                    .copied()
                    .unwrap_or(DEFAULT_SOURCE)
                    .to_string(),
                confidence,
                auto_populated: true,
            },
            info: SourceInfo {
                source_paths: mapping.source_paths.iter().map(|p| p.to_string()).collect(),
                resolved_paths: source.present_paths(),
                transformation: mapping.transformation.name().to_string(),
                used_default: !populated,
            },
            populated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn failing(_: &SourceData, _: &IntegratedData) -> Result<Option<Value>, TransformError> {
        Err(TransformError::InvalidShape {
            field: "brand_voice".to_string(),
            path: "website_analysis.writing_style".to_string(),
            detail: "always fails".to_string(),
        })
    }

    #[test]
    fn test_confidence_formula() {
        assert_eq!(field_confidence(0, 3), NO_DATA_CONFIDENCE);
        assert_eq!(field_confidence(0, 0), NO_DATA_CONFIDENCE);
        assert!((field_confidence(1, 2) - 0.5).abs() < 1e-12);
        assert_eq!(field_confidence(2, 2), 1.0);
    }

    #[test]
    fn test_builtin_table_builds() {
        let engine = FieldTransformationEngine::new().unwrap();
        assert_eq!(engine.field_count(), 30);
    }

    #[test]
    fn test_duplicate_mapping_rejected() {
        let mapping = FIELD_MAPPINGS[0];
        let result = FieldTransformationEngine::with_mappings(vec![mapping, mapping]);
        assert!(matches!(result, Err(TransformError::Configuration(_))));
    }

    #[test]
    fn test_missing_default_rejected() {
        let mapping = FieldMapping {
            field_name: "favorite_color",
            source_paths: &["website_analysis.domain"],
            transformation: Transformation::Direct(ValueKind::Any),
        };
        assert!(matches!(
            FieldTransformationEngine::with_mappings(vec![mapping]),
            Err(TransformError::Configuration(_))
        ));
    }

    #[test]
    fn test_unknown_source_rejected() {
        let mapping = FieldMapping {
            field_name: "brand_voice",
            source_paths: &["crm.voice"],
            transformation: Transformation::Direct(ValueKind::Any),
        };
        assert!(FieldTransformationEngine::with_mappings(vec![mapping]).is_err());
    }

    #[test]
    fn test_failing_field_is_omitted() {
        let engine = FieldTransformationEngine::with_mappings(vec![
            FieldMapping {
                field_name: "brand_voice",
                source_paths: &["website_analysis.writing_style"],
                transformation: Transformation::Custom {
                    name: "always_fails",
                    apply: failing,
                },
            },
            FieldMapping {
                field_name: "content_frequency",
                source_paths: &["research_preferences.content_frequency"],
                transformation: Transformation::Direct(ValueKind::Any),
            },
        ])
        .unwrap();

        let result = engine.transform(&IntegratedData::default());
        assert_eq!(result.transformation_metadata.total_fields, 2);
        assert_eq!(result.transformation_metadata.failed_fields, vec!["brand_voice".to_string()]);
        assert!(!result.fields.contains_key("brand_voice"));
        assert_eq!(result.fields["content_frequency"].value, json!("Weekly"));
    }

    #[test]
    fn test_coercion_failure_omits_numeric_field() {
        let engine = FieldTransformationEngine::new().unwrap();
        let data: IntegratedData = serde_json::from_value(json!({
            "onboarding_session": {"budget": "a lot", "team_size": "3"}
        }))
        .unwrap();

        let result = engine.transform(&data);
        assert_eq!(result.transformation_metadata.total_fields, 30);
        assert!(!result.fields.contains_key("content_budget"));
        assert_eq!(result.fields["team_size"].value, json!(3));
    }

    #[test]
    fn test_empty_string_falls_back_to_default() {
        let engine = FieldTransformationEngine::new().unwrap();
        let data: IntegratedData = serde_json::from_value(json!({
            "onboarding_session": {"timeline": "   "}
        }))
        .unwrap();

        let result = engine.transform(&data);
        let field = &result.fields["implementation_timeline"];
        assert_eq!(field.value, json!("3 months"));
        assert_eq!(field.confidence, NO_DATA_CONFIDENCE);
        assert!(result.sources["implementation_timeline"].used_default);
    }
}
