//! Field Transformation Engine tests over complete and empty inputs

mod helpers;

use chrono::Utc;
use mcs_strategy::models::IntegratedData;
use mcs_strategy::transform::{
    extract_preferred_formats, FieldTransformationEngine, SourceData, DEFAULT_SOURCE, NO_DATA_CONFIDENCE,
};
use serde_json::{json, Value};

fn engine() -> FieldTransformationEngine {
    FieldTransformationEngine::new().expect("built-in mappings are valid")
}

#[test]
fn test_total_fields_is_always_thirty() {
    let engine = engine();
    let inputs = [
        IntegratedData::default(),
        helpers::full_integrated_data(Utc::now()),
        serde_json::from_value(json!({"onboarding_session": {"budget": "$1,200"}})).unwrap(),
    ];

    for data in &inputs {
        let result = engine.transform(data);
        assert_eq!(result.transformation_metadata.total_fields, 30);
        assert_eq!(result.fields.len(), 30);
        assert_eq!(result.sources.len(), 30);
    }
}

#[test]
fn test_no_empty_or_null_values() {
    let engine = engine();
    for data in [IntegratedData::default(), helpers::full_integrated_data(Utc::now())] {
        for (name, field) in engine.transform(&data).fields {
            assert!(!field.value.is_null(), "{} is null", name);
            assert_ne!(field.value, json!(""), "{} is an empty string", name);
        }
    }
}

#[test]
fn test_confidence_bounds_and_no_data_floor() {
    let engine = engine();

    let empty = engine.transform(&IntegratedData::default());
    for (name, field) in &empty.fields {
        assert_eq!(field.confidence, NO_DATA_CONFIDENCE, "{}", name);
        assert!(field.auto_populated);
    }
    assert_eq!(empty.transformation_metadata.populated_fields, 0);
    assert!(empty.transformation_metadata.data_sources_used.is_empty());

    let full = engine.transform(&helpers::full_integrated_data(Utc::now()));
    for (name, field) in &full.fields {
        assert!((0.0..=1.0).contains(&field.confidence), "{} = {}", name, field.confidence);
    }
    // Default-only field never resolves anything
    assert_eq!(full.fields["content_roi_targets"].confidence, NO_DATA_CONFIDENCE);
    assert_eq!(full.fields["content_roi_targets"].source, DEFAULT_SOURCE);
    assert!(full.sources["content_roi_targets"].used_default);
}

#[test]
fn test_empty_input_is_deterministic() {
    let engine = engine();
    let first = engine.transform(&IntegratedData::default());
    let second = engine.transform(&IntegratedData::default());
    assert_eq!(first.values(), second.values());
    assert_eq!(
        first.transformation_metadata.confidence_scores,
        second.transformation_metadata.confidence_scores
    );
}

#[test]
fn test_preferred_formats_extraction() {
    let source = SourceData::from_pairs(vec![(
        "research_preferences.content_types".to_string(),
        json!(["blog", "Video", "unknown_format"]),
    )]);
    assert_eq!(extract_preferred_formats(&source), vec!["Blog Posts", "Videos"]);
}

#[test]
fn test_full_data_mapping() {
    let result = engine().transform(&helpers::full_integrated_data(Utc::now()));
    let values = result.values();

    assert_eq!(values["business_objectives"], json!("Lead Generation, Thought Leadership"));
    assert_eq!(values["content_budget"], json!(2500.0));
    assert_eq!(values["team_size"], json!(4));
    assert_eq!(values["implementation_timeline"], json!("6 months"));
    assert_eq!(values["market_share"], json!("Growing"));
    assert_eq!(values["competitive_position"], json!("Challenger"));
    assert_eq!(values["brand_voice"], json!("Confident"));
    assert_eq!(values["top_competitors"], json!(["Globex", "Initech"]));
    assert_eq!(
        values["audience_pain_points"],
        json!(["Manual reporting", "Tool sprawl", "Budget approval"])
    );
    assert_eq!(
        values["preferred_formats"],
        json!(["Blog Posts", "Videos", "Case Studies", "Webinars"])
    );
    assert_eq!(
        values["content_mix"],
        json!({"Blog Posts": 25, "Videos": 25, "Case Studies": 25, "Webinars": 25})
    );
    assert_eq!(values["industry_trends"], json!("B2B SaaS: Automation, AI agents"));
    assert_eq!(values["ab_testing_capabilities"], json!(true));
    assert_eq!(
        values["editorial_guidelines"],
        json!("Tone: Conversational; Voice: Confident")
    );

    let metadata = &result.transformation_metadata;
    assert!(metadata.failed_fields.is_empty());
    assert!(metadata.populated_fields > 20);
    assert_eq!(
        metadata.data_sources_used,
        vec![
            "website_analysis".to_string(),
            "research_preferences".to_string(),
            "api_keys_data".to_string(),
            "onboarding_session".to_string(),
        ]
    );

    let budget_source = &result.sources["content_budget"];
    assert_eq!(budget_source.resolved_paths, vec!["onboarding_session.budget".to_string()]);
    assert!(!budget_source.used_default);
}

#[test]
fn test_bad_shape_omits_only_that_field() {
    let data: IntegratedData = serde_json::from_value(json!({
        "website_analysis": {"performance_metrics": 42}
    }))
    .unwrap();

    let result = engine().transform(&data);
    let failed = &result.transformation_metadata.failed_fields;

    assert!(failed.contains(&"target_metrics".to_string()));
    assert!(failed.contains(&"engagement_metrics".to_string()));
    assert!(!result.fields.contains_key("target_metrics"));
    assert_eq!(result.transformation_metadata.total_fields, 30);
    assert_eq!(result.fields.len(), 30 - failed.len());
    assert!(result.fields.values().all(|f| f.value != Value::Null));
}

#[test]
fn test_currency_string_budget_is_coerced() {
    let data: IntegratedData =
        serde_json::from_value(json!({"onboarding_session": {"budget": "$1,200"}})).unwrap();
    let result = engine().transform(&data);
    assert_eq!(result.fields["content_budget"].value, json!(1200.0));
}

#[test]
fn test_competitive_position_needs_explicit_keywords() {
    let engine = engine();

    let boutique: IntegratedData = serde_json::from_value(json!({
        "website_analysis": {"competitive_analysis": {"summary": "A specialized boutique consultancy"}}
    }))
    .unwrap();
    let result = engine.transform(&boutique);
    assert_eq!(result.fields["competitive_position"].value, json!("Emerging"));
    assert!(result.sources["competitive_position"].used_default);

    let thought_leadership: IntegratedData = serde_json::from_value(json!({
        "website_analysis": {"content_characteristics": {"focus": "thought leadership articles"}}
    }))
    .unwrap();
    let result = engine.transform(&thought_leadership);
    assert_eq!(result.fields["competitive_position"].value, json!("Emerging"));

    let niche: IntegratedData = serde_json::from_value(json!({
        "website_analysis": {"competitive_analysis": {"summary": "Serves a niche of dental clinics"}}
    }))
    .unwrap();
    assert_eq!(engine.transform(&niche).fields["competitive_position"].value, json!("Niche"));
}
