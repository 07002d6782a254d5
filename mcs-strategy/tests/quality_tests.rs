//! Data-Quality Scorer tests

mod helpers;

use chrono::{Duration, Utc};
use mcs_strategy::error::QualityError;
use mcs_strategy::models::{IntegratedData, QualityLevel, SourceMap};
use mcs_strategy::validators::DataQualityScorer;
use serde_json::json;

fn mean_of_axes(axes: [f64; 5]) -> f64 {
    axes.iter().sum::<f64>() / 5.0
}

#[test]
fn test_quality_level_boundaries() {
    assert_eq!(QualityLevel::from_score(0.9), QualityLevel::Excellent);
    assert_eq!(QualityLevel::from_score(0.89999), QualityLevel::Good);
    assert_eq!(QualityLevel::from_score(0.7), QualityLevel::Good);
    assert_eq!(QualityLevel::from_score(0.69999), QualityLevel::Fair);
    assert_eq!(QualityLevel::from_score(0.5), QualityLevel::Fair);
    assert_eq!(QualityLevel::from_score(0.49999), QualityLevel::Poor);
    assert_eq!(QualityLevel::from_score(0.0), QualityLevel::Poor);
}

#[test]
fn test_complete_fresh_data_is_excellent() {
    let now = Utc::now();
    let assessment = DataQualityScorer::default()
        .assess_at(&helpers::full_integrated_data(now), now)
        .unwrap();

    assert!(assessment.overall_score > 0.99, "{}", assessment.overall_score);
    assert_eq!(assessment.quality_level, QualityLevel::Excellent);
    assert!((assessment.overall_score - mean_of_axes(assessment.axes())).abs() < 1e-12);
    assert!(assessment.recommendations.is_empty());
    assert!(assessment.issues.is_empty());
}

#[test]
fn test_no_data_scores_zero() {
    let now = Utc::now();
    let assessment = DataQualityScorer::default()
        .assess_at(&IntegratedData::default(), now)
        .unwrap();

    assert_eq!(assessment.overall_score, 0.0);
    assert_eq!(assessment.axes(), [0.0; 5]);
    assert_eq!(assessment.quality_level, QualityLevel::Poor);
    assert_eq!(assessment.recommendations.len(), 5);
    assert_eq!(assessment.issues.len(), 5);
}

#[test]
fn test_partial_data_overall_is_mean_of_axes() {
    let now = Utc::now();
    let data: IntegratedData = serde_json::from_value(json!({
        "website_analysis": {
            "domain": "acme.example",
            "industry": "Retail",
            "updated_at": (now - Duration::days(10)).to_rfc3339()
        },
        "onboarding_session": {
            "current_step": 2,
            "progress": 30.0,
            "budget": 500
        }
    }))
    .unwrap();

    let assessment = DataQualityScorer::default().assess_at(&data, now).unwrap();

    assert!((assessment.overall_score - mean_of_axes(assessment.axes())).abs() < 1e-12);
    assert_eq!(assessment.quality_level, QualityLevel::from_score(assessment.overall_score));
    for axis in assessment.axes() {
        assert!((0.0..=1.0).contains(&axis));
    }
    // Website: 2 of 5 required; session: 2 of 4 required; other sources empty
    let expected_completeness = (2.0 / 5.0 + 2.0 / 4.0) / 4.0;
    assert!((assessment.completeness - expected_completeness).abs() < 1e-12);
}

#[test]
fn test_missing_timestamp_is_neutral_and_old_data_decays() {
    let now = Utc::now();
    let scorer = DataQualityScorer::new(30);

    let mut session = SourceMap::new();
    session.insert("current_step".to_string(), json!(1));
    let no_timestamp = scorer
        .assess(&SourceMap::new(), &SourceMap::new(), &SourceMap::new(), &session)
        .unwrap();
    // One non-empty source at 0.5 averaged over four
    assert!((no_timestamp.freshness - 0.125).abs() < 1e-12);

    session.insert("updated_at".to_string(), json!((now - Duration::days(60)).to_rfc3339()));
    let data = IntegratedData {
        onboarding_session: session,
        ..Default::default()
    };
    let stale = scorer.assess_at(&data, now).unwrap();
    assert!((stale.freshness - 0.125).abs() < 1e-12);
}

#[test]
fn test_unreadable_timestamp_fails_assessment() {
    let data: IntegratedData = serde_json::from_value(json!({
        "research_preferences": {
            "research_depth": "Basic",
            "updated_at": "last tuesday"
        }
    }))
    .unwrap();

    let err = DataQualityScorer::default().assess_at(&data, Utc::now()).unwrap_err();
    match err {
        QualityError::InvalidTimestamp { source_name, field, .. } => {
            assert_eq!(source_name, "research_preferences");
            assert_eq!(field, "updated_at");
        }
    }
}
