//! Shared fixtures for mcs-strategy integration tests

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use mcs_strategy::db::onboarding::{
    save_api_key, save_onboarding_session, save_research_preferences, save_website_analysis,
};
use mcs_strategy::models::{
    ApiKeyRecord, IntegratedData, OnboardingSessionRecord, ResearchPreferencesRecord, WebsiteAnalysisRecord,
};
use serde_json::json;
use sqlx::SqlitePool;

pub fn website_analysis(user_id: i64, now: DateTime<Utc>) -> WebsiteAnalysisRecord {
    let mut record = WebsiteAnalysisRecord::new(user_id, now);
    record.website_url = Some("https://acme.example".to_string());
    record.domain = Some("acme.example".to_string());
    record.industry = Some("B2B SaaS".to_string());
    record.business_type = Some("software".to_string());
    record.target_audience = Some(json!({
        "demographics": "Operations managers at mid-size firms",
        "pain_points": ["Manual reporting", "Tool sprawl"],
        "buying_journey": {"awareness": "Search", "decision": "Free trial"}
    }));
    record.content_goals = Some(json!(["Lead Generation", "Thought Leadership"]));
    record.writing_style = Some(json!({"tone": "Conversational", "voice": "Confident"}));
    record.content_type = Some(json!({"primary_type": "blog", "secondary_types": ["webinar"]}));
    record.competitive_analysis = Some(json!({
        "competitors": ["Globex", "Initech"],
        "market_gaps": ["Mid-market onboarding guides"],
        "position": "Fast-growing challenger in workflow tooling"
    }));
    record.performance_metrics = Some(json!({
        "engagement_rate": 0.042,
        "bounce_rate": 0.51,
        "conversion_rate": 0.021
    }));
    record.traffic_sources = Some(json!({"organic": 62, "social": 14, "direct": 18, "referral": 6}));
    record.status = "completed".to_string();
    record
}

pub fn research_preferences(user_id: i64, now: DateTime<Utc>) -> ResearchPreferencesRecord {
    let mut record = ResearchPreferencesRecord::new(user_id, now);
    record.research_depth = Some("Comprehensive".to_string());
    record.content_types = Some(json!(["blog", "Video", "case study"]));
    record.auto_research = Some(true);
    record.factual_content = Some(true);
    record.target_audience = Some(json!({"pain_points": ["Budget approval"]}));
    record.research_topics = Some(json!(["Automation", "AI agents"]));
    record.content_frequency = Some("Twice weekly".to_string());
    record
}

pub fn api_keys(now: DateTime<Utc>) -> Vec<ApiKeyRecord> {
    vec![
        ApiKeyRecord {
            provider: "google_analytics".to_string(),
            is_active: true,
            created_at: now - Duration::days(3),
            last_used: Some(now - Duration::hours(2)),
        },
        ApiKeyRecord {
            provider: "google_search_console".to_string(),
            is_active: true,
            created_at: now - Duration::days(3),
            last_used: None,
        },
    ]
}

pub fn onboarding_session(user_id: i64, now: DateTime<Utc>) -> OnboardingSessionRecord {
    let mut record = OnboardingSessionRecord::new(user_id, now);
    record.current_step = 6;
    record.progress = 100.0;
    record.business_size = Some("medium".to_string());
    record.budget = Some(2500.0);
    record.team_size = Some(4);
    record.timeline = Some("6 months".to_string());
    record
}

/// Store a complete set of onboarding records for `user_id`
pub async fn seed_full_user(pool: &SqlitePool, user_id: i64, now: DateTime<Utc>) {
    save_website_analysis(pool, &website_analysis(user_id, now)).await.unwrap();
    save_research_preferences(pool, &research_preferences(user_id, now)).await.unwrap();
    for key in api_keys(now) {
        save_api_key(pool, user_id, &key).await.unwrap();
    }
    save_onboarding_session(pool, &onboarding_session(user_id, now)).await.unwrap();
}

/// IntegratedData equivalent to a fully seeded user, without a database
pub fn full_integrated_data(now: DateTime<Utc>) -> IntegratedData {
    serde_json::from_value(json!({
        "website_analysis": website_analysis(1, now),
        "research_preferences": research_preferences(1, now),
        "api_keys_data": {
            "providers": ["google_analytics", "google_search_console"],
            "total_keys": 2,
            "active_keys": 2,
            "analytics_connected": true,
            "search_console_connected": true,
            "last_used": (now - Duration::hours(2)).to_rfc3339()
        },
        "onboarding_session": onboarding_session(1, now)
    }))
    .unwrap()
}
