//! Static default values for every strategy field

use serde_json::{json, Value};

/// Default for a field, `None` for unknown field names
pub fn default_value(field: &str) -> Option<Value> {
    let value = match field {
        // Business context
        "business_objectives" => json!("Lead Generation, Brand Awareness"),
        "target_metrics" => json!("Traffic Growth, Engagement Rate, Lead Generation"),
        "content_budget" => json!(1000.0),
        "team_size" => json!(1),
        "implementation_timeline" => json!("3 months"),
        "market_share" => json!("Growing"),
        "competitive_position" => json!("Emerging"),
        "performance_metrics" => json!({
            "traffic": 0,
            "engagement_rate": 0.0,
            "conversion_rate": 0.0
        }),

        // Audience intelligence
        "content_preferences" => json!({
            "content_types": ["Blog Posts", "Case Studies", "Videos"],
            "tone": "Professional"
        }),
        "consumption_patterns" => json!({
            "preferred_channels": ["Website", "Email", "Social Media"],
            "peak_hours": "Business hours"
        }),
        "audience_pain_points" => json!(["Time constraints", "Budget limitations", "Content quality"]),
        "buying_journey" => json!({
            "awareness": "Educational blog posts",
            "consideration": "Comparison guides and webinars",
            "decision": "Case studies and demos"
        }),
        "seasonal_trends" => json!("Steady year-round demand"),
        "engagement_metrics" => json!({
            "engagement_rate": 0.0,
            "bounce_rate": 0.0,
            "avg_session_duration": 0
        }),

        // Competitive intelligence
        "top_competitors" => json!(["Competitor analysis pending"]),
        "competitor_content_strategies" => json!("Review competitor formats, topics and publishing cadence"),
        "market_gaps" => json!(["Content gap analysis pending"]),
        "industry_trends" => json!("Digital transformation, AI adoption"),
        "emerging_trends" => json!("AI-assisted content, Short-form video"),

        // Content strategy
        "preferred_formats" => json!(["Blog Posts", "Case Studies", "Videos"]),
        "content_mix" => json!({"Blog Posts": 40, "Case Studies": 30, "Videos": 30}),
        "content_frequency" => json!("Weekly"),
        "optimal_timing" => json!({
            "best_days": ["Tuesday", "Wednesday", "Thursday"],
            "best_time": "9:00 AM"
        }),
        "quality_metrics" => json!({
            "factual_accuracy_required": true,
            "source_citations": "Required",
            "research_depth": "Standard"
        }),
        "editorial_guidelines" => json!("Clear, concise, audience-focused writing"),
        "brand_voice" => json!("Professional"),

        // Performance and analytics
        "traffic_sources" => json!({"organic": 0, "social": 0, "direct": 0, "referral": 0}),
        "conversion_rates" => json!({"overall": 0.0}),
        "content_roi_targets" => json!("3:1 return within 6 months"),
        "ab_testing_capabilities" => json!(false),

        _ => return None,
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::has_content;
    use crate::transform::FIELD_MAPPINGS;

    #[test]
    fn test_every_mapped_field_has_usable_default() {
        for mapping in FIELD_MAPPINGS.iter() {
            let value = default_value(mapping.field_name)
                .unwrap_or_else(|| panic!("no default for {}", mapping.field_name));
            assert!(has_content(&value), "empty default for {}", mapping.field_name);
        }
    }

    #[test]
    fn test_unknown_field() {
        assert_eq!(default_value("favorite_color"), None);
    }

    #[test]
    fn test_fixed_defaults() {
        assert_eq!(
            default_value("business_objectives"),
            Some(json!("Lead Generation, Brand Awareness"))
        );
        assert_eq!(default_value("ab_testing_capabilities"), Some(json!(false)));
        assert_eq!(
            default_value("preferred_formats").unwrap().as_array().unwrap().len(),
            3
        );
    }
}
