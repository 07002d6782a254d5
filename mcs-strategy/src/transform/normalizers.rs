//! Custom field transformations
//!
//! Each function reads the values resolved for its field and returns
//! `Ok(None)` when there is nothing usable, which sends the engine to the
//! field's static default.

use super::mappings::SourceData;
use crate::error::TransformError;
use crate::models::{has_content, IntegratedData};
use serde_json::{json, Map, Value};

type Outcome = Result<Option<Value>, TransformError>;

/// Canonical content format vocabulary
pub const CANONICAL_FORMATS: [&str; 8] = [
    "Blog Posts",
    "Videos",
    "Infographics",
    "Webinars",
    "Podcasts",
    "Case Studies",
    "Whitepapers",
    "Social Media Posts",
];

/// Free-text labels accepted for each canonical format (lowercase)
const FORMAT_ALIASES: [(&str, &[&str]); 8] = [
    ("Blog Posts", &["blog", "blogs", "blog post", "blog posts", "article", "articles"]),
    ("Videos", &["video", "videos", "video content"]),
    ("Infographics", &["infographic", "infographics"]),
    ("Webinars", &["webinar", "webinars"]),
    ("Podcasts", &["podcast", "podcasts"]),
    ("Case Studies", &["case study", "case studies"]),
    ("Whitepapers", &["whitepaper", "whitepapers", "white paper", "white papers"]),
    (
        "Social Media Posts",
        &["social", "social media", "social media post", "social media posts", "social posts"],
    ),
];

/// Competitive position keyword sets, in priority order
const POSITION_KEYWORDS: [(&str, &[&str]); 4] = [
    ("Leader", &["market leader", "industry leader", "dominant", "top player", "number one"]),
    ("Challenger", &["challenger", "fast-growing", "fast growing", "disruptor", "disrupting", "gaining share"]),
    ("Niche", &["niche"]),
    ("Emerging", &["emerging", "startup", "start-up", "new entrant", "early stage", "early-stage"]),
];

/// Performance metric keys and the target each one implies
const METRIC_TARGETS: [(&str, &str); 7] = [
    ("traffic", "Traffic Growth"),
    ("visit", "Traffic Growth"),
    ("engagement", "Engagement Rate"),
    ("bounce", "Bounce Rate Reduction"),
    ("conversion", "Conversion Rate"),
    ("lead", "Lead Generation"),
    ("ranking", "Search Rankings"),
];

const ENGAGEMENT_KEYS: [&str; 6] = [
    "engagement",
    "bounce",
    "session",
    "time_on",
    "pages_per",
    "return",
];

// ----------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------

/// Text items in a value: comma-separated strings, string arrays, or
/// arrays of objects with a `name`
fn text_items(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Object(obj) => obj
                    .get("name")
                    .or_else(|| obj.get("domain"))
                    .and_then(Value::as_str)
                    .map(|s| s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

/// Append items not already present (case-insensitive)
fn push_unique(target: &mut Vec<String>, items: impl IntoIterator<Item = String>) {
    for item in items {
        if !target.iter().any(|t| t.eq_ignore_ascii_case(&item)) {
            target.push(item);
        }
    }
}

/// All string leaves of a value, lowercased and joined
fn searchable_text(value: &Value, out: &mut String) {
    match value {
        Value::String(s) => {
            out.push(' ');
            out.push_str(&s.to_lowercase());
        }
        Value::Array(items) => items.iter().for_each(|v| searchable_text(v, out)),
        Value::Object(map) => map.values().for_each(|v| searchable_text(v, out)),
        _ => {}
    }
}

fn non_empty_list(items: Vec<String>) -> Option<Value> {
    if items.is_empty() {
        None
    } else {
        Some(json!(items))
    }
}

fn shape_error(field: &str, path: &str, detail: &str) -> TransformError {
    TransformError::InvalidShape {
        field: field.to_string(),
        path: path.to_string(),
        detail: detail.to_string(),
    }
}

/// Canonical format for a free-text label
pub fn canonical_format(label: &str) -> Option<&'static str> {
    let normalized = label.trim().to_lowercase().replace(['_', '-'], " ");
    FORMAT_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.contains(&normalized.as_str()))
        .map(|(canonical, _)| *canonical)
}

// ----------------------------------------------------------------------
// Content formats
// ----------------------------------------------------------------------

/// Canonical formats named anywhere in the resolved sources
///
/// Unrecognized labels are dropped. Order is first-seen, without duplicates.
pub fn extract_preferred_formats(source: &SourceData) -> Vec<&'static str> {
    let mut formats: Vec<&'static str> = Vec::new();
    for (_, value) in source.iter() {
        for label in text_items(value) {
            if let Some(canonical) = canonical_format(&label) {
                if !formats.contains(&canonical) {
                    formats.push(canonical);
                }
            }
        }
    }
    formats
}

pub fn preferred_formats(source: &SourceData, _data: &IntegratedData) -> Outcome {
    let formats = extract_preferred_formats(source);
    Ok(non_empty_list(formats.into_iter().map(str::to_string).collect()))
}

/// Even percentage split across the preferred formats (remainder to the first)
pub fn content_mix(source: &SourceData, _data: &IntegratedData) -> Outcome {
    let formats = extract_preferred_formats(source);
    if formats.is_empty() {
        return Ok(None);
    }

    let share = 100 / formats.len() as u64;
    let remainder = 100 % formats.len() as u64;
    let mix: Map<String, Value> = formats
        .iter()
        .enumerate()
        .map(|(i, format)| {
            let pct = if i == 0 { share + remainder } else { share };
            (format.to_string(), json!(pct))
        })
        .collect();
    Ok(Some(Value::Object(mix)))
}

// ----------------------------------------------------------------------
// Business context
// ----------------------------------------------------------------------

pub fn business_objectives(source: &SourceData, _data: &IntegratedData) -> Outcome {
    let mut objectives = Vec::new();
    for (_, value) in source.iter() {
        push_unique(&mut objectives, text_items(value));
    }
    if objectives.is_empty() {
        return Ok(None);
    }
    Ok(Some(json!(objectives.join(", "))))
}

pub fn target_metrics(source: &SourceData, _data: &IntegratedData) -> Outcome {
    let mut targets: Vec<String> = Vec::new();

    for (path, value) in source.iter() {
        match value {
            Value::Object(metrics) => {
                for key in metrics.keys() {
                    let key = key.to_lowercase();
                    let implied = METRIC_TARGETS
                        .iter()
                        .filter(|(fragment, _)| key.contains(fragment))
                        .map(|(_, target)| target.to_string());
                    push_unique(&mut targets, implied);
                }
            }
            Value::String(_) | Value::Array(_) => push_unique(&mut targets, text_items(value)),
            Value::Null => {}
            _ => return Err(shape_error("target_metrics", path, "expected metrics object or list")),
        }
    }

    if targets.is_empty() {
        return Ok(None);
    }
    Ok(Some(json!(targets.join(", "))))
}

/// Explicit market share if reported, else an estimate from business size
pub fn market_share(source: &SourceData, _data: &IntegratedData) -> Outcome {
    if let Some(share) = source.get("website_analysis.performance_metrics.market_share") {
        match share {
            Value::Number(n) => return Ok(Some(json!(format!("{}%", n)))),
            Value::String(s) if !s.trim().is_empty() => return Ok(Some(json!(s.trim()))),
            _ => {}
        }
    }

    let Some(size) = source
        .get("onboarding_session.business_size")
        .and_then(Value::as_str)
    else {
        return Ok(None);
    };

    let estimate = match size.trim().to_lowercase().as_str() {
        "solo" | "startup" | "small" => "Emerging",
        "medium" | "mid-size" | "midsize" => "Growing",
        "large" | "enterprise" => "Established",
        _ => return Ok(None),
    };
    Ok(Some(json!(estimate)))
}

/// First keyword set found in the analysis text wins
pub fn classify_competitive_position(text: &str) -> Option<&'static str> {
    let text = text.to_lowercase();
    POSITION_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(position, _)| *position)
}

pub fn competitive_position(source: &SourceData, _data: &IntegratedData) -> Outcome {
    let mut text = String::new();
    for (_, value) in source.iter() {
        searchable_text(value, &mut text);
    }
    Ok(classify_competitive_position(&text).map(|p| json!(p)))
}

// ----------------------------------------------------------------------
// Audience intelligence
// ----------------------------------------------------------------------

pub fn content_preferences(source: &SourceData, _data: &IntegratedData) -> Outcome {
    let mut preferences = Map::new();

    if let Some(types) = source.get("research_preferences.content_types") {
        let items = text_items(types);
        if !items.is_empty() {
            preferences.insert("content_types".to_string(), json!(items));
        }
    }
    if let Some(tone) = source
        .get("website_analysis.writing_style.tone")
        .filter(|v| has_content(v))
    {
        preferences.insert("tone".to_string(), tone.clone());
    }
    if let Some(depth) = source
        .get("research_preferences.research_depth")
        .filter(|v| has_content(v))
    {
        preferences.insert("research_depth".to_string(), depth.clone());
    }

    if preferences.is_empty() {
        return Ok(None);
    }
    Ok(Some(Value::Object(preferences)))
}

pub fn audience_pain_points(source: &SourceData, _data: &IntegratedData) -> Outcome {
    let mut points = Vec::new();
    for (_, value) in source.iter() {
        push_unique(&mut points, text_items(value));
    }
    Ok(non_empty_list(points))
}

/// Engagement-related entries of the performance metrics
pub fn engagement_metrics(source: &SourceData, _data: &IntegratedData) -> Outcome {
    let Some((path, value)) = source.first_present() else {
        return Ok(None);
    };
    let Some(metrics) = value.as_object() else {
        return Err(shape_error("engagement_metrics", path, "expected metrics object"));
    };

    let selected: Map<String, Value> = metrics
        .iter()
        .filter(|(key, _)| {
            let key = key.to_lowercase();
            ENGAGEMENT_KEYS.iter().any(|fragment| key.contains(fragment))
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    if selected.is_empty() {
        return Ok(None);
    }
    Ok(Some(Value::Object(selected)))
}

// ----------------------------------------------------------------------
// Competitive intelligence
// ----------------------------------------------------------------------

pub fn top_competitors(source: &SourceData, _data: &IntegratedData) -> Outcome {
    let mut names = Vec::new();
    for (_, value) in source.iter() {
        push_unique(&mut names, text_items(value));
    }
    Ok(non_empty_list(names))
}

pub fn market_gaps(source: &SourceData, _data: &IntegratedData) -> Outcome {
    let mut gaps = Vec::new();
    for (_, value) in source.iter() {
        push_unique(&mut gaps, text_items(value));
    }
    Ok(non_empty_list(gaps))
}

pub fn industry_trends(source: &SourceData, _data: &IntegratedData) -> Outcome {
    let industry = source
        .get("website_analysis.industry")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let topics = source
        .get("research_preferences.research_topics")
        .map(text_items)
        .unwrap_or_default();

    let trends = match (industry, topics.is_empty()) {
        (Some(industry), false) => format!("{}: {}", industry, topics.join(", ")),
        (Some(industry), true) => format!("{} industry developments", industry),
        (None, false) => topics.join(", "),
        (None, true) => return Ok(None),
    };
    Ok(Some(json!(trends)))
}

// ----------------------------------------------------------------------
// Content strategy
// ----------------------------------------------------------------------

pub fn quality_metrics(source: &SourceData, _data: &IntegratedData) -> Outcome {
    let mut metrics = Map::new();

    if let Some(factual) = source
        .get("research_preferences.factual_content")
        .and_then(Value::as_bool)
    {
        metrics.insert("factual_accuracy_required".to_string(), json!(factual));
        metrics.insert(
            "source_citations".to_string(),
            json!(if factual { "Required" } else { "Optional" }),
        );
    }
    if let Some(depth) = source
        .get("research_preferences.research_depth")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
    {
        metrics.insert("research_depth".to_string(), json!(depth));
    }

    if metrics.is_empty() {
        return Ok(None);
    }
    Ok(Some(Value::Object(metrics)))
}

/// "Tone: ...; Voice: ..." from the writing style, else explicit guidelines
pub fn editorial_guidelines(source: &SourceData, _data: &IntegratedData) -> Outcome {
    if let Some(style) = source
        .get("website_analysis.writing_style")
        .and_then(Value::as_object)
    {
        let parts: Vec<String> = ["tone", "voice", "complexity", "engagement_level"]
            .iter()
            .filter_map(|key| {
                style
                    .get(*key)
                    .and_then(Value::as_str)
                    .filter(|s| !s.trim().is_empty())
                    .map(|s| format!("{}: {}", capitalize(key), s.trim()))
            })
            .collect();
        if !parts.is_empty() {
            return Ok(Some(json!(parts.join("; "))));
        }
    }

    Ok(source
        .get("website_analysis.recommended_settings.guidelines")
        .filter(|v| has_content(v))
        .cloned())
}

fn capitalize(key: &str) -> String {
    let words: Vec<String> = key
        .split('_')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();
    words.join(" ")
}

// ----------------------------------------------------------------------
// Performance and analytics
// ----------------------------------------------------------------------

/// A/B testing needs analytics plus a team able to run variants
///
/// Also true when an experimentation provider key is connected.
pub fn ab_testing_capabilities(source: &SourceData, data: &IntegratedData) -> Outcome {
    let experimentation_provider = data
        .resolve("api_keys_data.providers")
        .map(text_items)
        .unwrap_or_default()
        .iter()
        .any(|p| {
            let p = p.to_lowercase();
            p.contains("optimizely") || p.contains("vwo")
        });
    if experimentation_provider {
        return Ok(Some(json!(true)));
    }

    let analytics = source
        .get("api_keys_data.analytics_connected")
        .and_then(Value::as_bool);
    let team_size = source
        .get("onboarding_session.team_size")
        .and_then(Value::as_f64);

    match (analytics, team_size) {
        (Some(connected), Some(size)) => Ok(Some(json!(connected && size >= 2.0))),
        (Some(connected), None) => Ok(Some(json!(connected))),
        _ => Ok(None),
    }
}
