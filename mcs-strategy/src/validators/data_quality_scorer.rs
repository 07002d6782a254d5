//! Data-Quality Scorer
//!
//! Scores each onboarding source on five axes with fixed per-source rules,
//! averages each axis over the four sources, and derives the overall score
//! as the mean of the five axis means.
//!
//! An empty source scores zero on every axis. A non-empty source without a
//! timestamp gets the neutral freshness of 0.5; one with an unreadable
//! timestamp fails the whole assessment.

use crate::error::QualityError;
use crate::models::{has_content, DataQualityAssessment, IntegratedData, QualityLevel, SourceKind, SourceMap};
use chrono::{DateTime, Duration, Utc};
use mcs_common::time::{freshness_score, parse_timestamp, FRESHNESS_FLOOR};
use serde_json::Value;
use tracing::{debug, error};

/// Axis score below which a recommendation is emitted
pub const RECOMMENDATION_THRESHOLD: f64 = 0.7;

/// Axis score below which an issue is reported
pub const ISSUE_THRESHOLD: f64 = 0.5;

/// Default max age for freshness decay
pub const DEFAULT_MAX_AGE_DAYS: i64 = 30;

/// Expected JSON type for accuracy checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Text,
    Number,
    Boolean,
    Object,
    List,
    /// Comma-separated text or a list
    TextOrList,
}

impl Expect {
    fn matches(&self, value: &Value) -> bool {
        match self {
            Expect::Text => value.is_string(),
            Expect::Number => value.is_number(),
            Expect::Boolean => value.is_boolean(),
            Expect::Object => value.is_object(),
            Expect::List => value.is_array(),
            Expect::TextOrList => value.is_string() || value.is_array(),
        }
    }
}

/// Fixed scoring rules for one source
struct SourceRules {
    kind: SourceKind,
    /// Completeness checklist (present and truthy)
    required: &'static [&'static str],
    /// Timestamp fields, first present one wins
    timestamps: &'static [&'static str],
    /// Accuracy checklist, equal share per well-typed field
    typed: &'static [(&'static str, Expect)],
    /// Relevance weights (sum to 1.0)
    relevance: &'static [(&'static str, f64)],
    /// Pairs that should be filled together, with their weight
    pairs: &'static [(&'static str, &'static str, f64)],
}

static RULES: [SourceRules; 4] = [
    SourceRules {
        kind: SourceKind::WebsiteAnalysis,
        required: &["domain", "industry", "business_type", "target_audience", "content_goals"],
        timestamps: &["updated_at", "created_at"],
        typed: &[
            ("domain", Expect::Text),
            ("industry", Expect::Text),
            ("business_type", Expect::Text),
            ("target_audience", Expect::Object),
            ("content_goals", Expect::TextOrList),
        ],
        relevance: &[("domain", 0.3), ("industry", 0.3), ("content_goals", 0.4)],
        pairs: &[
            ("domain", "industry", 0.5),
            ("target_audience", "content_goals", 0.5),
        ],
    },
    SourceRules {
        kind: SourceKind::ResearchPreferences,
        required: &["research_depth", "content_types", "target_audience", "content_frequency"],
        timestamps: &["updated_at", "created_at"],
        typed: &[
            ("research_depth", Expect::Text),
            ("content_types", Expect::TextOrList),
            ("auto_research", Expect::Boolean),
            ("factual_content", Expect::Boolean),
        ],
        relevance: &[("content_types", 0.4), ("target_audience", 0.3), ("research_depth", 0.3)],
        pairs: &[
            ("content_types", "content_frequency", 0.5),
            ("research_depth", "target_audience", 0.5),
        ],
    },
    SourceRules {
        kind: SourceKind::ApiKeysData,
        required: &["providers", "total_keys", "active_keys"],
        timestamps: &["last_used", "updated_at"],
        typed: &[
            ("providers", Expect::List),
            ("total_keys", Expect::Number),
            ("active_keys", Expect::Number),
            ("analytics_connected", Expect::Boolean),
        ],
        relevance: &[
            ("providers", 0.4),
            ("analytics_connected", 0.3),
            ("search_console_connected", 0.3),
        ],
        pairs: &[
            ("providers", "active_keys", 0.5),
            ("analytics_connected", "search_console_connected", 0.5),
        ],
    },
    SourceRules {
        kind: SourceKind::OnboardingSession,
        required: &["current_step", "progress", "business_size", "timeline"],
        timestamps: &["updated_at", "started_at"],
        typed: &[
            ("current_step", Expect::Number),
            ("progress", Expect::Number),
            ("budget", Expect::Number),
            ("team_size", Expect::Number),
        ],
        relevance: &[("business_size", 0.4), ("budget", 0.3), ("timeline", 0.3)],
        pairs: &[("budget", "team_size", 0.5), ("business_size", "timeline", 0.5)],
    },
];

/// Present and truthy: has content, and is not `false` or zero
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Some(v) => has_content(v),
        None => false,
    }
}

/// Five axis scores for one source
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SourceScores {
    pub completeness: f64,
    pub freshness: f64,
    pub accuracy: f64,
    pub relevance: f64,
    pub consistency: f64,
}

/// Scores integrated onboarding data
pub trait QualityAssessor: Send + Sync {
    fn assess_at(&self, data: &IntegratedData, now: DateTime<Utc>) -> Result<DataQualityAssessment, QualityError>;
}

/// Data-Quality Scorer
#[derive(Debug, Clone)]
pub struct DataQualityScorer {
    max_age: Duration,
}

impl Default for DataQualityScorer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_AGE_DAYS)
    }
}

impl QualityAssessor for DataQualityScorer {
    fn assess_at(&self, data: &IntegratedData, now: DateTime<Utc>) -> Result<DataQualityAssessment, QualityError> {
        DataQualityScorer::assess_at(self, data, now)
    }
}

impl DataQualityScorer {
    pub fn new(max_age_days: i64) -> Self {
        Self {
            max_age: Duration::days(max_age_days),
        }
    }

    /// Assess the four sources as of now
    pub fn assess(
        &self,
        website_analysis: &SourceMap,
        research_preferences: &SourceMap,
        api_keys_data: &SourceMap,
        onboarding_session: &SourceMap,
    ) -> Result<DataQualityAssessment, QualityError> {
        let data = IntegratedData {
            website_analysis: website_analysis.clone(),
            research_preferences: research_preferences.clone(),
            api_keys_data: api_keys_data.clone(),
            onboarding_session: onboarding_session.clone(),
        };
        self.assess_at(&data, Utc::now())
    }

    /// Assess integrated data as of `now`
    pub fn assess_at(&self, data: &IntegratedData, now: DateTime<Utc>) -> Result<DataQualityAssessment, QualityError> {
        let mut per_source = Vec::with_capacity(RULES.len());
        for rules in RULES.iter() {
            let scores = self.score_source(rules, data.source(rules.kind), now).map_err(|e| {
                error!(source = rules.kind.as_str(), "Quality assessment failed: {}", e);
                e
            })?;
            debug!(source = rules.kind.as_str(), ?scores, "Source scored");
            per_source.push(scores);
        }

        let completeness = axis_mean(&per_source, |s| s.completeness);
        let freshness = axis_mean(&per_source, |s| s.freshness);
        let accuracy = axis_mean(&per_source, |s| s.accuracy);
        let relevance = axis_mean(&per_source, |s| s.relevance);
        let consistency = axis_mean(&per_source, |s| s.consistency);

        let overall_score = (completeness + freshness + accuracy + relevance + consistency) / 5.0;

        let mut assessment = DataQualityAssessment {
            overall_score,
            completeness,
            freshness,
            accuracy,
            relevance,
            consistency,
            quality_level: QualityLevel::from_score(overall_score),
            recommendations: Vec::new(),
            issues: Vec::new(),
            assessment_timestamp: now,
        };
        add_findings(&mut assessment);

        Ok(assessment)
    }

    /// Score one source on all five axes
    fn score_source(&self, rules: &SourceRules, source: &SourceMap, now: DateTime<Utc>) -> Result<SourceScores, QualityError> {
        if source.is_empty() {
            return Ok(SourceScores::default());
        }

        let completeness = rules
            .required
            .iter()
            .filter(|f| is_truthy(source.get(**f)))
            .count() as f64
            / rules.required.len() as f64;

        let freshness = self.source_freshness(rules, source, now)?;

        let accuracy = rules
            .typed
            .iter()
            .filter(|(f, expect)| source.get(*f).map(|v| has_content(v) && expect.matches(v)).unwrap_or(false))
            .count() as f64
            / rules.typed.len() as f64;

        let relevance = rules
            .relevance
            .iter()
            .filter(|(f, _)| is_truthy(source.get(*f)))
            .map(|(_, w)| w)
            .sum::<f64>();

        let consistency = rules
            .pairs
            .iter()
            .filter(|(a, b, _)| is_truthy(source.get(*a)) && is_truthy(source.get(*b)))
            .map(|(_, _, w)| w)
            .sum::<f64>();

        Ok(SourceScores {
            completeness,
            freshness,
            accuracy: accuracy.min(1.0),
            relevance: relevance.min(1.0),
            consistency: consistency.min(1.0),
        })
    }

    fn source_freshness(&self, rules: &SourceRules, source: &SourceMap, now: DateTime<Utc>) -> Result<f64, QualityError> {
        let Some((field, raw)) = rules
            .timestamps
            .iter()
            .find_map(|f| source.get(*f).filter(|v| !v.is_null()).map(|v| (*f, v)))
        else {
            return Ok(FRESHNESS_FLOOR);
        };

        let timestamp = raw.as_str().and_then(parse_timestamp).ok_or_else(|| QualityError::InvalidTimestamp {
            source_name: rules.kind.as_str().to_string(),
            field: field.to_string(),
            value: raw.to_string(),
        })?;

        Ok(freshness_score(timestamp, now, self.max_age))
    }
}

fn axis_mean(scores: &[SourceScores], axis: impl Fn(&SourceScores) -> f64) -> f64 {
    scores.iter().map(axis).sum::<f64>() / scores.len() as f64
}

/// Templated recommendations (< 0.7) and issues (< 0.5) per axis
fn add_findings(assessment: &mut DataQualityAssessment) {
    let axes = [
        (
            assessment.completeness,
            "Complete the remaining onboarding steps to fill missing business details",
            "Onboarding data is largely incomplete",
        ),
        (
            assessment.freshness,
            "Re-run the website analysis to refresh outdated onboarding data",
            "Onboarding data is stale",
        ),
        (
            assessment.accuracy,
            "Review onboarding answers for missing or incorrectly formatted values",
            "Several onboarding values are missing or malformed",
        ),
        (
            assessment.relevance,
            "Add industry, content goals and content preferences to improve strategy relevance",
            "Onboarding data has little bearing on strategy creation",
        ),
        (
            assessment.consistency,
            "Fill related fields together, such as domain with industry and budget with team size",
            "Related onboarding fields are inconsistently filled",
        ),
    ];

    for (score, recommendation, issue) in axes {
        if score < RECOMMENDATION_THRESHOLD {
            assessment.recommendations.push(recommendation.to_string());
        }
        if score < ISSUE_THRESHOLD {
            assessment.issues.push(issue.to_string());
        }
    }
}
