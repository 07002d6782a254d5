//! Data-quality assessment result types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Quality band derived from the overall score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl QualityLevel {
    /// Fixed thresholds: excellent >= 0.9, good >= 0.7, fair >= 0.5, else poor
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            QualityLevel::Excellent
        } else if score >= 0.7 {
            QualityLevel::Good
        } else if score >= 0.5 {
            QualityLevel::Fair
        } else {
            QualityLevel::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityLevel::Excellent => "excellent",
            QualityLevel::Good => "good",
            QualityLevel::Fair => "fair",
            QualityLevel::Poor => "poor",
        }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Five-axis quality assessment of the onboarding sources
///
/// `overall_score` is always the mean of the five axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQualityAssessment {
    pub overall_score: f64,
    pub completeness: f64,
    pub freshness: f64,
    pub accuracy: f64,
    pub relevance: f64,
    pub consistency: f64,
    pub quality_level: QualityLevel,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub issues: Vec<String>,
    pub assessment_timestamp: DateTime<Utc>,
}

impl DataQualityAssessment {
    /// All-zero assessment used by the integration fallback
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            overall_score: 0.0,
            completeness: 0.0,
            freshness: 0.0,
            accuracy: 0.0,
            relevance: 0.0,
            consistency: 0.0,
            quality_level: QualityLevel::Poor,
            recommendations: Vec::new(),
            issues: vec!["No onboarding data could be processed".to_string()],
            assessment_timestamp: now,
        }
    }

    /// Axis scores in a fixed order (completeness, freshness, accuracy, relevance, consistency)
    pub fn axes(&self) -> [f64; 5] {
        [
            self.completeness,
            self.freshness,
            self.accuracy,
            self.relevance,
            self.consistency,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_thresholds_at_boundaries() {
        assert_eq!(QualityLevel::from_score(1.0), QualityLevel::Excellent);
        assert_eq!(QualityLevel::from_score(0.9), QualityLevel::Excellent);
        assert_eq!(QualityLevel::from_score(0.89999), QualityLevel::Good);
        assert_eq!(QualityLevel::from_score(0.7), QualityLevel::Good);
        assert_eq!(QualityLevel::from_score(0.69999), QualityLevel::Fair);
        assert_eq!(QualityLevel::from_score(0.5), QualityLevel::Fair);
        assert_eq!(QualityLevel::from_score(0.49999), QualityLevel::Poor);
        assert_eq!(QualityLevel::from_score(0.0), QualityLevel::Poor);
    }

    #[test]
    fn test_level_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&QualityLevel::Excellent).unwrap(), "\"excellent\"");
    }

    #[test]
    fn test_empty_assessment_is_zero() {
        let empty = DataQualityAssessment::empty(Utc::now());
        assert_eq!(empty.overall_score, 0.0);
        assert!(empty.axes().iter().all(|a| *a == 0.0));
        assert_eq!(empty.quality_level, QualityLevel::Poor);
    }
}
