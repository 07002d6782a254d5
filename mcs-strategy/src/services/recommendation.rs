//! AI recommendation collaborator
//!
//! The provider is opaque: it receives a prompt plus a JSON schema and
//! returns JSON or fails. Deadlines are the caller's concern.

use crate::error::AiError;
use crate::models::ContentStrategy;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::fmt::Write;

/// External AI collaborator
#[async_trait]
pub trait RecommendationProvider: Send + Sync {
    /// Provider identifier used in logs
    fn name(&self) -> &str;

    /// Generate recommendations shaped by `response_schema`
    async fn call(&self, prompt: &str, response_schema: &Value) -> Result<Value, AiError>;

    /// Whether the provider can be called at all (credentials configured etc.)
    fn is_available(&self) -> bool {
        true
    }
}

/// Provider used when no AI backend is configured; every call fails
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredProvider;

#[async_trait]
impl RecommendationProvider for UnconfiguredProvider {
    fn name(&self) -> &str {
        "unconfigured"
    }

    async fn call(&self, _prompt: &str, _response_schema: &Value) -> Result<Value, AiError> {
        Err(AiError::Provider("no AI provider configured".to_string()))
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// Prompt listing the strategy's fields with their confidence
pub fn build_recommendation_prompt(strategy: &ContentStrategy) -> String {
    let mut prompt = format!(
        "Review the content strategy \"{}\" and recommend improvements.\n\
         Data quality: {} ({:.2}).\n\nFields:\n",
        strategy.name, strategy.data_quality.quality_level, strategy.data_quality.overall_score
    );

    for (name, value) in &strategy.fields {
        let confidence = strategy.field_confidence.get(name).copied().unwrap_or(0.0);
        let _ = writeln!(prompt, "- {} (confidence {:.2}): {}", name, confidence, value);
    }

    if !strategy.data_quality.issues.is_empty() {
        prompt.push_str("\nKnown data issues:\n");
        for issue in &strategy.data_quality.issues {
            let _ = writeln!(prompt, "- {}", issue);
        }
    }

    prompt
}

/// JSON schema the provider's response must follow
pub fn recommendation_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "summary": { "type": "string" },
            "recommendations": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "field": { "type": "string" },
                        "suggestion": { "type": "string" },
                        "priority": { "type": "string", "enum": ["high", "medium", "low"] }
                    },
                    "required": ["suggestion"]
                }
            }
        },
        "required": ["recommendations"]
    })
}

/// Reject responses that are not objects with a `recommendations` array
pub fn validate_response(response: Value) -> Result<Value, AiError> {
    match response.get("recommendations") {
        Some(Value::Array(_)) => Ok(response),
        Some(_) => Err(AiError::InvalidResponse("`recommendations` is not an array".to_string())),
        None => Err(AiError::InvalidResponse("missing `recommendations`".to_string())),
    }
}
