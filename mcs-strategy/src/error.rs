//! Error types for mcs-strategy
//!
//! Each pipeline stage has its own error type because each handles failure
//! differently: transformation failures stay inside one field, quality
//! failures reach the caller, integration failures are absorbed.

use std::time::Duration;
use thiserror::Error;

/// Failure while transforming a single field
#[derive(Debug, Error)]
pub enum TransformError {
    /// A resolved value cannot be coerced to the field's type
    #[error("Field {field}: cannot coerce {value} to {target}")]
    Coercion {
        field: String,
        value: String,
        target: &'static str,
    },

    /// A resolved value has a shape the transformation cannot use
    #[error("Field {field}: unexpected shape at {path}: {detail}")]
    InvalidShape {
        field: String,
        path: String,
        detail: String,
    },

    /// Field mapping table is inconsistent (raised at engine construction)
    #[error("Field mapping configuration error: {0}")]
    Configuration(String),
}

/// Failure while assessing data quality
#[derive(Debug, Error)]
pub enum QualityError {
    /// A source timestamp is present but unreadable
    #[error("Invalid timestamp in {source_name}.{field}: {value}")]
    InvalidTimestamp {
        source_name: String,
        field: String,
        value: String,
    },
}

/// Failure of the external AI collaborator
#[derive(Debug, Error)]
pub enum AiError {
    /// Call did not complete within the caller's deadline
    #[error("AI call timed out after {0:?}")]
    Timeout(Duration),

    /// Provider reported an error
    #[error("AI provider error: {0}")]
    Provider(String),

    /// Response did not match the requested schema
    #[error("Invalid AI response: {0}")]
    InvalidResponse(String),
}

/// Strategy orchestration errors
#[derive(Debug, Error)]
pub enum StrategyError {
    /// Strategy does not exist
    #[error("Strategy not found: {0}")]
    NotFound(String),

    /// Persistence or serialization failure
    #[error("Common error: {0}")]
    Common(#[from] mcs_common::Error),

    /// Field transformation engine could not be built
    #[error(transparent)]
    Transform(#[from] TransformError),
}

impl From<sqlx::Error> for StrategyError {
    fn from(err: sqlx::Error) -> Self {
        StrategyError::Common(mcs_common::Error::Database(err))
    }
}

impl From<serde_json::Error> for StrategyError {
    fn from(err: serde_json::Error) -> Self {
        StrategyError::Common(mcs_common::Error::Serialization(err))
    }
}

/// Result alias for orchestrator operations
pub type StrategyResult<T> = std::result::Result<T, StrategyError>;
