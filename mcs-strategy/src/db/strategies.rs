//! Content strategy database operations
//!
//! The whole strategy is stored as one JSON payload; `user_id`, `name` and
//! the timestamps are duplicated into columns for lookups.

use crate::models::ContentStrategy;
use mcs_common::{Error, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Insert or update a strategy
pub async fn save_strategy(pool: &SqlitePool, strategy: &ContentStrategy) -> Result<()> {
    let payload = serde_json::to_string(strategy)
        .map_err(|e| Error::Internal(format!("Failed to serialize strategy: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO content_strategies (id, user_id, name, payload, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            payload = excluded.payload,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(strategy.id.to_string())
    .bind(strategy.user_id)
    .bind(&strategy.name)
    .bind(&payload)
    .bind(strategy.created_at.to_rfc3339())
    .bind(strategy.updated_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a strategy by id
pub async fn load_strategy(pool: &SqlitePool, id: Uuid) -> Result<Option<ContentStrategy>> {
    let row = sqlx::query("SELECT payload FROM content_strategies WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let payload: String = row.try_get("payload")?;
            let strategy = serde_json::from_str(&payload)
                .map_err(|e| Error::Internal(format!("Failed to deserialize strategy {}: {}", id, e)))?;
            Ok(Some(strategy))
        }
        None => Ok(None),
    }
}

/// Strategy ids for a user, newest first
pub async fn list_strategy_ids(pool: &SqlitePool, user_id: i64) -> Result<Vec<Uuid>> {
    let rows = sqlx::query("SELECT id FROM content_strategies WHERE user_id = ? ORDER BY created_at DESC")
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|row| -> Result<Uuid> {
            let id: String = row.try_get("id")?;
            Uuid::parse_str(&id).map_err(|e| Error::Internal(format!("Invalid strategy id {}: {}", id, e)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DataQualityAssessment;
    use chrono::Utc;
    use mcs_common::db::init_memory_database;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn strategy(user_id: i64, name: &str) -> ContentStrategy {
        let now = Utc::now();
        ContentStrategy {
            id: Uuid::new_v4(),
            user_id,
            name: name.to_string(),
            fields: BTreeMap::from([("brand_voice".to_string(), json!("Professional"))]),
            field_confidence: BTreeMap::from([("brand_voice".to_string(), 0.3)]),
            field_sources: BTreeMap::from([(
                "brand_voice".to_string(),
                "website_analysis.writing_style.voice".to_string(),
            )]),
            data_quality: DataQualityAssessment::empty(now),
            ai_recommendations: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_save_load_update() {
        let pool = init_memory_database().await.unwrap();
        let mut s = strategy(3, "Q1 plan");
        save_strategy(&pool, &s).await.unwrap();

        assert_eq!(load_strategy(&pool, s.id).await.unwrap(), Some(s.clone()));

        s.ai_recommendations = Some(json!({"summary": "Publish weekly"}));
        s.name = "Q1 plan v2".to_string();
        save_strategy(&pool, &s).await.unwrap();

        let loaded = load_strategy(&pool, s.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Q1 plan v2");
        assert_eq!(loaded.ai_recommendations, Some(json!({"summary": "Publish weekly"})));
        assert_eq!(list_strategy_ids(&pool, 3).await.unwrap(), vec![s.id]);
    }

    #[tokio::test]
    async fn test_missing_strategy() {
        let pool = init_memory_database().await.unwrap();
        assert_eq!(load_strategy(&pool, Uuid::new_v4()).await.unwrap(), None);
        assert!(list_strategy_ids(&pool, 1).await.unwrap().is_empty());
    }
}
