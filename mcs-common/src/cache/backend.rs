//! Cache storage backends
//!
//! The cache service talks to storage through a small GET/SETEX/DEL/KEYS
//! style trait. Two implementations:
//!
//! - [`MemoryBackend`]: in-process concurrent map, expiry checked lazily on read
//! - [`SqlCacheBackend`]: shared `cache_entries` table reachable by several
//!   processes, expiry enforced in every query

use async_trait::async_trait;
use dashmap::DashMap;
use sqlx::SqlitePool;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// Error types for cache backend operations
#[derive(Debug, Error)]
pub enum CacheError {
    /// Backend could not be reached
    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),

    /// Backend query failed
    #[error("Cache backend error: {0}")]
    Backend(#[from] sqlx::Error),

    /// Stored entry could not be (de)serialized
    #[error("Cache entry serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Key-value operations the cache service needs from a store
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Backend name for stats and logs
    fn name(&self) -> &'static str;

    /// Reachability probe (run once at startup)
    async fn ping(&self) -> Result<(), CacheError>;

    /// Fetch a live value
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store a value with an expiry
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Delete a key, returning whether it existed
    async fn del(&self, key: &str) -> Result<bool, CacheError>;

    /// List live keys starting with `prefix`
    async fn keys(&self, prefix: &str) -> Result<Vec<String>, CacheError>;
}

// ============================================================================
// In-process backend
// ============================================================================

#[derive(Debug, Clone)]
struct MemorySlot {
    value: String,
    expires_at: Instant,
}

impl MemorySlot {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Ttl longer than the clock can represent is capped at roughly a century
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

fn expiry_instant(ttl: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(ttl)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

/// In-process fallback backend
///
/// Safe for concurrent get/set/del from many tasks. Expired slots are
/// dropped when read or listed.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: DashMap<String, MemorySlot>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots physically held (expired ones included)
    pub fn raw_len(&self) -> usize {
        self.entries.len()
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        if let Some(slot) = self.entries.get(key) {
            if !slot.is_expired(now) {
                return Ok(Some(slot.value.clone()));
            }
        }
        // Lazy expiry; the read guard above is already released
        self.entries.remove_if(key, |_, slot| slot.is_expired(now));
        Ok(None)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.entries.insert(
            key.to_string(),
            MemorySlot {
                value: value.to_string(),
                expires_at: expiry_instant(ttl),
            },
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.entries.remove(key).is_some())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
        let now = Instant::now();
        self.entries.retain(|_, slot| !slot.is_expired(now));
        Ok(self
            .entries
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect())
    }
}

// ============================================================================
// Shared SQL backend
// ============================================================================

/// Cache backend over a shared `cache_entries` table
///
/// Expiry is native to the store: every read filters on `expires_at`, so
/// expired rows are invisible even before they are purged.
#[derive(Debug, Clone)]
pub struct SqlCacheBackend {
    pool: SqlitePool,
}

impl SqlCacheBackend {
    /// Wrap an existing pool; the `cache_entries` table must exist
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a cache database URL and ensure the table exists
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let pool = SqlitePool::connect(url)
            .await
            .map_err(|e| CacheError::Unavailable(format!("{}: {}", url, e)))?;
        crate::db::create_cache_entries_table(&pool)
            .await
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;
        Ok(Self { pool })
    }

    /// Physically remove expired rows
    pub async fn purge_expired(&self) -> Result<u64, CacheError> {
        let result = sqlx::query("DELETE FROM cache_entries WHERE expires_at <= ?")
            .bind(now_millis())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[async_trait]
impl CacheBackend for SqlCacheBackend {
    fn name(&self) -> &'static str {
        "sql"
    }

    async fn ping(&self) -> Result<(), CacheError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM cache_entries WHERE key = ? AND expires_at > ?")
                .bind(key)
                .bind(now_millis())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let expires_at = now_millis().saturating_add(ttl_ms);
        sqlx::query(
            "INSERT INTO cache_entries (key, value, expires_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
        )
        .bind(key)
        .bind(value)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<bool, CacheError> {
        let result = sqlx::query("DELETE FROM cache_entries WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
        let purged = self.purge_expired().await?;
        if purged > 0 {
            debug!(purged, "Purged expired cache rows");
        }

        // substr() instead of LIKE: prefixes contain '_' which LIKE treats as a wildcard
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT key FROM cache_entries WHERE substr(key, 1, length(?1)) = ?1 AND expires_at > ?2",
        )
        .bind(prefix)
        .bind(now_millis())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(key,)| key).collect())
    }
}
