//! Cache store
//!
//! TTL key-value cache with type-namespaced eviction. One [`CacheService`]
//! is constructed at startup and shared by reference (`Arc<CacheService>`).
//!
//! # Backend selection
//! When `cache.backend_url` is configured the external backend is probed
//! once in [`CacheService::connect`]; if it cannot be reached the service
//! falls back to the in-process [`MemoryBackend`]. Callers cannot tell which
//! backend served a call.
//!
//! # Expiry
//! Every entry carries `cached_at` and its type's ttl. `get` re-checks the
//! entry age itself, so an entry is absent once `now - cached_at >= ttl`
//! even if the backend has not evicted it yet.
//!
//! # Failures
//! Backend errors never reach callers: `get` degrades to a miss,
//! `set`/`invalidate`/`clear_type` return `false`.

mod backend;
mod keys;

pub use backend::{CacheBackend, CacheError, MemoryBackend, SqlCacheBackend};
pub use keys::{canonical_params, derive_key, type_prefix};

use crate::config::CacheConfig;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Request parameters folded into a cache key
pub type CacheParams = BTreeMap<String, Value>;

/// Named cache namespaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheType {
    /// Finished content strategies
    Strategy,
    /// Integrated onboarding snapshots
    OnboardingIntegration,
    /// Field transformation engine output
    FieldTransformation,
    /// AI collaborator responses
    AiAnalysis,
    /// Data-quality assessments
    QualityAssessment,
}

impl CacheType {
    pub const ALL: [CacheType; 5] = [
        CacheType::Strategy,
        CacheType::OnboardingIntegration,
        CacheType::FieldTransformation,
        CacheType::AiAnalysis,
        CacheType::QualityAssessment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheType::Strategy => "strategy",
            CacheType::OnboardingIntegration => "onboarding_integration",
            CacheType::FieldTransformation => "field_transformation",
            CacheType::AiAnalysis => "ai_analysis",
            CacheType::QualityAssessment => "quality_assessment",
        }
    }

    /// Built-in ttl / size / priority
    pub fn default_config(&self) -> CacheTypeConfig {
        let (ttl_seconds, max_size, priority) = match self {
            CacheType::Strategy => (7200, 200, CachePriority::High),
            CacheType::OnboardingIntegration => (1800, 500, CachePriority::Medium),
            CacheType::FieldTransformation => (3600, 500, CachePriority::Medium),
            CacheType::AiAnalysis => (3600, 1000, CachePriority::High),
            CacheType::QualityAssessment => (1800, 500, CachePriority::Low),
        };
        CacheTypeConfig {
            ttl_seconds,
            max_size,
            priority,
        }
    }
}

impl fmt::Display for CacheType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CacheType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| crate::Error::InvalidInput(format!("Unknown cache type: {}", s)))
    }
}

/// Eviction priority label carried in stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CachePriority {
    High,
    Medium,
    Low,
}

/// Per-type cache settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheTypeConfig {
    pub ttl_seconds: u64,
    pub max_size: usize,
    #[serde(default = "default_priority")]
    pub priority: CachePriority,
}

fn default_priority() -> CachePriority {
    CachePriority::Medium
}

impl CacheTypeConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

/// Bookkeeping stored next to cached data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub cached_at: DateTime<Utc>,
    pub cache_type: CacheType,
    pub identifier: String,
    /// Seconds
    pub ttl: u64,
}

/// Stored cache entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: Value,
    pub metadata: CacheMetadata,
}

impl CacheEntry {
    /// Logically expired once `now - cached_at >= ttl`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let ttl_ms = (self.metadata.ttl as i64).saturating_mul(1000);
        (now - self.metadata.cached_at).num_milliseconds() >= ttl_ms
    }
}

/// Per-type counters
#[derive(Debug, Default)]
struct TypeCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    errors: AtomicU64,
    evictions: AtomicU64,
}

/// Statistics for one cache type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeStats {
    pub live_entries: usize,
    pub max_size: usize,
    pub ttl_seconds: u64,
    pub priority: CachePriority,
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub errors: u64,
    pub evictions: u64,
    pub hit_rate: f64,
}

/// Cache statistics snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub backend: String,
    pub types: BTreeMap<CacheType, TypeStats>,
}

/// Result of an optimization pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OptimizeReport {
    /// Entries removed per type (expired + evicted)
    pub removed: BTreeMap<CacheType, usize>,
}

impl OptimizeReport {
    pub fn total_removed(&self) -> usize {
        self.removed.values().sum()
    }
}

/// Cache service
pub struct CacheService {
    backend: Arc<dyn CacheBackend>,
    config: CacheConfig,
    counters: HashMap<CacheType, TypeCounters>,
    last_stamp: Mutex<DateTime<Utc>>,
}

impl CacheService {
    /// Build on an explicit backend
    pub fn new(backend: Arc<dyn CacheBackend>, config: CacheConfig) -> Self {
        let counters = CacheType::ALL
            .iter()
            .map(|t| (*t, TypeCounters::default()))
            .collect();
        Self {
            backend,
            config,
            counters,
            last_stamp: Mutex::new(DateTime::<Utc>::MIN_UTC),
        }
    }

    /// In-process cache
    pub fn in_memory(config: CacheConfig) -> Self {
        Self::new(Arc::new(MemoryBackend::new()), config)
    }

    /// Probe the configured external backend once, else fall back to memory
    pub async fn connect(config: CacheConfig) -> Self {
        let Some(url) = config.backend_url.clone() else {
            info!("No external cache configured, using in-process cache");
            return Self::in_memory(config);
        };

        let probe = async {
            let backend = SqlCacheBackend::connect(&url).await?;
            backend.ping().await?;
            Ok::<_, CacheError>(backend)
        };

        match probe.await {
            Ok(backend) => {
                info!("Using external cache backend at {}", url);
                Self::new(Arc::new(backend), config)
            }
            Err(e) => {
                warn!("External cache unreachable ({}), falling back to in-process cache", e);
                Self::in_memory(config)
            }
        }
    }

    /// Name of the backend serving calls
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Effective settings for a type
    pub fn type_config(&self, cache_type: CacheType) -> CacheTypeConfig {
        self.config.type_config(cache_type)
    }

    fn key(&self, cache_type: CacheType, identifier: &str, params: &CacheParams) -> String {
        derive_key(&self.config.key_prefix, cache_type, identifier, params)
    }

    fn counters(&self, cache_type: CacheType) -> &TypeCounters {
        // Every CacheType is inserted in new()
        &self.counters[&cache_type]
    }

    /// Strictly increasing `cached_at` so oldest-first eviction is total
    fn next_stamp(&self) -> DateTime<Utc> {
        let mut last = self.last_stamp.lock().unwrap_or_else(|e| e.into_inner());
        let mut stamp = Utc::now();
        if stamp <= *last {
            stamp = *last + ChronoDuration::nanoseconds(1);
        }
        *last = stamp;
        stamp
    }

    /// Fetch cached data; `None` on miss, expiry, or backend failure
    pub async fn get(&self, cache_type: CacheType, identifier: &str, params: &CacheParams) -> Option<Value> {
        let key = self.key(cache_type, identifier, params);
        let counters = self.counters(cache_type);

        let raw = match self.backend.get(&key).await {
            Ok(raw) => raw,
            Err(e) => {
                counters.errors.fetch_add(1, Ordering::Relaxed);
                error!(cache_type = %cache_type, identifier, "Cache get failed: {}", e);
                return None;
            }
        };

        let Some(raw) = raw else {
            counters.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                counters.errors.fetch_add(1, Ordering::Relaxed);
                warn!(cache_type = %cache_type, identifier, "Dropping unreadable cache entry: {}", e);
                if let Err(e) = self.backend.del(&key).await {
                    warn!(cache_type = %cache_type, "Failed to delete unreadable entry: {}", e);
                }
                return None;
            }
        };

        if entry.is_expired(Utc::now()) {
            counters.misses.fetch_add(1, Ordering::Relaxed);
            debug!(cache_type = %cache_type, identifier, "Cache entry expired");
            if let Err(e) = self.backend.del(&key).await {
                warn!(cache_type = %cache_type, "Failed to delete expired entry: {}", e);
            }
            return None;
        }

        counters.hits.fetch_add(1, Ordering::Relaxed);
        Some(entry.data)
    }

    /// Store data under the type's ttl; `false` on backend failure
    pub async fn set(&self, cache_type: CacheType, identifier: &str, data: Value, params: &CacheParams) -> bool {
        let key = self.key(cache_type, identifier, params);
        let type_config = self.type_config(cache_type);
        let counters = self.counters(cache_type);

        let entry = CacheEntry {
            data,
            metadata: CacheMetadata {
                cached_at: self.next_stamp(),
                cache_type,
                identifier: identifier.to_string(),
                ttl: type_config.ttl_seconds,
            },
        };

        let stored = match serde_json::to_string(&entry) {
            Ok(raw) => self
                .backend
                .set_ex(&key, &raw, type_config.ttl())
                .await,
            Err(e) => Err(CacheError::Serialization(e)),
        };

        if let Err(e) = stored {
            counters.errors.fetch_add(1, Ordering::Relaxed);
            error!(cache_type = %cache_type, identifier, "Cache set failed: {}", e);
            return false;
        }
        counters.sets.fetch_add(1, Ordering::Relaxed);

        // Keep the type within max_size as entries arrive
        if let Err(e) = self.enforce_max_size(cache_type).await {
            warn!(cache_type = %cache_type, "Eviction after set failed: {}", e);
        }
        true
    }

    /// Remove one entry; `false` on backend failure
    pub async fn invalidate(&self, cache_type: CacheType, identifier: &str, params: &CacheParams) -> bool {
        let key = self.key(cache_type, identifier, params);
        match self.backend.del(&key).await {
            Ok(existed) => {
                debug!(cache_type = %cache_type, identifier, existed, "Cache entry invalidated");
                true
            }
            Err(e) => {
                self.counters(cache_type).errors.fetch_add(1, Ordering::Relaxed);
                error!(cache_type = %cache_type, identifier, "Cache invalidate failed: {}", e);
                false
            }
        }
    }

    /// Remove every entry of a type; `false` on backend failure
    pub async fn clear_type(&self, cache_type: CacheType) -> bool {
        let prefix = type_prefix(&self.config.key_prefix, cache_type);
        let result = async {
            let keys = self.backend.keys(&prefix).await?;
            for key in &keys {
                self.backend.del(key).await?;
            }
            Ok::<_, CacheError>(keys.len())
        }
        .await;

        match result {
            Ok(count) => {
                info!(cache_type = %cache_type, count, "Cache type cleared");
                true
            }
            Err(e) => {
                self.counters(cache_type).errors.fetch_add(1, Ordering::Relaxed);
                error!(cache_type = %cache_type, "Cache clear failed: {}", e);
                false
            }
        }
    }

    /// Statistics for one type or all types
    pub async fn stats(&self, cache_type: Option<CacheType>) -> CacheStats {
        let selected: Vec<CacheType> = match cache_type {
            Some(t) => vec![t],
            None => CacheType::ALL.to_vec(),
        };

        let mut types = BTreeMap::new();
        for t in selected {
            let prefix = type_prefix(&self.config.key_prefix, t);
            let live_entries = match self.backend.keys(&prefix).await {
                Ok(keys) => keys.len(),
                Err(e) => {
                    warn!(cache_type = %t, "Cache stats key scan failed: {}", e);
                    0
                }
            };
            let config = self.type_config(t);
            let counters = self.counters(t);
            let hits = counters.hits.load(Ordering::Relaxed);
            let misses = counters.misses.load(Ordering::Relaxed);
            let lookups = hits + misses;

            types.insert(
                t,
                TypeStats {
                    live_entries,
                    max_size: config.max_size,
                    ttl_seconds: config.ttl_seconds,
                    priority: config.priority,
                    hits,
                    misses,
                    sets: counters.sets.load(Ordering::Relaxed),
                    errors: counters.errors.load(Ordering::Relaxed),
                    evictions: counters.evictions.load(Ordering::Relaxed),
                    hit_rate: if lookups == 0 { 0.0 } else { hits as f64 / lookups as f64 },
                },
            );
        }

        CacheStats {
            backend: self.backend.name().to_string(),
            types,
        }
    }

    /// Drop expired entries and trim every type to its max_size
    pub async fn optimize(&self) -> OptimizeReport {
        let mut report = OptimizeReport::default();
        for t in CacheType::ALL {
            match self.evict_type(t).await {
                Ok(removed) => {
                    report.removed.insert(t, removed);
                }
                Err(e) => {
                    self.counters(t).errors.fetch_add(1, Ordering::Relaxed);
                    error!(cache_type = %t, "Cache optimization failed: {}", e);
                }
            }
        }
        info!(removed = report.total_removed(), "Cache optimization complete");
        report
    }

    async fn enforce_max_size(&self, cache_type: CacheType) -> Result<usize, CacheError> {
        let prefix = type_prefix(&self.config.key_prefix, cache_type);
        let key_count = self.backend.keys(&prefix).await?.len();
        if key_count <= self.type_config(cache_type).max_size {
            return Ok(0);
        }
        self.evict_type(cache_type).await
    }

    /// Remove expired entries, then oldest-by-`cached_at` until count == max_size
    async fn evict_type(&self, cache_type: CacheType) -> Result<usize, CacheError> {
        let prefix = type_prefix(&self.config.key_prefix, cache_type);
        let max_size = self.type_config(cache_type).max_size;
        let now = Utc::now();
        let mut removed = 0;

        let mut live: Vec<(DateTime<Utc>, String)> = Vec::new();
        for key in self.backend.keys(&prefix).await? {
            let Some(raw) = self.backend.get(&key).await? else {
                continue;
            };
            match serde_json::from_str::<CacheEntry>(&raw) {
                Ok(entry) if !entry.is_expired(now) => live.push((entry.metadata.cached_at, key)),
                _ => {
                    if self.backend.del(&key).await? {
                        removed += 1;
                    }
                }
            }
        }

        if live.len() > max_size {
            live.sort();
            let excess = live.len() - max_size;
            for (_, key) in live.iter().take(excess) {
                if self.backend.del(key).await? {
                    removed += 1;
                }
            }
            self.counters(cache_type)
                .evictions
                .fetch_add(excess as u64, Ordering::Relaxed);
            debug!(cache_type = %cache_type, evicted = excess, max_size, "Evicted oldest cache entries");
        }

        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Typed helpers
    // ------------------------------------------------------------------

    /// Serialize and store a typed value
    pub async fn set_typed<T: Serialize>(&self, cache_type: CacheType, identifier: &str, data: &T) -> bool {
        match serde_json::to_value(data) {
            Ok(value) => self.set(cache_type, identifier, value, &CacheParams::new()).await,
            Err(e) => {
                self.counters(cache_type).errors.fetch_add(1, Ordering::Relaxed);
                error!(cache_type = %cache_type, identifier, "Cache value not serializable: {}", e);
                false
            }
        }
    }

    /// Fetch and deserialize a typed value; shape mismatches count as a miss
    pub async fn get_typed<T: DeserializeOwned>(&self, cache_type: CacheType, identifier: &str) -> Option<T> {
        let value = self.get(cache_type, identifier, &CacheParams::new()).await?;
        match serde_json::from_value(value) {
            Ok(data) => Some(data),
            Err(e) => {
                warn!(cache_type = %cache_type, identifier, "Cached value has unexpected shape: {}", e);
                None
            }
        }
    }

    pub async fn cache_strategy<T: Serialize>(&self, strategy_id: &str, strategy: &T) -> bool {
        self.set_typed(CacheType::Strategy, strategy_id, strategy).await
    }

    pub async fn get_cached_strategy<T: DeserializeOwned>(&self, strategy_id: &str) -> Option<T> {
        self.get_typed(CacheType::Strategy, strategy_id).await
    }

    pub async fn invalidate_strategy(&self, strategy_id: &str) -> bool {
        self.invalidate(CacheType::Strategy, strategy_id, &CacheParams::new()).await
    }

    pub async fn cache_onboarding_data<T: Serialize>(&self, user_id: i64, data: &T) -> bool {
        self.set_typed(CacheType::OnboardingIntegration, &user_id.to_string(), data).await
    }

    pub async fn get_cached_onboarding_data<T: DeserializeOwned>(&self, user_id: i64) -> Option<T> {
        self.get_typed(CacheType::OnboardingIntegration, &user_id.to_string()).await
    }
}
