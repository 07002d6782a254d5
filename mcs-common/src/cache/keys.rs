//! Cache key derivation
//!
//! Storage key format: `{prefix}:{cache_type}:{sha256}` where the digest
//! covers `cache_type:identifier[:canonical_params]`. The cache type stays
//! readable in the key so a whole type can be scanned or cleared by prefix.

use super::{CacheParams, CacheType};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Derive the storage key for one cache entry
pub fn derive_key(prefix: &str, cache_type: CacheType, identifier: &str, params: &CacheParams) -> String {
    let mut material = format!("{}:{}", cache_type.as_str(), identifier);
    if !params.is_empty() {
        material.push(':');
        material.push_str(&canonical_params(params));
    }

    let digest = Sha256::digest(material.as_bytes());
    format!("{}{:x}", type_prefix(prefix, cache_type), digest)
}

/// Key prefix shared by every entry of one cache type
pub fn type_prefix(prefix: &str, cache_type: CacheType) -> String {
    format!("{}:{}:", prefix, cache_type.as_str())
}

/// Canonical JSON for request parameters: keys sorted at every depth
pub fn canonical_params(params: &CacheParams) -> String {
    let object: Map<String, Value> = params
        .iter()
        .map(|(k, v)| (k.clone(), canonicalize(v)))
        .collect();
    Value::Object(object).to_string()
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
