//! # MCS Common Library
//!
//! Shared code for the marketing content strategy services including:
//! - Error types
//! - Bootstrap configuration loading (TOML + environment)
//! - Timestamp and freshness utilities
//! - Database initialization
//! - Cache store (TTL, type-namespaced eviction, pluggable backends)

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use cache::{CacheService, CacheType};
pub use error::{Error, Result};
