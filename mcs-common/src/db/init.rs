//! Database initialization
//!
//! Creates the SQLite database on first run and brings every table into
//! existence idempotently (`CREATE TABLE IF NOT EXISTS`), so repeated
//! startup against an existing file is safe.
//!
//! JSON-valued columns are stored as TEXT; timestamps as RFC 3339 TEXT.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Open (creating if needed) the database file and create all tables
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL lets readers proceed while one writer is active
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_all_tables(&pool).await?;

    Ok(pool)
}

/// Single-connection in-memory database with all tables (tests, dry runs)
///
/// Each SQLite `:memory:` connection is its own database, so the pool is
/// pinned to one connection that is never recycled.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    create_all_tables(&pool).await?;

    Ok(pool)
}

/// Create every table used by the workspace
pub async fn create_all_tables(pool: &SqlitePool) -> Result<()> {
    // Onboarding sources
    create_website_analyses_table(pool).await?;
    create_research_preferences_table(pool).await?;
    create_api_keys_table(pool).await?;
    create_onboarding_sessions_table(pool).await?;

    // Derived data
    create_onboarding_integrations_table(pool).await?;
    create_content_strategies_table(pool).await?;

    // Shared cache backend
    create_cache_entries_table(pool).await?;

    Ok(())
}

pub async fn create_website_analyses_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS website_analyses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            website_url TEXT,
            domain TEXT,
            industry TEXT,
            business_type TEXT,
            target_audience TEXT,
            content_goals TEXT,
            writing_style TEXT,
            content_characteristics TEXT,
            content_type TEXT,
            competitive_analysis TEXT,
            performance_metrics TEXT,
            traffic_sources TEXT,
            recommended_settings TEXT,
            status TEXT NOT NULL DEFAULT 'pending',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_website_analyses_user ON website_analyses(user_id, updated_at)")
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn create_research_preferences_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS research_preferences (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            research_depth TEXT,
            content_types TEXT,
            auto_research INTEGER,
            factual_content INTEGER,
            target_audience TEXT,
            research_topics TEXT,
            content_frequency TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_research_preferences_user ON research_preferences(user_id, updated_at)")
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn create_api_keys_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS api_keys (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            provider TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            last_used TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_api_keys_user ON api_keys(user_id)")
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn create_onboarding_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS onboarding_sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            current_step INTEGER NOT NULL DEFAULT 1,
            progress REAL NOT NULL DEFAULT 0.0,
            business_size TEXT,
            budget REAL,
            team_size INTEGER,
            timeline TEXT,
            started_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_onboarding_sessions_user ON onboarding_sessions(user_id, updated_at)")
        .execute(pool)
        .await?;

    Ok(())
}

/// One integrated snapshot per user (upsert by `user_id`)
pub async fn create_onboarding_integrations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS onboarding_integrations (
            user_id INTEGER PRIMARY KEY,
            website_analysis_data TEXT NOT NULL DEFAULT '{}',
            research_preferences_data TEXT NOT NULL DEFAULT '{}',
            api_keys_data TEXT NOT NULL DEFAULT '{}',
            onboarding_session_data TEXT NOT NULL DEFAULT '{}',
            data_quality TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_content_strategies_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS content_strategies (
            id TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            payload TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_content_strategies_user ON content_strategies(user_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Key-value table for the shared cache backend (`expires_at` in Unix millis)
pub async fn create_cache_entries_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cache_entries (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            expires_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_cache_entries_expires_at ON cache_entries(expires_at)")
        .execute(pool)
        .await?;

    Ok(())
}
