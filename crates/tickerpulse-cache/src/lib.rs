//! Per-day ticker snapshot cache backed by SQLite.

mod clock;
mod daily;

use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;

pub use clock::{Clock, FixedClock, SystemClock};
pub use daily::{CacheRecord, CachedSnapshot, DailyCache, SentimentSummary, SnapshotProvider};

const DEFAULT_MAX_CONNECTIONS: u32 = 4;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// Path relative to crates/tickerpulse-cache/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("cached payload is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("snapshot provider failed: {0}")]
    Provider(String),
}

/// Open a SQLite pool, creating the database file if it does not exist.
///
/// In-memory URLs get a single long-lived connection, since every SQLite
/// connection to `:memory:` sees its own database.
///
/// # Errors
///
/// Returns [`CacheError::Sqlx`] if the URL is malformed or the connection
/// cannot be established.
pub async fn connect(database_url: &str) -> Result<SqlitePool, CacheError> {
    let options: SqliteConnectOptions = database_url.parse()?;
    let options = options.create_if_missing(true);

    let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(DEFAULT_MAX_CONNECTIONS)
    };

    let pool = pool_options
        .acquire_timeout(Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS))
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Run all pending migrations against the pool.
///
/// Returns the number of migrations that were applied.
///
/// # Errors
///
/// Returns [`CacheError::Migration`] if any migration fails.
pub async fn run_migrations(pool: &SqlitePool) -> Result<usize, CacheError> {
    // _sqlx_migrations does not exist on a fresh database; treat that as zero applied.
    let applied_before = applied_migrations(pool).await;
    MIGRATOR.run(pool).await?;
    let applied_after = applied_migrations(pool).await;

    let delta = (applied_after - applied_before).max(0);
    Ok(usize::try_from(delta).unwrap_or(0))
}

async fn applied_migrations(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
        .fetch_one(pool)
        .await
        .unwrap_or(0)
}

/// Send a `SELECT 1` to verify the pool has a live connection.
///
/// # Errors
///
/// Returns [`CacheError::Sqlx`] if the query fails.
pub async fn ping(pool: &SqlitePool) -> Result<(), CacheError> {
    sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}

/// Connect and migrate in one step.
///
/// # Errors
///
/// Returns [`CacheError`] if either the connection or a migration fails.
pub async fn open(database_url: &str) -> Result<SqlitePool, CacheError> {
    let pool = connect(database_url).await?;
    let applied = run_migrations(&pool).await?;
    if applied > 0 {
        tracing::info!(applied, "applied cache migrations");
    }
    Ok(pool)
}
