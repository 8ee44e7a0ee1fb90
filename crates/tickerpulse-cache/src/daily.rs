//! Operations on the `ticker_cache` table.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::SqlitePool;

use crate::clock::{Clock, SystemClock};
use crate::CacheError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Sentiment figures attached to a day's record after a collection run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentSummary {
    pub count: usize,
    pub average: f64,
}

/// Shape of the `data` column.
#[derive(Debug, Serialize, Deserialize)]
struct Payload {
    snapshot: Value,
    #[serde(default)]
    sentiment: Option<SentimentSummary>,
}

#[derive(Debug, sqlx::FromRow)]
struct CacheRow {
    symbol: String,
    date: String,
    data: String,
}

/// A decoded `ticker_cache` row.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRecord {
    pub symbol: String,
    pub date: NaiveDate,
    pub snapshot: Value,
    pub sentiment: Option<SentimentSummary>,
}

impl TryFrom<CacheRow> for CacheRecord {
    type Error = CacheError;

    fn try_from(row: CacheRow) -> Result<Self, Self::Error> {
        let date = NaiveDate::parse_from_str(&row.date, DATE_FORMAT).map_err(|e| {
            CacheError::Sqlx(sqlx::Error::Decode(
                format!("bad cache date '{}': {e}", row.date).into(),
            ))
        })?;
        let payload: Payload = serde_json::from_str(&row.data)?;
        Ok(Self {
            symbol: row.symbol,
            date,
            snapshot: payload.snapshot,
            sentiment: payload.sentiment,
        })
    }
}

/// Produces a fresh snapshot when the cache has none for today.
#[async_trait]
pub trait SnapshotProvider: Send {
    /// # Errors
    ///
    /// Implementations map their failures to [`CacheError::Provider`].
    async fn fetch_snapshot(&mut self, symbol: &str) -> Result<Value, CacheError>;
}

/// Result of [`DailyCache::get_or_fetch`].
#[derive(Debug, Clone, PartialEq)]
pub struct CachedSnapshot {
    pub snapshot: Value,
    /// `true` when the snapshot was already stored for today.
    pub cached: bool,
}

/// One snapshot per `(symbol, day)`. Records from earlier days are never
/// returned by [`DailyCache::get`].
///
/// Assumes a single writer.
pub struct DailyCache {
    pool: SqlitePool,
    clock: Box<dyn Clock>,
}

impl std::fmt::Debug for DailyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DailyCache")
            .field("today", &self.today())
            .finish_non_exhaustive()
    }
}

fn normalize(symbol: &str) -> String {
    symbol.trim().to_ascii_uppercase()
}

impl DailyCache {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_clock(pool, SystemClock)
    }

    #[must_use]
    pub fn with_clock(pool: SqlitePool, clock: impl Clock + 'static) -> Self {
        Self {
            pool,
            clock: Box::new(clock),
        }
    }

    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    fn today_key(&self) -> String {
        self.today().format(DATE_FORMAT).to_string()
    }

    async fn fetch_row(&self, symbol: &str) -> Result<Option<CacheRow>, CacheError> {
        let row = sqlx::query_as::<_, CacheRow>(
            "SELECT symbol, date, data FROM ticker_cache WHERE symbol = ?1 AND date = ?2",
        )
        .bind(normalize(symbol))
        .bind(self.today_key())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Today's record for `symbol`, including any sentiment summary.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the query fails or the stored payload is corrupt.
    pub async fn record(&self, symbol: &str) -> Result<Option<CacheRecord>, CacheError> {
        self.fetch_row(symbol)
            .await?
            .map(CacheRecord::try_from)
            .transpose()
    }

    /// Every record stored for today, ordered by symbol.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the query fails or a stored payload is corrupt.
    pub async fn records_for_today(&self) -> Result<Vec<CacheRecord>, CacheError> {
        let rows = sqlx::query_as::<_, CacheRow>(
            "SELECT symbol, date, data FROM ticker_cache WHERE date = ?1 ORDER BY symbol",
        )
        .bind(self.today_key())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(CacheRecord::try_from).collect()
    }

    /// Today's snapshot for `symbol`, if one was stored.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the query fails or the stored payload is corrupt.
    pub async fn get(&self, symbol: &str) -> Result<Option<Value>, CacheError> {
        Ok(self.record(symbol).await?.map(|r| r.snapshot))
    }

    /// Store today's snapshot for `symbol`, replacing any earlier one from
    /// today along with its sentiment summary.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if serialization or the write fails.
    pub async fn put(&self, symbol: &str, snapshot: &Value) -> Result<(), CacheError> {
        let data = serde_json::to_string(&Payload {
            snapshot: snapshot.clone(),
            sentiment: None,
        })?;
        sqlx::query("INSERT OR REPLACE INTO ticker_cache (symbol, date, data) VALUES (?1, ?2, ?3)")
            .bind(normalize(symbol))
            .bind(self.today_key())
            .bind(data)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Attach `summary` to today's record for `symbol`, replacing any earlier
    /// summary. Returns `false` without writing when there is no record for
    /// today.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the read, the payload decode, or the write fails.
    pub async fn update_sentiment(
        &self,
        symbol: &str,
        summary: SentimentSummary,
    ) -> Result<bool, CacheError> {
        let Some(row) = self.fetch_row(symbol).await? else {
            return Ok(false);
        };

        let mut payload: Payload = serde_json::from_str(&row.data)?;
        payload.sentiment = Some(summary);
        let data = serde_json::to_string(&payload)?;

        sqlx::query("UPDATE ticker_cache SET data = ?1 WHERE symbol = ?2 AND date = ?3")
            .bind(data)
            .bind(row.symbol)
            .bind(row.date)
            .execute(&self.pool)
            .await?;
        Ok(true)
    }

    /// Today's snapshot from the cache, or a fresh one from `provider` that is
    /// then stored.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the cache cannot be read or written, or the
    /// provider fails.
    pub async fn get_or_fetch<P>(
        &self,
        symbol: &str,
        provider: &mut P,
    ) -> Result<CachedSnapshot, CacheError>
    where
        P: SnapshotProvider + ?Sized,
    {
        if let Some(snapshot) = self.get(symbol).await? {
            tracing::debug!(symbol, date = %self.today(), "snapshot cache hit");
            return Ok(CachedSnapshot {
                snapshot,
                cached: true,
            });
        }

        tracing::debug!(symbol, date = %self.today(), "snapshot cache miss");
        let snapshot = provider.fetch_snapshot(symbol).await?;
        self.put(symbol, &snapshot).await?;
        Ok(CachedSnapshot {
            snapshot,
            cached: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_without_sentiment_decodes() {
        let payload: Payload = serde_json::from_str(r#"{"snapshot": {"symbol": "NVDA"}}"#).unwrap();
        assert!(payload.sentiment.is_none());
        assert_eq!(payload.snapshot["symbol"], "NVDA");
    }

    #[test]
    fn row_with_bad_date_is_rejected() {
        let row = CacheRow {
            symbol: "NVDA".to_string(),
            date: "yesterday".to_string(),
            data: r#"{"snapshot": null}"#.to_string(),
        };
        assert!(matches!(CacheRecord::try_from(row), Err(CacheError::Sqlx(_))));
    }

    #[test]
    fn symbols_are_normalized() {
        assert_eq!(normalize(" nvda "), "NVDA");
    }
}
