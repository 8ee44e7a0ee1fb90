//! `collect` command: run the sentiment pipeline over the stock universe.
//!
//! Per-stock failures are logged and skipped so one bad ticker does not
//! abort the run; the command fails only when every stock fails.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tickerpulse_cache::{CacheError, DailyCache, SentimentSummary, SnapshotProvider};
use tickerpulse_core::{AppConfig, StockConfig, StocksFile};
use tickerpulse_fetch::RateLimitedFetcher;
use tickerpulse_sentiment::{
    RedditSource, RetrievalSource, RssSource, SentimentPipeline, TickerNewsSource, TickerSnapshot,
    TwitterSource, WebSearchSource,
};

use crate::report::{write_report, ReportRow};

/// Stocks to process: the one matching `symbol_filter`, or all of them.
///
/// # Errors
///
/// Returns an error if `symbol_filter` names a stock not in the universe.
pub(crate) fn select_stocks(
    universe: &StocksFile,
    symbol_filter: Option<&str>,
) -> anyhow::Result<Vec<StockConfig>> {
    match symbol_filter {
        Some(symbol) => {
            let stock = universe
                .find(symbol)
                .ok_or_else(|| anyhow::anyhow!("stock '{symbol}' not found in the stock universe"))?;
            Ok(vec![stock.clone()])
        }
        None => Ok(universe.stocks.clone()),
    }
}

/// Sources shared by every stock in the run, in the order they are consulted.
///
/// RSS feeds are limited to items published on `today` (UTC). A Reddit or
/// Twitter source that cannot be constructed is logged and left out.
pub(crate) async fn shared_sources(
    universe: &StocksFile,
    config: &AppConfig,
    today: NaiveDate,
) -> Vec<Arc<dyn RetrievalSource>> {
    let mut sources: Vec<Arc<dyn RetrievalSource>> = Vec::new();

    for feed in &universe.feeds {
        sources.push(Arc::new(RssSource::new(feed).published_on(today)));
    }
    for domain in &universe.search_domains {
        let source = match config.search_url.as_deref() {
            Some(url) => WebSearchSource::new(domain).with_search_url(url),
            None => WebSearchSource::new(domain),
        };
        sources.push(Arc::new(source));
    }

    match RedditSource::connect(config.reddit.as_ref()).await {
        Ok(reddit) => sources.push(Arc::new(reddit)),
        Err(e) => tracing::warn!(error = %e, "reddit source unavailable; continuing without it"),
    }

    match TwitterSource::new(config.twitter_bearer_token.as_deref()) {
        Ok(twitter) => sources.push(Arc::new(twitter)),
        Err(e) => tracing::warn!(error = %e, "twitter source unavailable; continuing without it"),
    }

    sources
}

/// Fetches a [`TickerSnapshot`] through the run's fetcher on a cache miss.
struct HeadlineSnapshotProvider<'a> {
    stock: &'a StockConfig,
    fetcher: &'a mut RateLimitedFetcher,
}

#[async_trait]
impl<'a> SnapshotProvider for HeadlineSnapshotProvider<'a> {
    async fn fetch_snapshot(&mut self, _symbol: &str) -> Result<serde_json::Value, CacheError> {
        let snapshot = TickerSnapshot::fetch(self.stock, self.fetcher)
            .await
            .map_err(|e| CacheError::Provider(e.to_string()))?;
        Ok(serde_json::to_value(snapshot)?)
    }
}

/// Today's snapshot for `stock` and whether it came from the cache.
///
/// A snapshot that cannot be fetched is stored with no headlines so the
/// day's record (and its sentiment summary) still exists; the ticker news
/// source is skipped until the next day. Cache I/O failures are errors.
async fn load_snapshot(
    cache: &DailyCache,
    fetcher: &mut RateLimitedFetcher,
    stock: &StockConfig,
) -> anyhow::Result<(Option<TickerSnapshot>, bool)> {
    let mut provider = HeadlineSnapshotProvider { stock, fetcher };

    match cache.get_or_fetch(&stock.symbol, &mut provider).await {
        Ok(entry) => match TickerSnapshot::from_value(&entry.snapshot) {
            Ok(snapshot) => Ok((Some(snapshot), entry.cached)),
            Err(e) => {
                tracing::warn!(
                    symbol = %stock.symbol,
                    error = %e,
                    "cached snapshot has an unexpected shape; skipping ticker news"
                );
                Ok((None, entry.cached))
            }
        },
        Err(CacheError::Provider(reason)) => {
            tracing::warn!(
                symbol = %stock.symbol,
                error = %reason,
                "ticker snapshot unavailable; storing it without headlines"
            );
            let empty = TickerSnapshot {
                symbol: stock.symbol.clone(),
                company_name: stock.company_name.clone(),
                news: Vec::new(),
            };
            cache.put(&stock.symbol, &serde_json::to_value(&empty)?).await?;
            Ok((None, false))
        }
        Err(e) => Err(e.into()),
    }
}

/// Collect, aggregate and persist sentiment for one stock.
///
/// # Errors
///
/// Returns an error only when the cache cannot be read or written.
pub(crate) async fn collect_stock(
    cache: &DailyCache,
    pipeline: &mut SentimentPipeline,
    stock: &StockConfig,
    shared: &[Arc<dyn RetrievalSource>],
) -> anyhow::Result<ReportRow> {
    let (snapshot, cached) = load_snapshot(cache, pipeline.fetcher_mut(), stock).await?;

    let mut sources: Vec<Box<dyn RetrievalSource>> = Vec::with_capacity(shared.len() + 1);
    if let Some(snapshot) = &snapshot {
        sources.push(Box::new(TickerNewsSource::from_snapshot(snapshot)));
    }
    sources.extend(
        shared
            .iter()
            .map(|s| Box::new(Arc::clone(s)) as Box<dyn RetrievalSource>),
    );

    let result = pipeline.run_stock_sentiment(stock, &sources).await;

    for notice in &result.interventions {
        tracing::warn!(
            symbol = %stock.symbol,
            source = %notice.source,
            url = %notice.url,
            reason = %notice.reason,
            "manual intervention required; source skipped for this run"
        );
    }

    let summary = SentimentSummary {
        count: result.count,
        average: result.average,
    };
    if !cache.update_sentiment(&stock.symbol, summary).await? {
        tracing::warn!(
            symbol = %stock.symbol,
            "no cache record for today; sentiment summary not persisted"
        );
    }

    Ok(ReportRow::from_result(&result, cached))
}

fn enabled(on: bool) -> &'static str {
    if on {
        "enabled"
    } else {
        "disabled"
    }
}

/// Run sentiment collection for all (or one) stock(s) and write the CSV report.
///
/// When `dry_run` is `true`, prints the plan and returns without touching
/// the network or the cache.
///
/// # Errors
///
/// Returns an error if the universe cannot be loaded, the symbol filter
/// matches nothing, the pipeline or cache cannot be set up, the report
/// cannot be written, or every stock fails.
pub(crate) async fn run_collect(
    config: &AppConfig,
    symbol_filter: Option<&str>,
    dry_run: bool,
    report_path: Option<&Path>,
) -> anyhow::Result<()> {
    let universe = tickerpulse_core::load_stocks(&config.stocks_path)?;
    let stocks = select_stocks(&universe, symbol_filter)?;

    if stocks.is_empty() {
        println!("no stocks configured in {}", config.stocks_path.display());
        return Ok(());
    }

    if dry_run {
        let symbols: Vec<&str> = stocks.iter().map(|s| s.symbol.as_str()).collect();
        println!(
            "dry-run: would collect sentiment for {} stocks: [{}]",
            stocks.len(),
            symbols.join(", ")
        );
        println!(
            "dry-run: sources: ticker news, {} feeds, {} search domains, reddit {}, twitter {}",
            universe.feeds.len(),
            universe.search_domains.len(),
            enabled(config.reddit.is_some()),
            enabled(config.twitter_bearer_token.is_some()),
        );
        return Ok(());
    }

    let pool = tickerpulse_cache::open(&config.database_url).await?;
    let cache = DailyCache::new(pool);
    let mut pipeline = SentimentPipeline::from_config(config)?;
    let shared = shared_sources(&universe, config, Utc::now().date_naive()).await;

    let mut rows = Vec::with_capacity(stocks.len());
    let mut failed_stocks: usize = 0;

    for stock in &stocks {
        match collect_stock(&cache, &mut pipeline, stock, &shared).await {
            Ok(row) => {
                tracing::info!(
                    symbol = %row.symbol,
                    count = row.sentiment_count,
                    average = row.average_sentiment,
                    cached = row.cached,
                    "sentiment recorded"
                );
                rows.push(row);
            }
            Err(e) => {
                tracing::error!(symbol = %stock.symbol, error = %e, "sentiment collection failed");
                failed_stocks += 1;
            }
        }
    }

    if failed_stocks > 0 {
        tracing::warn!(
            failed_stocks,
            total_stocks = stocks.len(),
            "some stocks failed during sentiment collection"
        );
    }

    if failed_stocks == stocks.len() {
        anyhow::bail!("all {failed_stocks} stocks failed sentiment collection");
    }

    match report_path {
        Some(path) => {
            let file = std::fs::File::create(path)
                .map_err(|e| anyhow::anyhow!("failed to create report {}: {e}", path.display()))?;
            write_report(file, &rows)?;
            println!(
                "sentiment collection complete: {} stocks processed, report written to {}",
                rows.len(),
                path.display()
            );
        }
        None => write_report(std::io::stdout().lock(), &rows)?,
    }

    Ok(())
}

#[cfg(test)]
#[path = "collect_test.rs"]
mod tests;
