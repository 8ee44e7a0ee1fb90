use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tickerpulse_cache::FixedClock;
use tickerpulse_core::{build_app_config, AggregationMode};
use tickerpulse_fetch::{FetchError, PageFetcher};
use tickerpulse_sentiment::{
    headline_feed_url, ArticleAssembler, LexiconScorer, RelevanceFilter, TextChunker,
};

use super::*;

const ARTICLE_URL: &str = "https://finance.yahoo.com/news/nvidia-record-quarter.html";

/// In-memory pages keyed by URL, counting every request.
#[derive(Clone, Default)]
struct MapPages {
    pages: HashMap<String, String>,
    calls: Arc<AtomicUsize>,
}

impl MapPages {
    fn with_page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }
}

#[async_trait]
impl PageFetcher for MapPages {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                url: url.to_string(),
            })
    }
}

fn nvda() -> StockConfig {
    StockConfig::new("NVDA", "NVIDIA Corporation")
}

fn universe() -> StocksFile {
    StocksFile {
        stocks: vec![nvda(), StockConfig::new("AAPL", "Apple Inc.")],
        feeds: vec!["https://feeds.marketwatch.com/marketwatch/topstories/".to_string()],
        search_domains: vec!["fool.com".to_string()],
    }
}

fn headlines() -> String {
    format!(
        r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <item>
    <title>Nvidia posts record quarter</title>
    <link>{ARTICLE_URL}</link>
    <pubDate>Wed, 15 Oct 2025 12:00:00 +0000</pubDate>
  </item>
</channel></rss>"#
    )
}

fn pipeline(pages: MapPages) -> SentimentPipeline {
    let assembler = ArticleAssembler::new(
        TextChunker::new(512),
        RelevanceFilter::keyword_only(),
        Box::new(LexiconScorer),
        512,
    );
    SentimentPipeline::new(RateLimitedFetcher::new(pages, 0), assembler, AggregationMode::Mean)
}

async fn cache() -> DailyCache {
    let pool = tickerpulse_cache::open("sqlite::memory:")
        .await
        .expect("open in-memory cache");
    DailyCache::with_clock(
        pool,
        FixedClock(NaiveDate::from_ymd_opt(2025, 10, 15).expect("valid date")),
    )
}

#[test]
fn select_stocks_defaults_to_whole_universe() {
    let stocks = select_stocks(&universe(), None).unwrap();
    let symbols: Vec<&str> = stocks.iter().map(|s| s.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["NVDA", "AAPL"]);
}

#[test]
fn select_stocks_filters_case_insensitively() {
    let stocks = select_stocks(&universe(), Some("aapl")).unwrap();
    assert_eq!(stocks, vec![StockConfig::new("AAPL", "Apple Inc.")]);
}

#[test]
fn select_stocks_rejects_unknown_symbol() {
    let err = select_stocks(&universe(), Some("TSLA")).unwrap_err();
    assert!(err.to_string().contains("TSLA"), "got: {err}");
}

#[tokio::test]
async fn shared_sources_follow_config_order_without_reddit() {
    let config = build_app_config(|_| Err(std::env::VarError::NotPresent)).expect("defaults");
    let sources = shared_sources(
        &universe(),
        &config,
        NaiveDate::from_ymd_opt(2025, 10, 15).expect("valid date"),
    )
    .await;
    let names: Vec<&str> = sources.iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["rss:feeds.marketwatch.com", "web:fool.com"]);
}

#[tokio::test]
async fn shared_sources_append_twitter_when_token_is_set() {
    let config = build_app_config(|key| match key {
        "TWITTER_BEARER_TOKEN" => Ok("tok".to_string()),
        _ => Err(std::env::VarError::NotPresent),
    })
    .expect("config");
    let sources = shared_sources(
        &universe(),
        &config,
        NaiveDate::from_ymd_opt(2025, 10, 15).expect("valid date"),
    )
    .await;
    let names: Vec<&str> = sources.iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["rss:feeds.marketwatch.com", "web:fool.com", "twitter"]);
}

#[tokio::test]
async fn collect_stock_scores_snapshot_news_and_persists_summary() {
    let pages = MapPages::default()
        .with_page(&headline_feed_url("NVDA"), &headlines())
        .with_page(
            ARTICLE_URL,
            "<html><body><p>NVIDIA beat estimates.</p><p>Shares rose after the call.</p></body></html>",
        );
    let calls = Arc::clone(&pages.calls);
    let mut pipeline = pipeline(pages);
    let cache = cache().await;

    let row = collect_stock(&cache, &mut pipeline, &nvda(), &[]).await.unwrap();
    assert_eq!(row.symbol, "NVDA");
    assert_eq!(row.sentiment_count, 1);
    assert!(row.average_sentiment > 0.0, "got {}", row.average_sentiment);
    assert!(!row.cached);

    let record = cache.record("NVDA").await.unwrap().expect("record stored");
    let summary = record.sentiment.expect("sentiment persisted");
    assert_eq!(summary.count, 1);
    assert!((summary.average - row.average_sentiment).abs() < f64::EPSILON);

    let again = collect_stock(&cache, &mut pipeline, &nvda(), &[]).await.unwrap();
    assert!(again.cached);
    assert_eq!(again.sentiment_count, 1);
    // Both pages were served from the run cache on the second pass.
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn missing_snapshot_still_persists_summary() {
    let mut pipeline = pipeline(MapPages::default());
    let cache = cache().await;

    let row = collect_stock(&cache, &mut pipeline, &nvda(), &[]).await.unwrap();
    assert_eq!(row.sentiment_count, 0);
    assert!((row.average_sentiment - 0.0).abs() < f64::EPSILON);
    assert!(!row.cached);

    let record = cache.record("NVDA").await.unwrap().expect("record stored");
    assert_eq!(record.snapshot["news"], serde_json::json!([]));
    let summary = record.sentiment.expect("sentiment persisted");
    assert_eq!(summary.count, 0);

    let again = collect_stock(&cache, &mut pipeline, &nvda(), &[]).await.unwrap();
    assert!(again.cached);
}

#[tokio::test]
async fn dry_run_touches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let stocks_path = dir.path().join("stocks.yaml");
    std::fs::write(
        &stocks_path,
        "stocks:\n  - symbol: nvda\n    company_name: NVIDIA Corporation\n",
    )
    .unwrap();
    let db_path = dir.path().join("cache.db");

    let stocks = stocks_path.display().to_string();
    let database = format!("sqlite://{}", db_path.display());
    let config = build_app_config(|key| match key {
        "TICKERPULSE_STOCKS_PATH" => Ok(stocks.clone()),
        "TICKERPULSE_DATABASE_URL" => Ok(database.clone()),
        _ => Err(std::env::VarError::NotPresent),
    })
    .expect("config");

    run_collect(&config, Some("NVDA"), true, None).await.unwrap();
    assert!(!db_path.exists());
}
