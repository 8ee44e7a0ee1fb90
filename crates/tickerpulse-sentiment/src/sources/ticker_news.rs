//! Per-ticker headline list: the daily snapshot fetch and the source that
//! replays its news items.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use tickerpulse_core::StockConfig;
use tickerpulse_fetch::RateLimitedFetcher;

use super::rss_helpers::parse_feed;
use super::RetrievalSource;
use crate::article::Candidate;
use crate::error::SentimentError;

/// Yahoo Finance per-symbol headline feed.
pub const HEADLINE_FEED_URL: &str = "https://feeds.finance.yahoo.com/rss/2.0/headline";

const MAX_HEADLINES: usize = 50;

/// A headline attached to a ticker snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    /// RFC 3339 publication time, when the feed supplied one.
    #[serde(default)]
    pub published: Option<String>,
}

/// The per-day data blob cached for a ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerSnapshot {
    pub symbol: String,
    pub company_name: String,
    #[serde(default)]
    pub news: Vec<NewsItem>,
}

#[must_use]
pub fn headline_feed_url(symbol: &str) -> String {
    let encoded = utf8_percent_encode(symbol, NON_ALPHANUMERIC);
    format!("{HEADLINE_FEED_URL}?s={encoded}&region=US&lang=en-US")
}

impl TickerSnapshot {
    /// Download the headline list for `stock` through the run's fetcher.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Fetch`] when the feed cannot be retrieved or
    /// [`SentimentError::Xml`] when it does not parse.
    pub async fn fetch(
        stock: &StockConfig,
        fetcher: &mut RateLimitedFetcher,
    ) -> Result<Self, SentimentError> {
        let body = fetcher.fetch(&headline_feed_url(&stock.symbol)).await?;
        let news = parse_feed(&body, MAX_HEADLINES)?
            .into_iter()
            .map(|item| NewsItem {
                title: item.title,
                link: item.link,
                published: item.published.map(|p| p.to_rfc3339()),
            })
            .collect();

        Ok(Self {
            symbol: stock.symbol.clone(),
            company_name: stock.company_name.clone(),
            news,
        })
    }

    /// Recover a snapshot from its cached JSON form.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when `value` is not a snapshot.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }
}

/// Replays the news items of the day's [`TickerSnapshot`] as candidates.
///
/// Items are not date-filtered; the snapshot is already per-day.
#[derive(Debug, Clone, Default)]
pub struct TickerNewsSource {
    items: Vec<NewsItem>,
}

impl TickerNewsSource {
    #[must_use]
    pub fn new(items: Vec<NewsItem>) -> Self {
        Self { items }
    }

    #[must_use]
    pub fn from_snapshot(snapshot: &TickerSnapshot) -> Self {
        Self::new(snapshot.news.clone())
    }
}

#[async_trait]
impl RetrievalSource for TickerNewsSource {
    fn name(&self) -> &str {
        "ticker_news"
    }

    async fn fetch_candidates(
        &self,
        _stock: &StockConfig,
        _fetcher: &mut RateLimitedFetcher,
    ) -> Result<Vec<Candidate>, SentimentError> {
        Ok(self
            .items
            .iter()
            .filter(|item| !item.link.is_empty())
            .map(|item| Candidate::link(&item.title, &item.link))
            .collect())
    }
}
