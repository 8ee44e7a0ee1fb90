//! Shared RSS feed source (MarketWatch, Reuters, MSN money, ...).

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::Url;
use tickerpulse_core::StockConfig;
use tickerpulse_fetch::RateLimitedFetcher;

use super::rss_helpers::parse_feed;
use super::RetrievalSource;
use crate::article::Candidate;
use crate::error::SentimentError;

const MAX_FEED_ITEMS: usize = 100;

/// Candidates from one RSS/Atom feed, shared by every stock in a run.
///
/// The feed body goes through the run's fetcher, so it is downloaded once
/// and re-read from the fetcher cache for each later stock.
#[derive(Debug, Clone)]
pub struct RssSource {
    name: String,
    feed_url: String,
    published_on: Option<NaiveDate>,
}

impl RssSource {
    #[must_use]
    pub fn new(feed_url: &str) -> Self {
        let host = Url::parse(feed_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
            .unwrap_or_else(|| feed_url.to_string());
        Self {
            name: format!("rss:{host}"),
            feed_url: feed_url.to_string(),
            published_on: None,
        }
    }

    /// Keep only items whose publication date (UTC) is `date`. Undated
    /// items are dropped.
    #[must_use]
    pub fn published_on(mut self, date: NaiveDate) -> Self {
        self.published_on = Some(date);
        self
    }
}

#[async_trait]
impl RetrievalSource for RssSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_candidates(
        &self,
        stock: &StockConfig,
        fetcher: &mut RateLimitedFetcher,
    ) -> Result<Vec<Candidate>, SentimentError> {
        let body = fetcher.fetch(&self.feed_url).await?;
        let items = parse_feed(&body, MAX_FEED_ITEMS)?;
        let total = items.len();

        let candidates: Vec<Candidate> = items
            .into_iter()
            .filter(|item| match self.published_on {
                Some(date) => item
                    .published
                    .is_some_and(|p| p.with_timezone(&Utc).date_naive() == date),
                None => true,
            })
            .map(|item| Candidate::link(item.title, item.link))
            .collect();

        tracing::debug!(
            symbol = %stock.symbol,
            feed = %self.feed_url,
            items = total,
            candidates = candidates.len(),
            "parsed RSS feed"
        );
        Ok(candidates)
    }
}
