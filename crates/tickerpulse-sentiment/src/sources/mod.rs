//! Retrieval source abstractions.

mod reddit;
mod reddit_helpers;
mod rss;
mod rss_helpers;
mod ticker_news;
mod twitter;
mod web_search;

use std::sync::Arc;

use async_trait::async_trait;
use tickerpulse_core::StockConfig;
use tickerpulse_fetch::RateLimitedFetcher;

use crate::article::Candidate;
use crate::error::SentimentError;

pub use reddit::{RedditEndpoints, RedditSource};
pub use rss::RssSource;
pub use ticker_news::{headline_feed_url, NewsItem, TickerNewsSource, TickerSnapshot, HEADLINE_FEED_URL};
pub use twitter::TwitterSource;
pub use web_search::WebSearchSource;

/// Something that can list candidate articles for a stock.
///
/// Sources that read web pages go through the shared `fetcher` so they obey
/// the run's rate limit and reuse its page cache.
#[async_trait]
pub trait RetrievalSource: Send + Sync {
    /// Short identifier used in logs and reports.
    fn name(&self) -> &str;

    /// # Errors
    ///
    /// Returns [`SentimentError`] when the source cannot be read at all. A
    /// challenge page surfaces as [`SentimentError::Fetch`] wrapping
    /// `FetchError::ManualInterventionRequired`.
    async fn fetch_candidates(
        &self,
        stock: &StockConfig,
        fetcher: &mut RateLimitedFetcher,
    ) -> Result<Vec<Candidate>, SentimentError>;
}

/// Lets one source instance (e.g. an authenticated Reddit client) serve
/// every stock in a run.
#[async_trait]
impl<T> RetrievalSource for Arc<T>
where
    T: RetrievalSource + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn fetch_candidates(
        &self,
        stock: &StockConfig,
        fetcher: &mut RateLimitedFetcher,
    ) -> Result<Vec<Candidate>, SentimentError> {
        (**self).fetch_candidates(stock, fetcher).await
    }
}
