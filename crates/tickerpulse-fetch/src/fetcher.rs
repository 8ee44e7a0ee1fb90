//! Rate-limited, per-run cached page fetching.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::FetchError;

/// Anything that can turn a URL into page content.
///
/// [`crate::HttpPageFetcher`] is the production implementation; tests
/// substitute in-memory fakes.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the raw body at `url`.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] describing why no content is available.
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError>;
}

/// Enforces a minimum interval between outbound requests and caches every
/// successful response by URL for the lifetime of the instance.
///
/// The clock and cache are plain fields behind `&mut self`, so one instance
/// serves one sequential run. The cache is never evicted.
pub struct RateLimitedFetcher {
    inner: Box<dyn PageFetcher>,
    delay: Duration,
    last_request: Option<Instant>,
    cache: HashMap<String, String>,
}

impl RateLimitedFetcher {
    /// Wrap `inner` with a limit of `requests_per_second`; `0` disables the wait.
    #[must_use]
    pub fn new(inner: impl PageFetcher + 'static, requests_per_second: u32) -> Self {
        let delay = if requests_per_second == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(1.0 / f64::from(requests_per_second))
        };
        Self {
            inner: Box::new(inner),
            delay,
            last_request: None,
            cache: HashMap::new(),
        }
    }

    /// Minimum spacing between two uncached requests.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Number of URLs cached so far in this run.
    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Whether a successful body for `url` is already cached.
    #[must_use]
    pub fn is_cached(&self, url: &str) -> bool {
        self.cache.contains_key(url)
    }

    /// Return the content at `url`.
    ///
    /// A cached URL is served without a request and without touching the
    /// rate-limit clock. Otherwise the call waits out the remainder of the
    /// delay since the previous request, fetches, and caches a successful
    /// body. Failures are not cached.
    ///
    /// # Errors
    ///
    /// Propagates the inner fetcher's [`FetchError`].
    pub async fn fetch(&mut self, url: &str) -> Result<String, FetchError> {
        if let Some(body) = self.cache.get(url) {
            tracing::debug!(url, "serving page from run cache");
            return Ok(body.clone());
        }

        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.delay {
                tokio::time::sleep(self.delay - elapsed).await;
            }
        }

        let result = self.inner.fetch_page(url).await;
        self.last_request = Some(Instant::now());

        let body = result?;
        self.cache.insert(url.to_owned(), body.clone());
        Ok(body)
    }

    /// Like [`Self::fetch`], but any failure degrades to an empty string.
    pub async fn fetch_or_empty(&mut self, url: &str) -> String {
        match self.fetch(url).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(url, error = %e, "page fetch failed; treating as empty");
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    struct RecordingFetcher {
        calls: Arc<AtomicUsize>,
        seen_at: Arc<Mutex<Vec<Instant>>>,
    }

    #[async_trait]
    impl PageFetcher for RecordingFetcher {
        async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen_at.lock().unwrap().push(Instant::now());
            if url.contains("missing") {
                return Err(FetchError::NotFound {
                    url: url.to_owned(),
                });
            }
            Ok(format!("<p>{url}</p>"))
        }
    }

    #[test]
    fn delay_is_inverse_of_rate() {
        let fetcher = RateLimitedFetcher::new(RecordingFetcher::default(), 4);
        assert_eq!(fetcher.delay(), Duration::from_millis(250));
        let unlimited = RateLimitedFetcher::new(RecordingFetcher::default(), 0);
        assert_eq!(unlimited.delay(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn cached_url_skips_network_and_clock() {
        let inner = RecordingFetcher::default();
        let calls = Arc::clone(&inner.calls);
        let mut fetcher = RateLimitedFetcher::new(inner, 1);

        let first = fetcher.fetch("https://a.example.com/1").await.unwrap();
        let started = Instant::now();
        let second = fetcher.fetch("https://a.example.com/1").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(fetcher.cached_len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_requests_are_spaced_by_delay() {
        let inner = RecordingFetcher::default();
        let seen_at = Arc::clone(&inner.seen_at);
        let mut fetcher = RateLimitedFetcher::new(inner, 2);

        fetcher.fetch("https://a.example.com/1").await.unwrap();
        fetcher.fetch("https://a.example.com/2").await.unwrap();
        fetcher.fetch("https://a.example.com/3").await.unwrap();

        let seen = seen_at.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(seen[1] - seen[0] >= Duration::from_millis(500));
        assert!(seen[2] - seen[1] >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn no_wait_when_delay_already_elapsed() {
        let inner = RecordingFetcher::default();
        let mut fetcher = RateLimitedFetcher::new(inner, 10);

        fetcher.fetch("https://a.example.com/1").await.unwrap();
        tokio::time::advance(Duration::from_secs(1)).await;
        let before = Instant::now();
        fetcher.fetch("https://a.example.com/2").await.unwrap();
        assert_eq!(before.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let inner = RecordingFetcher::default();
        let calls = Arc::clone(&inner.calls);
        let mut fetcher = RateLimitedFetcher::new(inner, 0);

        assert!(fetcher.fetch("https://a.example.com/missing").await.is_err());
        assert!(fetcher.fetch("https://a.example.com/missing").await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!fetcher.is_cached("https://a.example.com/missing"));
    }

    #[tokio::test]
    async fn fetch_or_empty_swallows_errors() {
        let mut fetcher = RateLimitedFetcher::new(RecordingFetcher::default(), 0);
        assert_eq!(fetcher.fetch_or_empty("https://a.example.com/missing").await, "");
        assert_eq!(
            fetcher.fetch_or_empty("https://a.example.com/ok").await,
            "<p>https://a.example.com/ok</p>"
        );
    }
}
