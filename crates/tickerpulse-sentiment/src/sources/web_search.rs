//! Site-restricted web search source.

use std::collections::HashSet;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::Url;
use tickerpulse_core::StockConfig;
use tickerpulse_fetch::{canonicalize_url, extract_links, host_matches, RateLimitedFetcher};

use super::RetrievalSource;
use crate::article::Candidate;
use crate::error::SentimentError;

const SEARCH_URL: &str = "https://www.google.com/search";
const MAX_RESULTS: usize = 20;

/// Articles on one domain found through a `site:` web search.
///
/// The search page is fetched through the run's fetcher, so a challenge
/// page surfaces as a manual-intervention error for this source.
#[derive(Debug, Clone)]
pub struct WebSearchSource {
    name: String,
    domain: String,
    search_url: String,
}

impl WebSearchSource {
    #[must_use]
    pub fn new(domain: &str) -> Self {
        let domain = domain.trim().to_ascii_lowercase();
        Self {
            name: format!("web:{domain}"),
            domain,
            search_url: SEARCH_URL.to_string(),
        }
    }

    /// Point the source at another search endpoint.
    #[must_use]
    pub fn with_search_url(mut self, url: &str) -> Self {
        self.search_url = url.to_string();
        self
    }

    /// Search URL for `stock`, e.g. `...?q=site%3Afool%2Ecom%20NVDA%20NVIDIA%20Corporation`.
    #[must_use]
    pub fn query_url(&self, stock: &StockConfig) -> String {
        let query = format!("site:{} {} {}", self.domain, stock.symbol, stock.company_name);
        let encoded = utf8_percent_encode(&query, NON_ALPHANUMERIC);
        format!("{}?q={encoded}", self.search_url)
    }
}

/// Unwrap Google's `/url?q=<target>` redirect links.
fn unwrap_redirect(href: &str) -> String {
    Url::parse(href)
        .ok()
        .filter(|u| u.path() == "/url")
        .and_then(|u| {
            u.query_pairs()
                .find(|(k, _)| k == "q" || k == "url")
                .map(|(_, v)| v.into_owned())
        })
        .unwrap_or_else(|| href.to_string())
}

#[async_trait]
impl RetrievalSource for WebSearchSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_candidates(
        &self,
        stock: &StockConfig,
        fetcher: &mut RateLimitedFetcher,
    ) -> Result<Vec<Candidate>, SentimentError> {
        let search_url = self.query_url(stock);
        let body = fetcher.fetch(&search_url).await?;

        let mut seen = HashSet::new();
        let candidates: Vec<Candidate> = extract_links(&body, Some(&search_url))
            .into_iter()
            .filter_map(|link| {
                let target = unwrap_redirect(&link.href);
                if !host_matches(&target, &self.domain) {
                    return None;
                }
                let key = canonicalize_url(&target)?;
                seen.insert(key).then(|| Candidate::link(link.text, target))
            })
            .take(MAX_RESULTS)
            .collect();

        tracing::debug!(
            symbol = %stock.symbol,
            domain = %self.domain,
            candidates = candidates.len(),
            "parsed search results"
        );
        Ok(candidates)
    }
}
