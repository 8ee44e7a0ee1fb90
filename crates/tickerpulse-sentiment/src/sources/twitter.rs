//! Twitter/X recent-search source (API v2, app bearer token).

use std::collections::HashSet;

use async_trait::async_trait;
use serde::Deserialize;
use tickerpulse_core::StockConfig;
use tickerpulse_fetch::RateLimitedFetcher;

use super::RetrievalSource;
use crate::article::Candidate;
use crate::error::SentimentError;
use crate::relevance::TargetEntity;

const DEFAULT_API_BASE: &str = "https://api.twitter.com";
const MAX_RESULTS: usize = 100;
const TITLE_CHARS: usize = 80;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Tweet>,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    id: String,
    text: String,
}

/// Recent tweets mentioning a stock, delivered with their text inline.
pub struct TwitterSource {
    client: reqwest::Client,
    bearer_token: String,
    api_base: String,
}

impl std::fmt::Debug for TwitterSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitterSource")
            .field("bearer_token", &"[redacted]")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl TwitterSource {
    /// # Errors
    ///
    /// Returns [`SentimentError::MissingCredentials`] when `bearer_token` is
    /// `None`, or [`SentimentError::Http`] if the client cannot be built.
    pub fn new(bearer_token: Option<&str>) -> Result<Self, SentimentError> {
        Self::with_api_base(bearer_token, DEFAULT_API_BASE)
    }

    /// [`Self::new`] against an explicit API host.
    ///
    /// # Errors
    ///
    /// Same as [`Self::new`].
    pub fn with_api_base(bearer_token: Option<&str>, api_base: &str) -> Result<Self, SentimentError> {
        let bearer_token = bearer_token
            .ok_or_else(|| SentimentError::MissingCredentials("TWITTER_BEARER_TOKEN".to_string()))?;
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            bearer_token: bearer_token.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }
}

/// Search query matching the ticker or the full company name, retweets excluded.
fn search_query(stock: &StockConfig) -> String {
    format!(
        "({} OR \"{}\") -is:retweet",
        stock.symbol, stock.company_name
    )
}

fn title_of(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(TITLE_CHARS) {
        Some((cut, _)) => format!("{}...", &flat[..cut]),
        None => flat,
    }
}

#[async_trait]
impl RetrievalSource for TwitterSource {
    fn name(&self) -> &str {
        "twitter"
    }

    async fn fetch_candidates(
        &self,
        stock: &StockConfig,
        _fetcher: &mut RateLimitedFetcher,
    ) -> Result<Vec<Candidate>, SentimentError> {
        let response = self
            .client
            .get(format!("{}/2/tweets/search/recent", self.api_base))
            .bearer_auth(&self.bearer_token)
            .query(&[
                ("query", search_query(stock)),
                ("max_results", MAX_RESULTS.to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SentimentError::Twitter(format!(
                "recent search failed with status {}",
                response.status()
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| SentimentError::Twitter(format!("response parse error: {e}")))?;

        let target = TargetEntity::new(stock);
        let mut seen = HashSet::new();
        let candidates: Vec<Candidate> = body
            .data
            .into_iter()
            .filter(|tweet| target.mentioned_in(&tweet.text))
            .filter(|tweet| seen.insert(tweet.id.clone()))
            .map(|tweet| {
                Candidate::text(
                    title_of(&tweet.text),
                    format!("https://x.com/i/web/status/{}", tweet.id),
                    tweet.text,
                )
            })
            .collect();

        tracing::debug!(
            symbol = %stock.symbol,
            candidates = candidates.len(),
            "collected Twitter candidates"
        );
        Ok(candidates)
    }
}
