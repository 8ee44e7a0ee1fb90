//! Reddit search source (client-credentials OAuth).

use std::collections::HashSet;

use async_trait::async_trait;
use serde::Deserialize;
use tickerpulse_core::{RedditCredentials, StockConfig};
use tickerpulse_fetch::RateLimitedFetcher;

use super::reddit_helpers::{build_query_variants, to_candidate};
use super::RetrievalSource;
use crate::article::{Candidate, CandidateContent};
use crate::error::SentimentError;
use crate::relevance::TargetEntity;

const SEARCH_SUBREDDITS: &str = "stocks+investing+wallstreetbets+StockMarket+options+SecurityAnalysis";
const PAGE_LIMIT: usize = 50;
const PAGE_COUNT: usize = 2;
const REDDIT_MAX_CANDIDATES: usize = 40;

/// Reddit OAuth token response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Reddit search listing wrapper.
#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<Post>,
    after: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Post {
    pub(super) data: PostData,
}

#[derive(Debug, Deserialize)]
pub(super) struct PostData {
    pub(super) title: Option<String>,
    pub(super) selftext: Option<String>,
    pub(super) permalink: Option<String>,
}

/// Where token exchange and search requests go.
#[derive(Debug, Clone)]
pub struct RedditEndpoints {
    pub token_url: String,
    pub api_base: String,
}

impl Default for RedditEndpoints {
    fn default() -> Self {
        Self {
            token_url: "https://www.reddit.com/api/v1/access_token".to_string(),
            api_base: "https://oauth.reddit.com".to_string(),
        }
    }
}

/// Reddit posts about a stock, delivered with their text inline.
pub struct RedditSource {
    client: reqwest::Client,
    token: String,
    user_agent: String,
    api_base: String,
}

impl std::fmt::Debug for RedditSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditSource")
            .field("token", &"[redacted]")
            .field("user_agent", &self.user_agent)
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl RedditSource {
    /// Exchange client credentials for an access token.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::MissingCredentials`] when `credentials` is
    /// `None`, or [`SentimentError::Reddit`] if the token exchange fails.
    pub async fn connect(credentials: Option<&RedditCredentials>) -> Result<Self, SentimentError> {
        Self::connect_with(credentials, RedditEndpoints::default()).await
    }

    /// [`Self::connect`] against explicit endpoints.
    ///
    /// # Errors
    ///
    /// Same as [`Self::connect`].
    pub async fn connect_with(
        credentials: Option<&RedditCredentials>,
        endpoints: RedditEndpoints,
    ) -> Result<Self, SentimentError> {
        let credentials = credentials.ok_or_else(|| {
            SentimentError::MissingCredentials(
                "REDDIT_CLIENT_ID, REDDIT_CLIENT_SECRET and REDDIT_USER_AGENT".to_string(),
            )
        })?;

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| SentimentError::Reddit(format!("failed to build HTTP client: {e}")))?;
        let token = Self::fetch_token(&client, &endpoints.token_url, credentials).await?;

        Ok(Self {
            client,
            token,
            user_agent: credentials.user_agent.clone(),
            api_base: endpoints.api_base.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_token(
        client: &reqwest::Client,
        token_url: &str,
        credentials: &RedditCredentials,
    ) -> Result<String, SentimentError> {
        let response = client
            .post(token_url)
            .header("User-Agent", &credentials.user_agent)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SentimentError::Reddit(format!(
                "token exchange failed with status {}",
                response.status()
            )));
        }

        let token_resp: TokenResponse = response
            .json()
            .await
            .map_err(|e| SentimentError::Reddit(format!("token parse error: {e}")))?;

        Ok(token_resp.access_token)
    }

    async fn search_page(
        &self,
        query: &str,
        sort: &str,
        after: Option<&str>,
    ) -> Result<Listing, SentimentError> {
        let mut params: Vec<(&str, String)> = vec![
            ("q", query.to_string()),
            ("restrict_sr", "true".to_string()),
            ("sort", sort.to_string()),
            ("t", "day".to_string()),
            ("limit", PAGE_LIMIT.to_string()),
            ("type", "link".to_string()),
        ];
        if let Some(cursor) = after {
            params.push(("after", cursor.to_string()));
        }

        let response = self
            .client
            .get(format!("{}/r/{SEARCH_SUBREDDITS}/search", self.api_base))
            .bearer_auth(&self.token)
            .header("User-Agent", &self.user_agent)
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SentimentError::Reddit(format!(
                "Reddit search failed with status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| SentimentError::Reddit(format!("Reddit response parse error: {e}")))
    }
}

#[async_trait]
impl RetrievalSource for RedditSource {
    fn name(&self) -> &str {
        "reddit"
    }

    async fn fetch_candidates(
        &self,
        stock: &StockConfig,
        _fetcher: &mut RateLimitedFetcher,
    ) -> Result<Vec<Candidate>, SentimentError> {
        let target = TargetEntity::new(stock);
        let queries = build_query_variants(&stock.symbol, target.keyword());
        let mut candidates = Vec::new();
        let mut seen_urls = HashSet::new();

        'search: for query in &queries {
            for sort in ["relevance", "new"] {
                let mut after: Option<String> = None;
                for _ in 0..PAGE_COUNT {
                    let listing = self.search_page(query, sort, after.as_deref()).await?;
                    for post in &listing.data.children {
                        let Some(candidate) = to_candidate(post) else {
                            continue;
                        };
                        let mentioned = match &candidate.content {
                            CandidateContent::Text(text) => target.mentioned_in(text),
                            CandidateContent::Link => target.mentioned_in(&candidate.title),
                        };
                        if !mentioned {
                            continue;
                        }
                        if seen_urls.insert(candidate.url.clone()) {
                            candidates.push(candidate);
                        }
                        if candidates.len() >= REDDIT_MAX_CANDIDATES {
                            break 'search;
                        }
                    }
                    after = listing.data.after;
                    if after.is_none() {
                        break;
                    }
                }
            }
        }

        tracing::debug!(
            symbol = %stock.symbol,
            query_variants = queries.len(),
            candidates = candidates.len(),
            "collected Reddit candidates"
        );
        Ok(candidates)
    }
}

