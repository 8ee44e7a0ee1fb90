use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How per-chunk sentiment scores collapse into one article score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    /// Arithmetic mean of chunk scores.
    #[default]
    Mean,
    /// Mean weighted by each chunk's share of the total word count.
    LengthWeighted,
}

impl std::fmt::Display for AggregationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregationMode::Mean => write!(f, "mean"),
            AggregationMode::LengthWeighted => write!(f, "length_weighted"),
        }
    }
}

/// How a `(label, confidence)` pair from a sentiment model becomes a signed score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreMapping {
    /// POSITIVE → +1, NEGATIVE → −1, anything else → 0.
    #[default]
    Binary,
    /// Label confidence, negated for negative labels.
    Signed,
}

impl std::fmt::Display for ScoreMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoreMapping::Binary => write!(f, "binary"),
            ScoreMapping::Signed => write!(f, "signed"),
        }
    }
}

#[derive(Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl std::fmt::Debug for RedditCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub stocks_path: PathBuf,
    pub log_level: String,
    pub requests_per_second: u32,
    pub fetch_timeout_secs: u64,
    pub fetch_user_agent: String,
    pub fetch_max_retries: u32,
    pub fetch_backoff_base_secs: u64,
    pub chunk_max_tokens: usize,
    pub scorer_max_words: usize,
    pub relevance_threshold: f64,
    pub aggregation_mode: AggregationMode,
    pub sentiment_mapping: ScoreMapping,
    pub classifier_url: Option<String>,
    pub sentiment_url: Option<String>,
    pub inference_token: Option<String>,
    pub search_url: Option<String>,
    pub reddit: Option<RedditCredentials>,
    pub twitter_bearer_token: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &self.database_url)
            .field("stocks_path", &self.stocks_path)
            .field("log_level", &self.log_level)
            .field("requests_per_second", &self.requests_per_second)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("fetch_user_agent", &self.fetch_user_agent)
            .field("fetch_max_retries", &self.fetch_max_retries)
            .field("fetch_backoff_base_secs", &self.fetch_backoff_base_secs)
            .field("chunk_max_tokens", &self.chunk_max_tokens)
            .field("scorer_max_words", &self.scorer_max_words)
            .field("relevance_threshold", &self.relevance_threshold)
            .field("aggregation_mode", &self.aggregation_mode)
            .field("sentiment_mapping", &self.sentiment_mapping)
            .field("classifier_url", &self.classifier_url)
            .field("sentiment_url", &self.sentiment_url)
            .field(
                "inference_token",
                &self.inference_token.as_ref().map(|_| "[redacted]"),
            )
            .field("search_url", &self.search_url)
            .field("reddit", &self.reddit)
            .field(
                "twitter_bearer_token",
                &self.twitter_bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}
