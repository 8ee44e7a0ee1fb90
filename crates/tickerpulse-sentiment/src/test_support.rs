//! In-memory collaborators shared by unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tickerpulse_core::StockConfig;
use tickerpulse_fetch::{FetchError, PageFetcher, RateLimitedFetcher};

use crate::article::{ArticleAssembler, Candidate};
use crate::chunker::TextChunker;
use crate::error::SentimentError;
use crate::relevance::RelevanceFilter;
use crate::scorer::SentimentScorer;
use crate::sources::RetrievalSource;

/// Serves fixed pages by URL; unknown URLs are 404s.
#[derive(Clone, Default)]
pub(crate) struct StaticPages {
    pages: HashMap<String, String>,
    challenges: HashSet<String>,
    calls: Arc<AtomicUsize>,
}

impl StaticPages {
    pub(crate) fn with_page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }

    pub(crate) fn with_challenge(mut self, url: &str) -> Self {
        self.challenges.insert(url.to_string());
        self
    }

    pub(crate) fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub(crate) fn into_fetcher(self) -> RateLimitedFetcher {
        RateLimitedFetcher::new(self, 0)
    }
}

#[async_trait]
impl PageFetcher for StaticPages {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.challenges.contains(url) {
            return Err(FetchError::ManualInterventionRequired {
                url: url.to_string(),
                reason: "unusual traffic interstitial".to_string(),
            });
        }
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                url: url.to_string(),
            })
    }
}

/// Scores `+1.0` for text containing "beat", `-1.0` for "miss", else `0.0`.
pub(crate) struct WordScorer;

#[async_trait]
impl SentimentScorer for WordScorer {
    async fn score(&self, text: &str) -> Result<f64, SentimentError> {
        let lower = text.to_lowercase();
        if lower.contains("beat") {
            Ok(1.0)
        } else if lower.contains("miss") {
            Ok(-1.0)
        } else {
            Ok(0.0)
        }
    }
}

pub(crate) struct FailingScorer;

#[async_trait]
impl SentimentScorer for FailingScorer {
    async fn score(&self, _text: &str) -> Result<f64, SentimentError> {
        Err(SentimentError::Scorer("model offline".to_string()))
    }
}

/// Keyword-only assembler with a generous chunk budget.
pub(crate) fn assembler(scorer: impl SentimentScorer + 'static) -> ArticleAssembler {
    ArticleAssembler::new(
        TextChunker::new(512),
        RelevanceFilter::keyword_only(),
        Box::new(scorer),
        512,
    )
}

pub(crate) fn page(paragraphs: &[&str]) -> String {
    let body: String = paragraphs.iter().map(|p| format!("<p>{p}</p>")).collect();
    format!("<html><body>{body}</body></html>")
}

/// Yields a fixed candidate list, or fails when `fail` is set.
pub(crate) struct StaticSource {
    pub(crate) name: &'static str,
    pub(crate) candidates: Vec<Candidate>,
    pub(crate) fail: bool,
}

impl StaticSource {
    pub(crate) fn new(name: &'static str, candidates: Vec<Candidate>) -> Self {
        Self {
            name,
            candidates,
            fail: false,
        }
    }

    pub(crate) fn failing(name: &'static str) -> Self {
        Self {
            name,
            candidates: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl RetrievalSource for StaticSource {
    fn name(&self) -> &str {
        self.name
    }

    async fn fetch_candidates(
        &self,
        _stock: &StockConfig,
        _fetcher: &mut RateLimitedFetcher,
    ) -> Result<Vec<Candidate>, SentimentError> {
        if self.fail {
            return Err(SentimentError::Reddit("listing unavailable".to_string()));
        }
        Ok(self.candidates.clone())
    }
}
