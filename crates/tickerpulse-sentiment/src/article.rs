//! Articles and the assembler that turns candidate links into them.

use serde::Serialize;
use tickerpulse_core::AggregationMode;
use tickerpulse_fetch::{canonicalize_url, extract_paragraph_text, FetchError, RateLimitedFetcher};

use crate::chunker::TextChunker;
use crate::relevance::{RelevanceFilter, TargetEntity};
use crate::scorer::{truncate_words, SentimentScorer};
use crate::sentences::word_count;

/// What a retrieval source knows about a candidate besides its URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateContent {
    /// The body must be fetched from the URL.
    Link,
    /// The source already delivered the text.
    Text(String),
}

/// A potential article yielded by a retrieval source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub title: String,
    pub url: String,
    pub content: CandidateContent,
}

impl Candidate {
    #[must_use]
    pub fn link(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            content: CandidateContent::Link,
        }
    }

    #[must_use]
    pub fn text(title: impl Into<String>, url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            content: CandidateContent::Text(text.into()),
        }
    }
}

/// A relevant text segment and its sentiment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub text: String,
    pub score: f64,
}

/// A relevance-confirmed article. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    title: String,
    url: String,
    source: String,
    chunks: Vec<ScoredChunk>,
}

impl Article {
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        source: impl Into<String>,
        chunks: Vec<ScoredChunk>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            source: source.into(),
            chunks,
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Canonical URL; unique within a stock's article set.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Name of the retrieval source that produced the article.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn chunks(&self) -> &[ScoredChunk] {
        &self.chunks
    }

    /// Article sentiment from its chunk scores; `0.0` without chunks.
    ///
    /// [`AggregationMode::LengthWeighted`] weights each chunk by its share of
    /// the article's words.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn sentiment_score(&self, mode: AggregationMode) -> f64 {
        if self.chunks.is_empty() {
            return 0.0;
        }
        match mode {
            AggregationMode::Mean => {
                let sum: f64 = self.chunks.iter().map(|c| c.score).sum();
                sum / self.chunks.len() as f64
            }
            AggregationMode::LengthWeighted => {
                let total_words: usize = self.chunks.iter().map(|c| word_count(&c.text)).sum();
                if total_words == 0 {
                    return 0.0;
                }
                self.chunks
                    .iter()
                    .map(|c| c.score * word_count(&c.text) as f64 / total_words as f64)
                    .sum()
            }
        }
    }
}

/// Fetches, chunks, filters and scores a candidate into an [`Article`].
pub struct ArticleAssembler {
    chunker: TextChunker,
    relevance: RelevanceFilter,
    scorer: Box<dyn SentimentScorer>,
    scorer_max_words: usize,
}

impl ArticleAssembler {
    #[must_use]
    pub fn new(
        chunker: TextChunker,
        relevance: RelevanceFilter,
        scorer: Box<dyn SentimentScorer>,
        scorer_max_words: usize,
    ) -> Self {
        Self {
            chunker,
            relevance,
            scorer,
            scorer_max_words,
        }
    }

    /// Build an article for `candidate`, or `None` when it has no usable
    /// body or nothing in it is about `target`.
    ///
    /// # Errors
    ///
    /// Only [`FetchError::ManualInterventionRequired`] is returned; every
    /// other fetch failure yields `Ok(None)`.
    pub async fn build(
        &self,
        candidate: &Candidate,
        target: &TargetEntity,
        source: &str,
        fetcher: &mut RateLimitedFetcher,
    ) -> Result<Option<Article>, FetchError> {
        let Some(url) = canonicalize_url(&candidate.url) else {
            tracing::debug!(url = %candidate.url, "skipping candidate with unusable URL");
            return Ok(None);
        };

        let text = match &candidate.content {
            CandidateContent::Text(text) => text.clone(),
            CandidateContent::Link => match fetcher.fetch(&candidate.url).await {
                Ok(body) => extract_paragraph_text(&body),
                Err(e) if e.is_manual_intervention() => return Err(e),
                Err(e) => {
                    tracing::debug!(url = %candidate.url, error = %e, "candidate fetch failed");
                    return Ok(None);
                }
            },
        };
        if text.trim().is_empty() {
            return Ok(None);
        }

        let mut chunks = Vec::new();
        for chunk in self.chunker.chunk(&text) {
            let verdict = self.relevance.assess(&chunk, target).await;
            if !verdict.relevant {
                continue;
            }
            let score = match self
                .scorer
                .score(&truncate_words(&chunk, self.scorer_max_words))
                .await
            {
                Ok(score) => score,
                Err(e) => {
                    tracing::warn!(
                        symbol = target.symbol(),
                        url = %url,
                        error = %e,
                        "chunk scoring failed; using neutral score"
                    );
                    0.0
                }
            };
            chunks.push(ScoredChunk { text: chunk, score });
        }

        if chunks.is_empty() {
            return Ok(None);
        }
        Ok(Some(Article::new(&candidate.title, url, source, chunks)))
    }
}

#[cfg(test)]
#[path = "article_test.rs"]
mod tests;
