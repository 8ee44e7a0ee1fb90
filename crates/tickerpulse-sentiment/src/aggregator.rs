//! Per-stock article collection, URL deduplication and sentiment aggregates.

use std::collections::HashSet;

use serde::Serialize;
use tickerpulse_core::{AggregationMode, StockConfig};
use tickerpulse_fetch::{canonicalize_url, FetchError, RateLimitedFetcher};

use crate::article::{Article, ArticleAssembler};
use crate::relevance::TargetEntity;
use crate::sources::RetrievalSource;

/// A source was stopped by an anti-bot challenge and needs a human.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterventionNotice {
    pub source: String,
    pub url: String,
    pub reason: String,
}

/// Outcome of ingesting one source for one stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub source: String,
    pub candidates: usize,
    pub added: usize,
    pub duplicates: usize,
    pub intervention: Option<InterventionNotice>,
}

impl IngestReport {
    pub(crate) fn empty(source: &str) -> Self {
        Self {
            source: source.to_string(),
            candidates: 0,
            added: 0,
            duplicates: 0,
            intervention: None,
        }
    }
}

fn intervention_notice(source: &str, error: &FetchError) -> Option<InterventionNotice> {
    match error {
        FetchError::ManualInterventionRequired { url, reason } => Some(InterventionNotice {
            source: source.to_string(),
            url: url.clone(),
            reason: reason.clone(),
        }),
        _ => None,
    }
}

/// Owns the deduplicated article set for one stock.
pub struct StockAggregator {
    stock: StockConfig,
    target: TargetEntity,
    mode: AggregationMode,
    articles: Vec<Article>,
    urls: HashSet<String>,
}

impl StockAggregator {
    #[must_use]
    pub fn new(stock: StockConfig, mode: AggregationMode) -> Self {
        let target = TargetEntity::new(&stock);
        Self {
            stock,
            target,
            mode,
            articles: Vec::new(),
            urls: HashSet::new(),
        }
    }

    #[must_use]
    pub fn stock(&self) -> &StockConfig {
        &self.stock
    }

    #[must_use]
    pub fn target(&self) -> &TargetEntity {
        &self.target
    }

    /// Articles in insertion order.
    #[must_use]
    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    /// Add `article` unless one with the same URL is already present.
    /// Returns whether it was added.
    pub fn insert(&mut self, article: Article) -> bool {
        if !self.urls.insert(article.url().to_string()) {
            return false;
        }
        self.articles.push(article);
        true
    }

    /// Pull candidates from `source` and add every new relevant article.
    ///
    /// Source and candidate failures are logged and never abort the stock.
    /// A manual-intervention challenge stops this source and is reported.
    pub async fn ingest(
        &mut self,
        source: &dyn RetrievalSource,
        assembler: &ArticleAssembler,
        fetcher: &mut RateLimitedFetcher,
    ) -> IngestReport {
        let name = source.name();
        let mut report = IngestReport::empty(name);

        let candidates = match source.fetch_candidates(&self.stock, fetcher).await {
            Ok(candidates) => candidates,
            Err(e) => {
                report.intervention = e
                    .as_manual_intervention()
                    .and_then(|fe| intervention_notice(name, fe));
                tracing::warn!(
                    symbol = %self.stock.symbol,
                    source = name,
                    error = %e,
                    "source failed to produce candidates"
                );
                return report;
            }
        };
        report.candidates = candidates.len();

        for candidate in &candidates {
            if canonicalize_url(&candidate.url).is_some_and(|url| self.urls.contains(&url)) {
                report.duplicates += 1;
                continue;
            }

            match assembler.build(candidate, &self.target, name, fetcher).await {
                Ok(Some(article)) => {
                    if self.insert(article) {
                        report.added += 1;
                    } else {
                        report.duplicates += 1;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        symbol = %self.stock.symbol,
                        source = name,
                        error = %e,
                        "manual intervention required; skipping rest of source"
                    );
                    report.intervention = intervention_notice(name, &e);
                    break;
                }
            }
        }

        tracing::debug!(
            symbol = %self.stock.symbol,
            source = name,
            candidates = report.candidates,
            added = report.added,
            duplicates = report.duplicates,
            "source ingested"
        );
        report
    }

    #[must_use]
    pub fn sentiment_count(&self) -> usize {
        self.articles.len()
    }

    /// Sum of per-article sentiment.
    #[must_use]
    pub fn total_sentiment(&self) -> f64 {
        self.articles
            .iter()
            .map(|a| a.sentiment_score(self.mode))
            .sum()
    }

    /// Mean article sentiment rounded to three decimals; `0.0` when empty.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_sentiment(&self) -> f64 {
        if self.articles.is_empty() {
            return 0.0;
        }
        let mean = self.total_sentiment() / self.articles.len() as f64;
        (mean * 1000.0).round() / 1000.0
    }
}

#[cfg(test)]
#[path = "aggregator_test.rs"]
mod tests;
