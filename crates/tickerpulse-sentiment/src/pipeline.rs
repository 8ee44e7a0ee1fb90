//! Sentiment pipeline orchestration.

use std::collections::HashSet;
use std::time::Duration;

use tickerpulse_core::{AggregationMode, AppConfig, StockConfig};
use tickerpulse_fetch::{HttpPageFetcher, RateLimitedFetcher};

use crate::aggregator::{IngestReport, StockAggregator};
use crate::article::ArticleAssembler;
use crate::chunker::TextChunker;
use crate::classifier::HttpZeroShotClassifier;
use crate::error::SentimentError;
use crate::relevance::{RelevanceFilter, ZeroShotClassifier};
use crate::scorer::{HttpSentimentScorer, LexiconScorer, SentimentScorer};
use crate::sources::RetrievalSource;
use crate::types::StockSentimentResult;

/// Owns the run's fetcher and assembler and drives stocks through them one
/// at a time.
///
/// A source that hits a manual-intervention challenge is blocked for the
/// rest of the run: later stocks get an empty report for it.
pub struct SentimentPipeline {
    fetcher: RateLimitedFetcher,
    assembler: ArticleAssembler,
    mode: AggregationMode,
    blocked: HashSet<String>,
}

impl SentimentPipeline {
    #[must_use]
    pub fn new(
        fetcher: RateLimitedFetcher,
        assembler: ArticleAssembler,
        mode: AggregationMode,
    ) -> Self {
        Self {
            fetcher,
            assembler,
            mode,
            blocked: HashSet::new(),
        }
    }

    /// Wire the HTTP fetcher, relevance filter and scorer from `config`.
    ///
    /// Without `classifier_url` relevance is keyword-only; without
    /// `sentiment_url` chunks are scored with the offline lexicon.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError`] if an HTTP client cannot be constructed.
    pub fn from_config(config: &AppConfig) -> Result<Self, SentimentError> {
        let page_fetcher = HttpPageFetcher::new(
            config.fetch_timeout_secs,
            &config.fetch_user_agent,
            config.fetch_max_retries,
            config.fetch_backoff_base_secs,
        )?;
        let fetcher = RateLimitedFetcher::new(page_fetcher, config.requests_per_second);

        let model_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()?;

        let classifier: Option<Box<dyn ZeroShotClassifier>> =
            config.classifier_url.as_deref().map(|url| {
                Box::new(HttpZeroShotClassifier::new(
                    model_client.clone(),
                    url,
                    config.inference_token.clone(),
                )) as Box<dyn ZeroShotClassifier>
            });

        let scorer: Box<dyn SentimentScorer> = match config.sentiment_url.as_deref() {
            Some(url) => Box::new(HttpSentimentScorer::new(
                model_client,
                url,
                config.inference_token.clone(),
                config.sentiment_mapping,
            )),
            None => Box::new(LexiconScorer),
        };

        tracing::info!(
            classifier = classifier.is_some(),
            sentiment_model = config.sentiment_url.is_some(),
            threshold = config.relevance_threshold,
            mode = %config.aggregation_mode,
            "sentiment pipeline configured"
        );

        let assembler = ArticleAssembler::new(
            TextChunker::new(config.chunk_max_tokens),
            RelevanceFilter::new(classifier, config.relevance_threshold),
            scorer,
            config.scorer_max_words,
        );
        Ok(Self::new(fetcher, assembler, config.aggregation_mode))
    }

    /// The run's fetcher, for callers that fetch outside a source (e.g. the
    /// daily ticker snapshot).
    pub fn fetcher_mut(&mut self) -> &mut RateLimitedFetcher {
        &mut self.fetcher
    }

    /// Whether `source` was stopped by a challenge earlier in this run.
    #[must_use]
    pub fn is_blocked(&self, source: &str) -> bool {
        self.blocked.contains(source)
    }

    /// Run every source for `stock` in order and aggregate the result.
    ///
    /// Never fails: source and article failures are logged and skipped,
    /// and zero articles produce a neutral `0.0` average. Sources blocked
    /// earlier in the run are not consulted.
    pub async fn run_stock_sentiment(
        &mut self,
        stock: &StockConfig,
        sources: &[Box<dyn RetrievalSource>],
    ) -> StockSentimentResult {
        let mut aggregator = StockAggregator::new(stock.clone(), self.mode);
        let mut reports = Vec::with_capacity(sources.len());

        for source in sources {
            let name = source.name();
            if self.blocked.contains(name) {
                tracing::debug!(
                    symbol = %stock.symbol,
                    source = name,
                    "source blocked for this run"
                );
                reports.push(IngestReport::empty(name));
                continue;
            }
            let report = aggregator
                .ingest(source.as_ref(), &self.assembler, &mut self.fetcher)
                .await;
            if report.intervention.is_some() {
                self.blocked.insert(name.to_string());
            }
            reports.push(report);
        }

        let interventions = reports
            .iter()
            .filter_map(|r| r.intervention.clone())
            .collect();
        let result = StockSentimentResult {
            symbol: stock.symbol.clone(),
            company_name: stock.company_name.clone(),
            count: aggregator.sentiment_count(),
            average: aggregator.average_sentiment(),
            total: aggregator.total_sentiment(),
            interventions,
            reports,
            articles: aggregator.articles().to_vec(),
        };

        tracing::info!(
            symbol = %result.symbol,
            articles = result.count,
            average = result.average,
            cached_pages = self.fetcher.cached_len(),
            "stock sentiment aggregated"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use tickerpulse_core::StockConfig;

    use super::*;
    use crate::article::Candidate;
    use crate::test_support::{assembler, page, StaticPages, StaticSource, WordScorer};

    fn pipeline(pages: StaticPages) -> SentimentPipeline {
        SentimentPipeline::new(pages.into_fetcher(), assembler(WordScorer), AggregationMode::Mean)
    }

    #[tokio::test]
    async fn aggregates_across_sources_in_order() {
        let pages = StaticPages::default()
            .with_page("https://test.com/nvidia-positive", &page(&["NVIDIA beat estimates."]))
            .with_page("https://test.com/nvidia-negative", &page(&["NVIDIA missed on margins."]))
            .with_challenge("https://test.com/blocked");
        let sources: Vec<Box<dyn RetrievalSource>> = vec![
            Box::new(StaticSource::new(
                "rss",
                vec![
                    Candidate::link("up", "https://test.com/nvidia-positive"),
                    Candidate::link("down", "https://test.com/nvidia-negative"),
                ],
            )),
            Box::new(StaticSource::new(
                "web:test.com",
                vec![
                    Candidate::link("up again", "https://test.com/nvidia-positive?src=web"),
                    Candidate::link("blocked", "https://test.com/blocked"),
                ],
            )),
            Box::new(StaticSource::failing("reddit")),
        ];

        let mut pipeline = pipeline(pages);
        let result = pipeline
            .run_stock_sentiment(&StockConfig::new("NVDA", "NVIDIA Corporation"), &sources)
            .await;

        assert_eq!(result.count, 2);
        assert_eq!(result.average, 0.0);
        assert_eq!(result.reports.len(), 3);
        assert_eq!(result.reports[1].duplicates, 1);
        assert_eq!(result.interventions.len(), 1);
        assert_eq!(result.interventions[0].source, "web:test.com");
        assert_eq!(result.articles[0].title(), "up");
    }

    #[tokio::test]
    async fn challenged_source_is_skipped_for_later_stocks() {
        let pages = StaticPages::default()
            .with_page(
                "https://test.com/nvidia-positive",
                &page(&["NVIDIA and Apple beat estimates."]),
            )
            .with_challenge("https://test.com/blocked");
        let calls = pages.calls();
        let sources: Vec<Box<dyn RetrievalSource>> = vec![
            Box::new(StaticSource::new(
                "web:test.com",
                vec![Candidate::link("blocked", "https://test.com/blocked")],
            )),
            Box::new(StaticSource::new(
                "rss",
                vec![Candidate::link("up", "https://test.com/nvidia-positive")],
            )),
        ];

        let mut pipeline = pipeline(pages);
        let first = pipeline
            .run_stock_sentiment(&StockConfig::new("NVDA", "NVIDIA Corporation"), &sources)
            .await;
        assert_eq!(first.interventions.len(), 1);
        assert!(pipeline.is_blocked("web:test.com"));
        assert!(!pipeline.is_blocked("rss"));

        let second = pipeline
            .run_stock_sentiment(&StockConfig::new("AAPL", "Apple Inc."), &sources)
            .await;
        assert!(second.interventions.is_empty());
        assert_eq!(second.reports[0].source, "web:test.com");
        assert_eq!(second.reports[0].candidates, 0);
        assert_eq!(second.count, 1);
        // One challenged fetch plus one article page; the second stock reuses the cache.
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn no_sources_yield_neutral_result() {
        let mut pipeline = pipeline(StaticPages::default());
        let result = pipeline
            .run_stock_sentiment(&StockConfig::new("AAPL", "Apple Inc."), &[])
            .await;
        assert_eq!(result.symbol, "AAPL");
        assert_eq!(result.count, 0);
        assert_eq!(result.average, 0.0);
        assert!(result.interventions.is_empty());
    }

    #[test]
    fn from_config_builds_without_model_endpoints() {
        let config = tickerpulse_core::build_app_config(|_| Err(std::env::VarError::NotPresent))
            .expect("defaults are valid");
        assert!(SentimentPipeline::from_config(&config).is_ok());
    }
}
