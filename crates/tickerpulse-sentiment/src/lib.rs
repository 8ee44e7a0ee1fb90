//! News sentiment pipeline for tickerpulse.
//!
//! Retrieval sources yield candidate articles for a stock. Each candidate is
//! fetched through the run's rate-limited fetcher, split into sentence-aligned
//! chunks, filtered for relevance to the stock, and scored chunk by chunk.
//! Articles are deduplicated by canonical URL and aggregated per stock.

pub mod aggregator;
pub mod article;
pub mod chunker;
pub mod classifier;
pub mod error;
pub mod pipeline;
pub mod relevance;
pub mod scorer;
pub mod sentences;
pub mod sources;
pub mod types;

#[cfg(test)]
mod test_support;

pub use aggregator::{IngestReport, InterventionNotice, StockAggregator};
pub use article::{Article, ArticleAssembler, Candidate, CandidateContent, ScoredChunk};
pub use chunker::TextChunker;
pub use classifier::HttpZeroShotClassifier;
pub use error::SentimentError;
pub use pipeline::SentimentPipeline;
pub use relevance::{
    name_keyword, Classification, RelevanceFilter, RelevanceMethod, RelevanceVerdict,
    TargetEntity, ZeroShotClassifier,
};
pub use scorer::{lexicon_score, HttpSentimentScorer, LexiconScorer, SentimentScorer};
pub use sources::{
    headline_feed_url, NewsItem, RedditEndpoints, RedditSource, RetrievalSource, RssSource,
    TickerNewsSource, TickerSnapshot, TwitterSource, WebSearchSource,
};
pub use types::StockSentimentResult;
