use serde::Serialize;

use crate::aggregator::{IngestReport, InterventionNotice};
use crate::article::Article;

/// Aggregated sentiment for one stock after all sources ran.
#[derive(Debug, Clone, Serialize)]
pub struct StockSentimentResult {
    pub symbol: String,
    pub company_name: String,
    /// Number of distinct relevant articles.
    pub count: usize,
    /// Mean article score rounded to three decimals. 0.0 if no articles.
    pub average: f64,
    pub total: f64,
    /// Sources that hit an anti-bot challenge this run.
    pub interventions: Vec<InterventionNotice>,
    #[serde(skip)]
    pub reports: Vec<IngestReport>,
    #[serde(skip)]
    pub articles: Vec<Article>,
}
