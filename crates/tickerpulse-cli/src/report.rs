//! CSV report sink: one row per stock per run.

use std::io::Write;

use serde::Serialize;
use tickerpulse_sentiment::StockSentimentResult;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ReportRow {
    pub(crate) symbol: String,
    pub(crate) company_name: String,
    pub(crate) sentiment_count: usize,
    pub(crate) average_sentiment: f64,
    /// Whether the day's snapshot came from the cache.
    pub(crate) cached: bool,
    /// `source@url` for every source stopped by a challenge, `;`-separated.
    pub(crate) interventions: String,
}

impl ReportRow {
    pub(crate) fn from_result(result: &StockSentimentResult, cached: bool) -> Self {
        let interventions = result
            .interventions
            .iter()
            .map(|n| format!("{}@{}", n.source, n.url))
            .collect::<Vec<_>>()
            .join(";");
        Self {
            symbol: result.symbol.clone(),
            company_name: result.company_name.clone(),
            sentiment_count: result.count,
            average_sentiment: result.average,
            cached,
            interventions,
        }
    }
}

/// Serialize `rows` as CSV with a header line.
///
/// # Errors
///
/// Returns an error if serialization or the underlying write fails.
pub(crate) fn write_report<W: Write>(writer: W, rows: &[ReportRow]) -> anyhow::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}
