//! Read-only `status` command.

use tickerpulse_cache::{CacheRecord, DailyCache};
use tickerpulse_core::AppConfig;

fn headline_count(record: &CacheRecord) -> usize {
    record
        .snapshot
        .get("news")
        .and_then(serde_json::Value::as_array)
        .map_or(0, Vec::len)
}

pub(crate) fn format_status_line(record: &CacheRecord) -> String {
    let (count, average) = match record.sentiment {
        Some(s) => (s.count.to_string(), format!("{:.3}", s.average)),
        None => ("-".to_string(), "-".to_string()),
    };
    format!(
        "{:<10}{:<12}{:<11}{:<10}{}",
        record.symbol,
        record.date.to_string(),
        headline_count(record),
        count,
        average
    )
}

/// Show today's cached snapshots and their sentiment summaries.
///
/// # Errors
///
/// Returns an error if the cache cannot be opened or queried.
pub(crate) async fn run_status(config: &AppConfig, symbol_filter: Option<&str>) -> anyhow::Result<()> {
    let pool = tickerpulse_cache::open(&config.database_url).await?;
    let cache = DailyCache::new(pool);

    let records = match symbol_filter {
        Some(symbol) => cache.record(symbol).await?.into_iter().collect(),
        None => cache.records_for_today().await?,
    };

    if records.is_empty() {
        println!(
            "no cached snapshots for {}{}; run `collect` first",
            cache.today(),
            symbol_filter
                .map(|s| format!(" and symbol '{s}'"))
                .unwrap_or_default()
        );
        return Ok(());
    }

    println!("{:<10}{:<12}{:<11}{:<10}AVERAGE", "SYMBOL", "DATE", "HEADLINES", "ARTICLES");
    for record in &records {
        println!("{}", format_status_line(record));
    }

    Ok(())
}
