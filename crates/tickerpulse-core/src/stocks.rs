use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One entry of the stock universe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockConfig {
    /// Exchange ticker, e.g. `NVDA`.
    pub symbol: String,
    /// Human-readable company name used in relevance prompts.
    pub company_name: String,
}

impl StockConfig {
    #[must_use]
    pub fn new(symbol: &str, company_name: &str) -> Self {
        Self {
            symbol: symbol.trim().to_ascii_uppercase(),
            company_name: company_name.trim().to_string(),
        }
    }
}

/// Top-level shape of `stocks.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StocksFile {
    pub stocks: Vec<StockConfig>,
    /// Shared RSS feeds searched for every stock, in order.
    #[serde(default)]
    pub feeds: Vec<String>,
    /// Domains queried with a site-restricted web search for every stock.
    #[serde(default)]
    pub search_domains: Vec<String>,
}

impl StocksFile {
    /// Find a stock by symbol, ignoring case.
    #[must_use]
    pub fn find(&self, symbol: &str) -> Option<&StockConfig> {
        self.stocks
            .iter()
            .find(|s| s.symbol.eq_ignore_ascii_case(symbol.trim()))
    }
}

/// Load and validate the stock universe from a YAML file.
///
/// Symbols are upper-cased on load.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_stocks(path: &Path) -> Result<StocksFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::StocksFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_stocks(&content)
}

fn parse_stocks(content: &str) -> Result<StocksFile, ConfigError> {
    let mut stocks_file: StocksFile =
        serde_yaml::from_str(content).map_err(ConfigError::StocksFileParse)?;

    for stock in &mut stocks_file.stocks {
        *stock = StockConfig::new(&stock.symbol, &stock.company_name);
    }

    validate_stocks(&stocks_file)?;

    Ok(stocks_file)
}

fn validate_stocks(stocks_file: &StocksFile) -> Result<(), ConfigError> {
    let mut seen_symbols = HashSet::new();

    for stock in &stocks_file.stocks {
        if stock.symbol.is_empty() {
            return Err(ConfigError::Validation(
                "stock symbol must be non-empty".to_string(),
            ));
        }

        if !stock
            .symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        {
            return Err(ConfigError::Validation(format!(
                "stock symbol '{}' contains invalid characters",
                stock.symbol
            )));
        }

        if stock.company_name.is_empty() {
            return Err(ConfigError::Validation(format!(
                "stock '{}' has an empty company_name",
                stock.symbol
            )));
        }

        if !seen_symbols.insert(stock.symbol.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate stock symbol: '{}'",
                stock.symbol
            )));
        }
    }

    for feed in &stocks_file.feeds {
        if !(feed.starts_with("http://") || feed.starts_with("https://")) {
            return Err(ConfigError::Validation(format!(
                "feed url '{feed}' must start with http:// or https://"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "stocks_test.rs"]
mod tests;
