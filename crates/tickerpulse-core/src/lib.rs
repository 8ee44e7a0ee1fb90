//! Shared configuration and domain descriptors for tickerpulse.

mod app_config;
mod config;
mod stocks;

use thiserror::Error;

pub use app_config::{AggregationMode, AppConfig, RedditCredentials, ScoreMapping};
pub use config::{build_app_config, load_app_config, load_app_config_from_env};
pub use stocks::{load_stocks, StockConfig, StocksFile};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read stocks file {path}: {source}")]
    StocksFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse stocks file: {0}")]
    StocksFileParse(#[source] serde_yaml::Error),

    #[error("stocks config validation failed: {0}")]
    Validation(String),
}
