use crate::app_config::{AggregationMode, AppConfig, RedditCredentials, ScoreMapping};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files. Useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a `HashMap`.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = or_default("TICKERPULSE_DATABASE_URL", "sqlite://tickerpulse.db?mode=rwc");
    let stocks_path = PathBuf::from(or_default(
        "TICKERPULSE_STOCKS_PATH",
        "./config/stocks.yaml",
    ));
    let log_level = or_default("TICKERPULSE_LOG_LEVEL", "info");

    let requests_per_second = parse_u32("TICKERPULSE_REQUESTS_PER_SECOND", "10")?;
    let fetch_timeout_secs = parse_u64("TICKERPULSE_FETCH_TIMEOUT_SECS", "30")?;
    let fetch_user_agent = or_default(
        "TICKERPULSE_FETCH_USER_AGENT",
        "tickerpulse/0.1 (news-sentiment)",
    );
    let fetch_max_retries = parse_u32("TICKERPULSE_FETCH_MAX_RETRIES", "3")?;
    let fetch_backoff_base_secs = parse_u64("TICKERPULSE_FETCH_BACKOFF_BASE_SECS", "2")?;

    let chunk_max_tokens = parse_usize("TICKERPULSE_CHUNK_MAX_TOKENS", "512")?;
    if chunk_max_tokens == 0 {
        return Err(invalid(
            "TICKERPULSE_CHUNK_MAX_TOKENS",
            "must be greater than zero".to_string(),
        ));
    }
    let scorer_max_words = parse_usize("TICKERPULSE_SCORER_MAX_WORDS", "512")?;

    let relevance_threshold = parse_threshold(&or_default("TICKERPULSE_RELEVANCE_THRESHOLD", "0.7"))?;
    let aggregation_mode = parse_aggregation_mode(&or_default("TICKERPULSE_AGGREGATION_MODE", "mean"))?;
    let sentiment_mapping =
        parse_score_mapping(&or_default("TICKERPULSE_SENTIMENT_MAPPING", "binary"))?;

    let classifier_url = optional("TICKERPULSE_CLASSIFIER_URL");
    let sentiment_url = optional("TICKERPULSE_SENTIMENT_URL");
    let inference_token = optional("TICKERPULSE_INFERENCE_TOKEN");
    let search_url = optional("TICKERPULSE_SEARCH_URL");

    let reddit = match (
        optional("REDDIT_CLIENT_ID"),
        optional("REDDIT_CLIENT_SECRET"),
        optional("REDDIT_USER_AGENT"),
    ) {
        (Some(client_id), Some(client_secret), Some(user_agent)) => Some(RedditCredentials {
            client_id,
            client_secret,
            user_agent,
        }),
        _ => None,
    };
    let twitter_bearer_token = optional("TWITTER_BEARER_TOKEN");

    Ok(AppConfig {
        database_url,
        stocks_path,
        log_level,
        requests_per_second,
        fetch_timeout_secs,
        fetch_user_agent,
        fetch_max_retries,
        fetch_backoff_base_secs,
        chunk_max_tokens,
        scorer_max_words,
        relevance_threshold,
        aggregation_mode,
        sentiment_mapping,
        classifier_url,
        sentiment_url,
        inference_token,
        search_url,
        reddit,
        twitter_bearer_token,
    })
}

fn parse_threshold(raw: &str) -> Result<f64, ConfigError> {
    let var = "TICKERPULSE_RELEVANCE_THRESHOLD";
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("{value} is outside [0, 1]"),
        });
    }
    Ok(value)
}

fn parse_aggregation_mode(raw: &str) -> Result<AggregationMode, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "mean" => Ok(AggregationMode::Mean),
        "length_weighted" | "length-weighted" | "weighted" => Ok(AggregationMode::LengthWeighted),
        other => Err(ConfigError::InvalidEnvVar {
            var: "TICKERPULSE_AGGREGATION_MODE".to_string(),
            reason: format!("unknown aggregation mode '{other}'; expected mean or length_weighted"),
        }),
    }
}

fn parse_score_mapping(raw: &str) -> Result<ScoreMapping, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "binary" => Ok(ScoreMapping::Binary),
        "signed" => Ok(ScoreMapping::Signed),
        other => Err(ConfigError::InvalidEnvVar {
            var: "TICKERPULSE_SENTIMENT_MAPPING".to_string(),
            reason: format!("unknown mapping '{other}'; expected binary or signed"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
