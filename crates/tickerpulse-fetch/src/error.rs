use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("page not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// An anti-bot challenge was served instead of the page. Not retried;
    /// the caller decides whether to skip the source or escalate.
    #[error("manual intervention required for {url}: {reason}")]
    ManualInterventionRequired { url: String, reason: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl FetchError {
    #[must_use]
    pub fn is_manual_intervention(&self) -> bool {
        matches!(self, FetchError::ManualInterventionRequired { .. })
    }
}
