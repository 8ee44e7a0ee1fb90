use thiserror::Error;
use tickerpulse_fetch::FetchError;

#[derive(Debug, Error)]
pub enum SentimentError {
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("classifier error: {0}")]
    Classifier(String),

    #[error("sentiment scorer error: {0}")]
    Scorer(String),

    #[error("Reddit API error: {0}")]
    Reddit(String),

    #[error("Twitter API error: {0}")]
    Twitter(String),

    #[error("missing credentials: {0}")]
    MissingCredentials(String),
}

impl SentimentError {
    /// The manual-intervention fetch outcome wrapped by this error, if any.
    #[must_use]
    pub fn as_manual_intervention(&self) -> Option<&FetchError> {
        match self {
            Self::Fetch(e) if e.is_manual_intervention() => Some(e),
            _ => None,
        }
    }
}
