use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::canonical::extract_domain;
use crate::error::FetchError;
use crate::fetcher::PageFetcher;
use crate::html::extract_paragraph_text;
use crate::retry::retry_with_backoff;

/// Lower-cased markers of an anti-bot interstitial that replaces the
/// requested page.
const INTERSTITIAL_MARKERS: &[(&str, &str)] = &[
    ("unusual traffic from your computer network", "unusual traffic interstitial"),
    ("are you a robot", "robot check"),
    ("captcha-delivery.com", "captcha challenge"),
    ("cf-challenge", "Cloudflare challenge"),
    ("challenges.cloudflare.com", "Cloudflare challenge"),
    ("/sorry/index", "search engine block page"),
];

/// Lower-cased markers of an embedded CAPTCHA widget. Articles carry these
/// in newsletter and comment forms, so they only count on pages without
/// paragraph text.
const WIDGET_MARKERS: &[(&str, &str)] = &[
    ("g-recaptcha", "reCAPTCHA challenge"),
    ("h-captcha", "hCaptcha challenge"),
    ("px-captcha", "captcha challenge"),
];

/// HTTP implementation of [`PageFetcher`].
///
/// Applies a request timeout and `User-Agent`, maps statuses to typed
/// errors, detects anti-bot challenge pages, and retries transient failures
/// (429, network errors) with exponential backoff.
pub struct HttpPageFetcher {
    client: Client,
    /// Maximum number of retry attempts after the first failure.
    max_retries: u32,
    /// Base delay in seconds for exponential backoff: `backoff_base_secs * 2^attempt`.
    backoff_base_secs: u64,
}

impl HttpPageFetcher {
    /// Creates an `HttpPageFetcher` with configured timeout, `User-Agent`, and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_secs,
        })
    }

    async fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(60);

        let body = response.text().await?;

        if let Some(reason) = detect_challenge(&body) {
            return Err(FetchError::ManualInterventionRequired {
                url: url.to_owned(),
                reason: reason.to_owned(),
            });
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited {
                domain: extract_domain(url),
                retry_after_secs,
            });
        }

        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound {
                url: url.to_owned(),
            });
        }

        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;

        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            self.fetch_once(url)
        })
        .await
    }
}

/// Returns a short reason if `body` looks like an anti-bot challenge page.
pub(crate) fn detect_challenge(body: &str) -> Option<&'static str> {
    let lower = body.to_lowercase();
    let find = |markers: &[(&'static str, &'static str)]| {
        markers
            .iter()
            .find(|(marker, _)| lower.contains(marker))
            .map(|(_, reason)| *reason)
    };

    if let Some(reason) = find(INTERSTITIAL_MARKERS) {
        return Some(reason);
    }
    find(WIDGET_MARKERS).filter(|_| extract_paragraph_text(body).is_empty())
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
