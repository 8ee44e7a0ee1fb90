//! HTTP client for a hosted zero-shot classification endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SentimentError;
use crate::relevance::{Classification, ZeroShotClassifier};

/// Zero-shot classifier behind an inference-style JSON endpoint.
pub struct HttpZeroShotClassifier {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    inputs: &'a str,
    parameters: ClassifyParameters<'a>,
}

#[derive(Serialize)]
struct ClassifyParameters<'a> {
    candidate_labels: &'a [String],
    hypothesis_template: &'a str,
    multi_label: bool,
}

#[derive(Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

/// Endpoints answer either column-wise (`{labels, scores}`) or as a list of
/// `{label, score}` rows.
#[derive(Deserialize)]
#[serde(untagged)]
enum ClassifyResponse {
    Columns(Classification),
    Rows(Vec<LabelScore>),
}

impl From<ClassifyResponse> for Classification {
    fn from(response: ClassifyResponse) -> Self {
        match response {
            ClassifyResponse::Columns(classification) => classification,
            ClassifyResponse::Rows(rows) => {
                let (labels, scores) = rows.into_iter().map(|r| (r.label, r.score)).unzip();
                Classification { labels, scores }
            }
        }
    }
}

impl HttpZeroShotClassifier {
    /// `token` is sent as a bearer token when present.
    #[must_use]
    pub fn new(client: reqwest::Client, url: &str, token: Option<String>) -> Self {
        Self {
            client,
            url: url.to_string(),
            token,
        }
    }
}

impl std::fmt::Debug for HttpZeroShotClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpZeroShotClassifier")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "[redacted]"))
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ZeroShotClassifier for HttpZeroShotClassifier {
    async fn classify(
        &self,
        text: &str,
        labels: &[String],
        hypothesis_template: &str,
    ) -> Result<Classification, SentimentError> {
        let request = ClassifyRequest {
            inputs: text,
            parameters: ClassifyParameters {
                candidate_labels: labels,
                hypothesis_template,
                multi_label: false,
            },
        };

        let mut builder = self.client.post(&self.url).json(&request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| SentimentError::Classifier(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(SentimentError::Classifier(format!(
                "classifier returned status {}",
                response.status()
            )));
        }

        let parsed: ClassifyResponse = response
            .json()
            .await
            .map_err(|e| SentimentError::Classifier(format!("response parse error: {e}")))?;
        let classification = Classification::from(parsed);

        if classification.labels.len() != classification.scores.len()
            || classification.labels.is_empty()
        {
            return Err(SentimentError::Classifier(format!(
                "classifier returned {} labels and {} scores",
                classification.labels.len(),
                classification.scores.len()
            )));
        }

        Ok(classification)
    }
}
