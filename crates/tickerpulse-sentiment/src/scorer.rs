//! Chunk sentiment scoring: the scorer contract, an HTTP model client and an
//! offline financial-news lexicon.

use std::borrow::Cow;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tickerpulse_core::ScoreMapping;

use crate::error::SentimentError;

/// External text sentiment capability returning a signed score.
#[async_trait]
pub trait SentimentScorer: Send + Sync {
    /// Score `text`. Positive values are bullish, negative bearish.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Scorer`] when no score can be produced.
    async fn score(&self, text: &str) -> Result<f64, SentimentError>;
}

/// Keep at most the first `max_words` words of `text`; `0` disables truncation.
#[must_use]
pub fn truncate_words(text: &str, max_words: usize) -> Cow<'_, str> {
    if max_words == 0 || text.split_whitespace().nth(max_words).is_none() {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.split_whitespace()
            .take(max_words)
            .collect::<Vec<_>>()
            .join(" "),
    )
}

/// Polarity of a model label: `+1.0`, `-1.0`, or `0.0` for neutral/unknown.
fn label_polarity(label: &str) -> f64 {
    let label = label.trim().to_ascii_lowercase();
    if label.starts_with("pos") || label == "bullish" {
        1.0
    } else if label.starts_with("neg") || label == "bearish" {
        -1.0
    } else {
        0.0
    }
}

/// Convert a `(label, confidence)` prediction into a signed score.
#[must_use]
pub fn map_label(label: &str, confidence: f64, mapping: ScoreMapping) -> f64 {
    let polarity = label_polarity(label);
    match mapping {
        ScoreMapping::Binary => polarity,
        ScoreMapping::Signed => polarity * confidence.clamp(0.0, 1.0),
    }
}

/// Sentiment model behind an inference-style JSON endpoint.
pub struct HttpSentimentScorer {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
    mapping: ScoreMapping,
}

#[derive(Serialize)]
struct ScoreRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

/// Endpoints return either `[{label, score}]` or one such list per input.
#[derive(Deserialize)]
#[serde(untagged)]
enum ScoreResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

impl ScoreResponse {
    fn into_best(self) -> Option<LabelScore> {
        let rows = match self {
            Self::Nested(batches) => batches.into_iter().next()?,
            Self::Flat(rows) => rows,
        };
        rows.into_iter().max_by(|a, b| a.score.total_cmp(&b.score))
    }
}

impl HttpSentimentScorer {
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        url: &str,
        token: Option<String>,
        mapping: ScoreMapping,
    ) -> Self {
        Self {
            client,
            url: url.to_string(),
            token,
            mapping,
        }
    }
}

impl std::fmt::Debug for HttpSentimentScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSentimentScorer")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "[redacted]"))
            .field("mapping", &self.mapping)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SentimentScorer for HttpSentimentScorer {
    async fn score(&self, text: &str) -> Result<f64, SentimentError> {
        let mut builder = self.client.post(&self.url).json(&ScoreRequest { inputs: text });
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| SentimentError::Scorer(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(SentimentError::Scorer(format!(
                "sentiment model returned status {}",
                response.status()
            )));
        }

        let parsed: ScoreResponse = response
            .json()
            .await
            .map_err(|e| SentimentError::Scorer(format!("response parse error: {e}")))?;
        let best = parsed
            .into_best()
            .ok_or_else(|| SentimentError::Scorer("sentiment model returned no labels".to_string()))?;

        Ok(map_label(&best.label, best.score, self.mapping))
    }
}

/// Financial-news word weights.
///
/// Keys are lowercase single words. Values in `(0.0, 1.0]` are positive,
/// in `[-1.0, 0.0)` are negative. The final score is clamped to `[-1.0, 1.0]`.
pub(crate) const LEXICON: &[(&str, f64)] = &[
    // Positive signals
    ("beat", 0.5),
    ("beats", 0.5),
    ("surge", 0.5),
    ("surged", 0.5),
    ("soar", 0.5),
    ("soared", 0.5),
    ("rally", 0.4),
    ("rallied", 0.4),
    ("gain", 0.3),
    ("gains", 0.3),
    ("rose", 0.3),
    ("record", 0.4),
    ("growth", 0.3),
    ("profit", 0.3),
    ("upgrade", 0.5),
    ("upgraded", 0.5),
    ("outperform", 0.5),
    ("bullish", 0.5),
    ("strong", 0.3),
    ("raised", 0.3),
    ("exceeded", 0.4),
    ("optimistic", 0.4),
    ("dividend", 0.2),
    ("buyback", 0.3),
    // Negative signals
    ("miss", -0.5),
    ("missed", -0.5),
    ("plunge", -0.6),
    ("plunged", -0.6),
    ("slump", -0.5),
    ("tumble", -0.5),
    ("tumbled", -0.5),
    ("fell", -0.3),
    ("loss", -0.4),
    ("losses", -0.4),
    ("downgrade", -0.5),
    ("downgraded", -0.5),
    ("underperform", -0.5),
    ("bearish", -0.5),
    ("weak", -0.3),
    ("cut", -0.3),
    ("lawsuit", -0.5),
    ("probe", -0.4),
    ("investigation", -0.4),
    ("recall", -0.6),
    ("fraud", -0.7),
    ("bankruptcy", -0.8),
    ("layoffs", -0.4),
    ("warning", -0.4),
];

/// Score a text string using the financial lexicon.
///
/// Splits text into lowercase words, sums matching weights, and clamps
/// the result to `[-1.0, 1.0]`. Returns `0.0` for empty or unknown text.
#[must_use]
pub fn lexicon_score(text: &str) -> f64 {
    let mut score = 0.0_f64;
    for word in text.split_whitespace() {
        let w = word
            .trim_matches(|c: char| !c.is_alphabetic())
            .to_lowercase();
        for &(lex_word, weight) in LEXICON {
            if w == lex_word {
                score += weight;
                break;
            }
        }
    }
    score.clamp(-1.0, 1.0)
}

/// Offline scorer used when no sentiment endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconScorer;

#[async_trait]
impl SentimentScorer for LexiconScorer {
    async fn score(&self, text: &str) -> Result<f64, SentimentError> {
        Ok(lexicon_score(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_returns_zero() {
        assert_eq!(lexicon_score(""), 0.0);
    }

    #[test]
    fn unknown_text_returns_zero() {
        assert_eq!(lexicon_score("the quick brown fox"), 0.0);
    }

    #[test]
    fn positive_keyword_returns_positive() {
        let score = lexicon_score("Nvidia beat estimates");
        assert!(score > 0.0, "expected positive score, got {score}");
    }

    #[test]
    fn negative_keyword_returns_negative() {
        let score = lexicon_score("analysts downgraded the stock");
        assert!(score < 0.0, "expected negative score, got {score}");
    }

    #[test]
    fn score_clamps_to_both_ends() {
        let up = lexicon_score("beat surged soared record upgrade outperform bullish");
        assert_eq!(up, 1.0, "expected score clamped to 1.0, got {up}");
        let down = lexicon_score("missed plunged fraud bankruptcy downgrade recall");
        assert_eq!(down, -1.0, "expected score clamped to -1.0, got {down}");
    }

    #[test]
    fn punctuation_stripped_from_words() {
        let score = lexicon_score("Shares soared!");
        assert!(score > 0.0, "expected positive score for 'soared!', got {score}");
    }

    #[tokio::test]
    async fn lexicon_scorer_delegates_to_lexicon() {
        let score = LexiconScorer.score("revenue missed").await.unwrap();
        assert!((score - -0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn binary_mapping_ignores_confidence() {
        assert_eq!(map_label("POSITIVE", 0.6, ScoreMapping::Binary), 1.0);
        assert_eq!(map_label("negative", 0.99, ScoreMapping::Binary), -1.0);
        assert_eq!(map_label("neutral", 0.9, ScoreMapping::Binary), 0.0);
    }

    #[test]
    fn signed_mapping_scales_by_confidence() {
        assert!((map_label("Positive", 0.8, ScoreMapping::Signed) - 0.8).abs() < f64::EPSILON);
        assert!((map_label("bearish", 0.25, ScoreMapping::Signed) + 0.25).abs() < f64::EPSILON);
        assert_eq!(map_label("POSITIVE", 1.7, ScoreMapping::Signed), 1.0);
    }

    #[test]
    fn truncate_words_keeps_prefix() {
        assert_eq!(truncate_words("a b c d", 2), "a b");
        assert!(matches!(truncate_words("a b", 2), Cow::Borrowed("a b")));
        assert_eq!(truncate_words("a  b c", 0), "a  b c");
    }
}
