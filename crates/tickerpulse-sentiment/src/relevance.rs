//! Entity relevance: keyword pre-filter plus zero-shot classification.

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tickerpulse_core::StockConfig;

use crate::error::SentimentError;

/// Default minimum confidence for a classifier-confirmed match.
pub const DEFAULT_RELEVANCE_THRESHOLD: f64 = 0.7;

/// Competing label offered to the classifier alongside the entity label.
pub const UNRELATED_LABEL: &str = "unrelated company or topic";

/// Hypothesis template sent with every classification request.
pub const HYPOTHESIS_TEMPLATE: &str = "This text is about {}.";

/// Corporate-form words dropped from the end of a company name.
const GENERIC_SUFFIXES: &[&str] = &[
    "inc",
    "incorporated",
    "corp",
    "corporation",
    "co",
    "company",
    "ltd",
    "limited",
    "plc",
    "llc",
    "lp",
    "sa",
    "ag",
    "nv",
    "se",
    "holdings",
    "holding",
    "group",
    "class",
    "a",
    "b",
    "c",
    "the",
];

/// Name tokens too common to identify a company on their own.
const COMMON_NAME_TOKENS: &[&str] = &[
    "advanced",
    "american",
    "digital",
    "energy",
    "financial",
    "general",
    "global",
    "industries",
    "international",
    "national",
    "networks",
    "services",
    "solutions",
    "systems",
    "technologies",
    "technology",
    "united",
];

/// Company name reduced to its distinctive keyword: lowercased, punctuation
/// removed, leading "the" and trailing corporate suffixes stripped.
///
/// `"NVIDIA Corporation"` becomes `"nvidia"`; `"Apple Inc."` becomes `"apple"`.
#[must_use]
pub fn name_keyword(company_name: &str) -> String {
    let normalized: String = company_name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '&' || c == '-' {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect();
    let mut tokens: Vec<&str> = normalized.split_whitespace().collect();

    while tokens.len() > 1 && tokens.last().is_some_and(|t| GENERIC_SUFFIXES.contains(t)) {
        tokens.pop();
    }
    if tokens.len() > 1 && tokens[0] == "the" {
        tokens.remove(0);
    }
    tokens.join(" ")
}

/// Whole-word pattern for `term`; case-insensitive unless `case_sensitive`.
fn word_pattern(term: &str, case_sensitive: bool) -> Option<Regex> {
    let flags = if case_sensitive { "" } else { "(?i)" };
    Regex::new(&format!(r"{flags}\b{}\b", regex::escape(term))).ok()
}

/// Compiled description of the stock a chunk must be about.
#[derive(Debug, Clone)]
pub struct TargetEntity {
    symbol: String,
    company_name: String,
    keyword: String,
    patterns: Vec<Regex>,
    fallback_patterns: Vec<Regex>,
}

impl TargetEntity {
    /// Build the matcher for `stock`.
    ///
    /// Symbols of one or two characters only match in their exact upper-case
    /// form, so `"ON"` does not match the English word "on".
    #[must_use]
    pub fn new(stock: &StockConfig) -> Self {
        let keyword = name_keyword(&stock.company_name);
        let mut patterns = Vec::new();
        if !stock.symbol.is_empty() {
            patterns.extend(word_pattern(&stock.symbol, stock.symbol.len() <= 2));
        }
        if !keyword.is_empty() {
            patterns.extend(word_pattern(&keyword, false));
        }

        let fallback_patterns = keyword
            .split_whitespace()
            .filter(|t| t.chars().count() >= 4 && !COMMON_NAME_TOKENS.contains(t))
            .filter_map(|t| word_pattern(t, false))
            .collect();

        Self {
            symbol: stock.symbol.clone(),
            company_name: stock.company_name.clone(),
            keyword,
            patterns,
            fallback_patterns,
        }
    }

    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    #[must_use]
    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    #[must_use]
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Classifier label for this entity, e.g. `"NVIDIA Corporation (NVDA)"`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} ({})", self.company_name, self.symbol)
    }

    /// Symbol or name keyword appears as a whole word in `text`.
    #[must_use]
    pub fn mentioned_in(&self, text: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(text))
    }

    fn mentioned_loosely_in(&self, text: &str) -> bool {
        self.fallback_patterns.iter().any(|p| p.is_match(text))
    }
}

/// Zero-shot classification output: candidate labels with their scores.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Classification {
    pub labels: Vec<String>,
    pub scores: Vec<f64>,
}

impl Classification {
    /// Highest-scoring label.
    #[must_use]
    pub fn top(&self) -> Option<(&str, f64)> {
        self.labels
            .iter()
            .zip(&self.scores)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(label, score)| (label.as_str(), *score))
    }

    #[must_use]
    pub fn score_of(&self, label: &str) -> Option<f64> {
        self.labels
            .iter()
            .position(|l| l == label)
            .and_then(|i| self.scores.get(i).copied())
    }
}

/// External zero-shot text classification capability.
#[async_trait]
pub trait ZeroShotClassifier: Send + Sync {
    /// Score `text` against each of `labels` using `hypothesis_template`.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Classifier`] when the model cannot be reached
    /// or returns an unusable response.
    async fn classify(
        &self,
        text: &str,
        labels: &[String],
        hypothesis_template: &str,
    ) -> Result<Classification, SentimentError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelevanceMethod {
    Keyword,
    Classifier,
    /// Classifier failed; distinctive name tokens decided.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelevanceVerdict {
    pub relevant: bool,
    /// In `[0.0, 1.0]`.
    pub confidence: f64,
    pub method: RelevanceMethod,
}

/// Decides whether a chunk is about a [`TargetEntity`].
pub struct RelevanceFilter {
    classifier: Option<Box<dyn ZeroShotClassifier>>,
    threshold: f64,
}

impl RelevanceFilter {
    #[must_use]
    pub fn new(classifier: Option<Box<dyn ZeroShotClassifier>>, threshold: f64) -> Self {
        Self {
            classifier,
            threshold,
        }
    }

    /// Keyword matching only; nothing is sent to a model.
    #[must_use]
    pub fn keyword_only() -> Self {
        Self::new(None, DEFAULT_RELEVANCE_THRESHOLD)
    }

    /// Judge `chunk` against `target`.
    ///
    /// A keyword hit short-circuits with confidence 1.0. Otherwise the
    /// classifier must rank the entity label first with a confidence above
    /// the threshold. Classifier failures never propagate.
    pub async fn assess(&self, chunk: &str, target: &TargetEntity) -> RelevanceVerdict {
        if target.mentioned_in(chunk) {
            return RelevanceVerdict {
                relevant: true,
                confidence: 1.0,
                method: RelevanceMethod::Keyword,
            };
        }

        let Some(classifier) = &self.classifier else {
            return RelevanceVerdict {
                relevant: false,
                confidence: 0.0,
                method: RelevanceMethod::Keyword,
            };
        };

        let entity_label = target.label();
        let labels = [entity_label.clone(), UNRELATED_LABEL.to_string()];
        match classifier.classify(chunk, &labels, HYPOTHESIS_TEMPLATE).await {
            Ok(classification) => {
                let confidence = classification.score_of(&entity_label).unwrap_or(0.0);
                let entity_wins = classification
                    .top()
                    .is_some_and(|(label, _)| label == entity_label);
                RelevanceVerdict {
                    relevant: entity_wins && confidence > self.threshold,
                    confidence: confidence.clamp(0.0, 1.0),
                    method: RelevanceMethod::Classifier,
                }
            }
            Err(e) => {
                tracing::warn!(
                    symbol = target.symbol(),
                    error = %e,
                    "relevance classifier failed; falling back to name tokens"
                );
                let relevant = target.mentioned_loosely_in(chunk);
                RelevanceVerdict {
                    relevant,
                    confidence: if relevant { 1.0 } else { 0.0 },
                    method: RelevanceMethod::Fallback,
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "relevance_test.rs"]
mod tests;
