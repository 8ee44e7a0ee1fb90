//! Sentence-respecting text chunking under a word budget.

use crate::sentences::{split_sentences, word_count};

/// Groups consecutive sentences into chunks of at most `max_tokens` words.
///
/// Sentences are never split. A single sentence longer than the budget is
/// emitted as its own chunk.
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    max_tokens: usize,
}

impl TextChunker {
    #[must_use]
    pub fn new(max_tokens: usize) -> Self {
        Self { max_tokens }
    }

    /// Split `text` into chunks, preserving source order.
    #[must_use]
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: Vec<String> = Vec::new();
        let mut current_words = 0;

        for sentence in split_sentences(text) {
            let words = word_count(&sentence);
            if !current.is_empty() && current_words + words > self.max_tokens {
                chunks.push(current.join(" "));
                current.clear();
                current_words = 0;
            }
            current_words += words;
            current.push(sentence);
        }

        if !current.is_empty() {
            chunks.push(current.join(" "));
        }
        chunks
    }
}
