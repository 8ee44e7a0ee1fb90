//! Reddit helpers: query building and post conversion.

use std::collections::HashSet;

use super::reddit::Post;
use crate::article::Candidate;

const SELFTEXT_SNIPPET_CHARS: usize = 2000;

/// Search queries for a stock, most specific first, without case-insensitive
/// duplicates.
pub(super) fn build_query_variants(symbol: &str, name_keyword: &str) -> Vec<String> {
    let mut variants = vec![format!("\"{symbol}\""), format!("${symbol}")];
    if !name_keyword.is_empty() {
        variants.push(format!("\"{name_keyword}\""));
    }

    // Collapse duplicates while preserving order.
    let mut seen = HashSet::new();
    variants.retain(|q| seen.insert(q.to_lowercase()));
    variants
}

fn usable_body(body: Option<&str>) -> Option<&str> {
    body.map(str::trim)
        .filter(|b| !b.is_empty() && *b != "[deleted]" && *b != "[removed]")
}

/// Convert a listing post into an inline-text candidate.
///
/// Posts without a permalink or title are skipped.
pub(super) fn to_candidate(post: &Post) -> Option<Candidate> {
    let permalink = post.data.permalink.as_ref()?;
    let url = format!("https://www.reddit.com{permalink}");

    let title = post
        .data
        .title
        .as_deref()
        .map(str::trim)
        .filter(|title| !title.is_empty())?;

    // A blank line keeps the title a sentence of its own when chunked.
    let text = match usable_body(post.data.selftext.as_deref()) {
        Some(body) => {
            let snippet: String = body.chars().take(SELFTEXT_SNIPPET_CHARS).collect();
            format!("{title}\n\n{snippet}")
        }
        None => title.to_string(),
    };

    Some(Candidate::text(title, url, text))
}
