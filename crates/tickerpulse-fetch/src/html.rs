//! HTML body-text and link extraction.

use std::sync::LazyLock;

use reqwest::Url;
use scraper::{Html, Selector};

static PARAGRAPH: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("valid paragraph selector"));
static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid anchor selector"));

/// An anchor found on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    /// Absolute URL (resolved against the page base when one is given).
    pub href: String,
    /// Visible anchor text, whitespace-normalized.
    pub text: String,
}

/// Concatenate the text of every `<p>` element, separated by single spaces.
///
/// Returns an empty string for pages without paragraphs.
#[must_use]
pub fn extract_paragraph_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let paragraphs: Vec<String> = document
        .select(&PARAGRAPH)
        .map(|p| normalize_whitespace(&p.text().collect::<String>()))
        .filter(|text| !text.is_empty())
        .collect();
    paragraphs.join(" ")
}

/// Collect `http(s)` anchors from `html`.
///
/// Relative hrefs are resolved against `base` when given and dropped
/// otherwise. Fragment-only, `mailto:` and `javascript:` links are skipped.
#[must_use]
pub fn extract_links(html: &str, base: Option<&str>) -> Vec<PageLink> {
    let base = base.and_then(|b| Url::parse(b).ok());
    let document = Html::parse_document(html);

    document
        .select(&ANCHOR)
        .filter_map(|a| {
            let href = a.value().attr("href")?.trim();
            if href.is_empty()
                || href.starts_with('#')
                || href.starts_with("mailto:")
                || href.starts_with("javascript:")
            {
                return None;
            }
            let resolved = match Url::parse(href) {
                Ok(url) => url,
                Err(_) => base.as_ref()?.join(href).ok()?,
            };
            if !matches!(resolved.scheme(), "http" | "https") {
                return None;
            }
            Some(PageLink {
                href: resolved.to_string(),
                text: normalize_whitespace(&a.text().collect::<String>()),
            })
        })
        .collect()
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
