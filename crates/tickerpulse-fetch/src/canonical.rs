//! URL canonicalization shared by sources and the article assembler.

use reqwest::Url;

/// Canonical form of an article URL: query string and fragment removed.
///
/// Returns `None` for anything that is not an absolute `http(s)` URL.
#[must_use]
pub fn canonicalize_url(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_query(None);
    url.set_fragment(None);
    Some(url.to_string())
}

/// Returns `true` when `url`'s host is `domain` or a subdomain of it.
#[must_use]
pub fn host_matches(url: &str, domain: &str) -> bool {
    let domain = domain
        .trim()
        .trim_start_matches("www.")
        .to_ascii_lowercase();
    if domain.is_empty() {
        return false;
    }
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        .is_some_and(|host| host == domain || host.ends_with(&format!(".{domain}")))
}

/// Host portion of `url`, or the raw string when it does not parse.
pub(crate) fn extract_domain(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| url.to_owned())
}
