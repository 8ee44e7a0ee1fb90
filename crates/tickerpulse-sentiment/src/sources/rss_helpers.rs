//! Shared RSS/Atom feed parsing and HTML stripping helpers.
//!
//! Used by [`super::rss`] and [`super::ticker_news`] so both read feeds the
//! same way.

use chrono::{DateTime, FixedOffset};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::SentimentError;

/// One `<item>` (RSS) or `<entry>` (Atom) from a feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct FeedItem {
    pub(crate) title: String,
    pub(crate) link: String,
    pub(crate) description: String,
    pub(crate) published: Option<DateTime<FixedOffset>>,
}

fn local_name(e: &BytesStart<'_>) -> String {
    let raw = e.local_name();
    std::str::from_utf8(raw.as_ref()).unwrap_or("").to_string()
}

fn href_attr(e: &BytesStart<'_>) -> Option<String> {
    let attr = e.try_get_attribute("href").ok()??;
    attr.unescape_value().ok().map(|v| v.trim().to_string())
}

fn is_item_tag(name: &str) -> bool {
    matches!(name, "item" | "entry")
}

fn is_body_tag(name: &str) -> bool {
    matches!(name, "description" | "summary" | "content")
}

/// RFC 2822 (`pubDate`) first, then RFC 3339 (Atom, Dublin Core).
pub(crate) fn parse_feed_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
}

/// Parse an RSS 2.0 or Atom feed into [`FeedItem`]s.
///
/// Items without both a title and a link are skipped. Stops after
/// `max_items` items have been collected.
///
/// # Errors
///
/// Returns [`SentimentError::Xml`] if the XML is malformed.
pub(crate) fn parse_feed(xml: &str, max_items: usize) -> Result<Vec<FeedItem>, SentimentError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut in_item = false;
    let mut in_body = false;
    let mut current_tag = String::new();
    let mut item = FeedItem::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = local_name(&e);
                if is_item_tag(&name) {
                    in_item = true;
                    in_body = false;
                    item = FeedItem::default();
                } else if in_item && is_body_tag(&name) {
                    in_body = true;
                } else if in_item && name == "link" && item.link.is_empty() {
                    if let Some(href) = href_attr(&e) {
                        item.link = href;
                    }
                }
                current_tag = name;
            }
            Ok(Event::Empty(e)) => {
                // Atom: <link href="..."/>
                if in_item && local_name(&e) == "link" && item.link.is_empty() {
                    if let Some(href) = href_attr(&e) {
                        item.link = href;
                    }
                }
            }
            Ok(Event::End(e)) => {
                let raw = e.local_name();
                let name = std::str::from_utf8(raw.as_ref()).unwrap_or("");
                if is_body_tag(name) {
                    in_body = false;
                }
                if is_item_tag(name) && in_item {
                    in_item = false;
                    item.description = strip_html(&item.description);
                    if !item.title.is_empty() && !item.link.is_empty() {
                        items.push(std::mem::take(&mut item));
                        if items.len() >= max_items {
                            break;
                        }
                    }
                }
                current_tag.clear();
            }
            Ok(Event::Text(e)) => {
                if in_item {
                    let text = e.unescape().unwrap_or_default().into_owned();
                    apply_text(&mut item, &current_tag, in_body, &text);
                }
            }
            Ok(Event::CData(e)) => {
                if in_item {
                    let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                    apply_text(&mut item, &current_tag, in_body, &text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(SentimentError::Xml(e)),
            _ => {}
        }
    }

    Ok(items)
}

fn apply_text(item: &mut FeedItem, tag: &str, in_body: bool, text: &str) {
    if in_body {
        // Accumulate every text node inside the body, including those emitted
        // after nested tags like <b>.
        if !item.description.is_empty() {
            item.description.push(' ');
        }
        item.description.push_str(text);
        return;
    }
    match tag {
        "title" => item.title = text.trim().to_string(),
        "link" => item.link = text.trim().to_string(),
        "pubDate" | "published" | "updated" | "date" => {
            if item.published.is_none() {
                item.published = parse_feed_date(text);
            }
        }
        _ => {}
    }
}

/// Strip HTML tags from a string and normalize whitespace.
pub(crate) fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
