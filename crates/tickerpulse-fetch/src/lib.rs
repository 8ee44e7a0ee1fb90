//! Page retrieval for tickerpulse: a rate-limited, per-run cached fetcher over
//! a pluggable [`PageFetcher`], plus HTML text and link extraction.

pub mod canonical;
pub mod client;
pub mod error;
pub mod fetcher;
pub mod html;

mod retry;

pub use canonical::{canonicalize_url, host_matches};
pub use client::HttpPageFetcher;
pub use error::FetchError;
pub use fetcher::{PageFetcher, RateLimitedFetcher};
pub use html::{extract_links, extract_paragraph_text, PageLink};
