use super::*;
use crate::article::{Candidate, ScoredChunk};
use crate::test_support::{assembler, page, StaticPages, StaticSource, WordScorer};

fn nvda() -> StockAggregator {
    StockAggregator::new(
        StockConfig::new("NVDA", "NVIDIA Corporation"),
        AggregationMode::Mean,
    )
}

fn article(url: &str, source: &str, score: f64) -> Article {
    Article::new(
        "title",
        url,
        source,
        vec![ScoredChunk {
            text: "NVIDIA news".to_string(),
            score,
        }],
    )
}

#[test]
fn zero_articles_average_is_zero() {
    let stock = nvda();
    assert_eq!(stock.sentiment_count(), 0);
    assert_eq!(stock.average_sentiment(), 0.0);
    assert_eq!(stock.total_sentiment(), 0.0);
}

#[test]
fn average_of_positive_and_negative_articles() {
    let mut stock = nvda();
    assert!(stock.insert(article("https://test.com/nvidia-positive", "rss", 1.0)));
    assert!(stock.insert(article("https://test.com/nvidia-negative", "rss", -0.5)));
    assert_eq!(stock.sentiment_count(), 2);
    assert!((stock.total_sentiment() - 0.5).abs() < f64::EPSILON);
    assert!((stock.average_sentiment() - 0.25).abs() < f64::EPSILON);
}

#[test]
fn average_is_rounded_to_three_decimals() {
    let mut stock = nvda();
    stock.insert(article("https://a.com/1", "rss", 1.0));
    stock.insert(article("https://a.com/2", "rss", 0.0));
    stock.insert(article("https://a.com/3", "rss", 0.0));
    assert!((stock.average_sentiment() - 0.333).abs() < f64::EPSILON);
}

#[test]
fn insert_keeps_first_article_for_a_url() {
    let mut stock = nvda();
    assert!(stock.insert(article("https://test.com/a", "rss", 1.0)));
    assert!(!stock.insert(article("https://test.com/a", "web_search", -1.0)));
    assert_eq!(stock.sentiment_count(), 1);
    assert_eq!(stock.articles()[0].source(), "rss");
}

#[tokio::test]
async fn same_url_from_two_sources_is_kept_once() {
    let url = "https://test.com/nvidia-positive";
    let pages = StaticPages::default().with_page(url, &page(&["NVIDIA beat estimates."]));
    let calls = pages.calls();
    let mut fetcher = pages.into_fetcher();
    let assembler = assembler(WordScorer);

    let rss = StaticSource::new("rss", vec![Candidate::link("Nvidia wins", url)]);
    let web = StaticSource::new(
        "web_search",
        vec![Candidate::link("Nvidia wins", format!("{url}?ref=search"))],
    );

    let mut stock = nvda();
    let first = stock.ingest(&rss, &assembler, &mut fetcher).await;
    let second = stock.ingest(&web, &assembler, &mut fetcher).await;

    assert_eq!(first.added, 1);
    assert_eq!(second.added, 0);
    assert_eq!(second.duplicates, 1);
    assert_eq!(stock.sentiment_count(), 1);
    assert_eq!(stock.articles()[0].source(), "rss");
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failing_source_contributes_nothing() {
    let mut fetcher = StaticPages::default().into_fetcher();
    let mut stock = nvda();
    let report = stock
        .ingest(&StaticSource::failing("reddit"), &assembler(WordScorer), &mut fetcher)
        .await;
    assert_eq!(report, IngestReport::empty("reddit"));
    assert_eq!(stock.sentiment_count(), 0);
}

#[tokio::test]
async fn challenge_stops_the_source_and_is_reported() {
    let ok = "https://test.com/first";
    let blocked = "https://test.com/blocked";
    let later = "https://test.com/later";
    let mut fetcher = StaticPages::default()
        .with_page(ok, &page(&["NVIDIA beat estimates."]))
        .with_challenge(blocked)
        .with_page(later, &page(&["NVIDIA missed on margins."]))
        .into_fetcher();
    let source = StaticSource::new(
        "web_search",
        vec![
            Candidate::link("first", ok),
            Candidate::link("blocked", blocked),
            Candidate::link("later", later),
        ],
    );

    let mut stock = nvda();
    let report = stock
        .ingest(&source, &assembler(WordScorer), &mut fetcher)
        .await;

    assert_eq!(report.candidates, 3);
    assert_eq!(report.added, 1);
    assert_eq!(
        report.intervention,
        Some(InterventionNotice {
            source: "web_search".to_string(),
            url: blocked.to_string(),
            reason: "unusual traffic interstitial".to_string(),
        })
    );
    assert!(!fetcher.is_cached(later));
}

#[tokio::test]
async fn irrelevant_candidates_are_not_counted() {
    let url = "https://test.com/oil";
    let mut fetcher = StaticPages::default()
        .with_page(url, &page(&["Crude rallied."]))
        .into_fetcher();
    let source = StaticSource::new("rss", vec![Candidate::link("Oil", url)]);

    let mut stock = nvda();
    let report = stock
        .ingest(&source, &assembler(WordScorer), &mut fetcher)
        .await;
    assert_eq!(report.candidates, 1);
    assert_eq!(report.added, 0);
    assert_eq!(report.duplicates, 0);
    assert_eq!(stock.average_sentiment(), 0.0);
}
