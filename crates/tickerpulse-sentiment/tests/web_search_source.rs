//! Integration tests for `WebSearchSource` over HTTP against a mocked search endpoint.

use tickerpulse_core::StockConfig;
use tickerpulse_fetch::{HttpPageFetcher, RateLimitedFetcher};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tickerpulse_sentiment::{Candidate, RetrievalSource, WebSearchSource};

fn fetcher() -> RateLimitedFetcher {
    RateLimitedFetcher::new(
        HttpPageFetcher::new(5, "tickerpulse-test/0.1", 0, 0).expect("fetcher"),
        0,
    )
}

fn nvda() -> StockConfig {
    StockConfig::new("NVDA", "NVIDIA Corporation")
}

#[tokio::test]
async fn results_page_yields_links_on_domain() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "site:fool.com NVDA NVIDIA Corporation"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
                <a href="https://www.fool.com/investing/2025/10/15/nvidia-stock/">Nvidia stock</a>
                <a href="https://www.example.com/elsewhere/">Elsewhere</a>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let source =
        WebSearchSource::new("fool.com").with_search_url(&format!("{}/search", server.uri()));
    let candidates = source.fetch_candidates(&nvda(), &mut fetcher()).await.unwrap();

    assert_eq!(
        candidates,
        vec![Candidate::link(
            "Nvidia stock",
            "https://www.fool.com/investing/2025/10/15/nvidia-stock/"
        )]
    );
}

#[tokio::test]
async fn block_page_surfaces_as_manual_intervention() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><body><p>Our systems have detected unusual traffic from your computer network.</p></body></html>",
        ))
        .mount(&server)
        .await;

    let source =
        WebSearchSource::new("fool.com").with_search_url(&format!("{}/search", server.uri()));
    let err = source
        .fetch_candidates(&nvda(), &mut fetcher())
        .await
        .unwrap_err();
    assert!(err.as_manual_intervention().is_some(), "got: {err:?}");
}
