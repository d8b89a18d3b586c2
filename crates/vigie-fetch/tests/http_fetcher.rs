//! `HttpFetcher` against a local mock server.
//!
//! Every failure mode must come back as a `FetchResult`, never as a panic or
//! an `Err`.

use std::time::Duration;

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vigie_core::HttpConfig;
use vigie_fetch::{FetchOptions, Fetcher, HttpFetcher, ACCEPT_XML};

fn fetcher() -> HttpFetcher {
    HttpFetcher::new(&HttpConfig::default()).expect("build fetcher")
}

#[tokio::test]
async fn fetch_success_captures_body_and_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .insert_header("link", "</api/>; rel=\"https://api.w.org/\"")
                .set_body_string("<html><body>ok</body></html>"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/", server.uri());
    let result = fetcher()
        .fetch(&url, &FetchOptions::with_timeout_ms(2000))
        .await;

    assert!(result.is_success());
    assert_eq!(result.status_code, 200);
    assert_eq!(result.content, "<html><body>ok</body></html>");
    assert_eq!(result.media_type().as_deref(), Some("text/html"));
    assert_eq!(
        result.header("Link"),
        Some("</api/>; rel=\"https://api.w.org/\"")
    );
    assert!(!result.truncated);
}

#[tokio::test]
async fn fetch_sends_accept_header() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .and(header("accept", ACCEPT_XML))
        .respond_with(ResponseTemplate::new(200).set_body_string("<urlset/>"))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/sitemap.xml", server.uri());
    let result = fetcher()
        .fetch(&url, &FetchOptions::with_timeout_ms(2000).with_accept(ACCEPT_XML))
        .await;

    assert!(result.is_success());
    assert_eq!(result.content, "<urlset/>");
}

#[tokio::test]
async fn fetch_error_status_is_data() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
        .mount(&server)
        .await;

    let url = format!("{}/missing", server.uri());

    let dropped = fetcher()
        .fetch(&url, &FetchOptions::with_timeout_ms(2000))
        .await;
    assert_eq!(dropped.status_code, 404);
    assert_eq!(dropped.error.as_deref(), Some("HTTP 404"));
    assert!(dropped.content.is_empty());

    let kept = fetcher()
        .fetch(&url, &FetchOptions::with_timeout_ms(2000).keep_error_body())
        .await;
    assert_eq!(kept.status_code, 404);
    assert_eq!(kept.content, "not here");
    assert!(!kept.is_success());
}

#[tokio::test]
async fn fetch_timeout_is_data() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_millis(800)),
        )
        .mount(&server)
        .await;

    let url = format!("{}/slow", server.uri());
    let result = fetcher()
        .fetch(&url, &FetchOptions::with_timeout_ms(100))
        .await;

    assert!(!result.is_success());
    assert_eq!(result.status_code, 0);
    assert_eq!(result.error.as_deref(), Some("timeout after 100 ms"));
}

#[tokio::test]
async fn fetch_truncates_at_max_bytes() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/big.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string("a".repeat(10_000)))
        .mount(&server)
        .await;

    let url = format!("{}/big.xml", server.uri());
    let result = fetcher()
        .fetch(&url, &FetchOptions::with_timeout_ms(2000).with_max_bytes(1_000))
        .await;

    assert!(result.is_success());
    assert!(result.truncated);
    assert_eq!(result.content.len(), 1_000);
}

#[tokio::test]
async fn fetch_refused_connection_is_data() {
    // Port 9 (discard) on localhost is not expected to accept connections.
    let result = fetcher()
        .fetch("http://127.0.0.1:9/", &FetchOptions::with_timeout_ms(1000))
        .await;

    assert!(!result.is_success());
    assert_eq!(result.status_code, 0);
    assert!(result.error.is_some());
}

#[tokio::test]
async fn fetch_rejects_non_http_urls() {
    let result = fetcher()
        .fetch("file:///etc/passwd", &FetchOptions::with_timeout_ms(1000))
        .await;

    assert!(!result.is_success());
    assert!(result
        .error
        .unwrap_or_default()
        .contains("unsupported scheme"));
}
