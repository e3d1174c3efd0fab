//! Integration tests for the LibraryProxy public interface.
//!
//! These tests drive the proxy against a mockito upstream so routing,
//! caching, fetching and parsing run together.

use olib_core::{LibraryProxy, OlibError, ProxyConfig, RetryConfig};
use std::sync::Arc;
use std::time::Duration;

const HTML: (&str, &str) = ("content-type", "text/html; charset=utf-8");

const MODEL_PAGE: &str = r#"<!doctype html>
<html><body>
  <h1><a x-test-model-name title="codellama" href="/library/codellama">codellama</a></h1>
  <div id="summary-content"><span>A large language model that can use text prompts to generate code.</span></div>
  <span class="bg-indigo-50">tools</span>
  <p><span x-test-pull-count>2.1M</span> Downloads</p>
  <section>
    <input class="command" name="command" value="ollama run codellama" readonly>
    <a x-test-tags-link href="/library/codellama/tags">199 Tags</a>
  </section>
  <div id="file-explorer">
    <a href="/library/codellama:latest/blobs/3a43f93b78ec" class="group block grid-cols-12 sm:grid">
      <div class="sm:col-span-2">model</div>
      <div class="sm:col-span-8">arch llama · parameters 6.74B · quantization Q4_0</div>
      <div class="sm:col-start-12">3.8GB</div>
    </a>
  </div>
</body></html>"#;

const SEARCH: &str = r#"<!doctype html>
<html><body><ul>
  <li x-test-model>
    <a href="/library/llama3.2-vision">
      <span x-test-search-response-title>llama3.2-vision</span>
      <span x-test-capability>vision</span>
      <span x-test-pull-count>1.9M</span>
    </a>
  </li>
</ul></body></html>"#;

fn proxy(upstream: &mockito::ServerGuard) -> LibraryProxy {
    let config = ProxyConfig::default().with_upstream_base_url(upstream.url());
    LibraryProxy::builder(config)
        .with_retry(RetryConfig::upstream(2).with_base_delay(Duration::from_millis(5)))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_proxy_creation_fails_for_invalid_upstream() {
    let config = ProxyConfig::default().with_upstream_base_url("not a url");
    let result = LibraryProxy::new(config);
    assert!(matches!(result, Err(OlibError::Config { .. })));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_share_one_fetch() {
    let mut upstream = mockito::Server::new_async().await;
    let page = upstream
        .mock("GET", "/library/codellama")
        .with_header(HTML.0, HTML.1)
        .with_body(MODEL_PAGE)
        .expect(1)
        .create_async()
        .await;

    let proxy = Arc::new(proxy(&upstream));
    let requests = (0..8).map(|_| {
        let proxy = Arc::clone(&proxy);
        tokio::spawn(async move { proxy.handle("/library/codellama", None).await })
    });
    let responses = futures::future::join_all(requests).await;

    let mut bodies = Vec::new();
    for response in responses {
        bodies.push(response.unwrap().unwrap().body);
    }
    for body in &bodies {
        assert_eq!(body["name_full_model"], "codellama");
        assert_eq!(body["cached_at"], bodies[0]["cached_at"]);
    }
    assert_eq!(proxy.stats().entries, 1);
    page.assert_async().await;
}

#[tokio::test]
async fn test_user_namespace_falls_back_to_library() {
    let mut upstream = mockito::Server::new_async().await;
    let missing = upstream
        .mock("GET", "/someone/codellama")
        .with_status(404)
        .expect(1)
        .create_async()
        .await;
    let library = upstream
        .mock("GET", "/library/codellama")
        .with_header(HTML.0, HTML.1)
        .with_body(MODEL_PAGE)
        .expect(1)
        .create_async()
        .await;

    let proxy = proxy(&upstream);
    let response = proxy.handle("/someone/codellama", None).await.unwrap();
    assert_eq!(response.key.as_str(), "model:someone/codellama");
    assert_eq!(response.body["namespace"], "library");
    assert_eq!(response.body["total_tags_count"], 199);

    missing.assert_async().await;
    library.assert_async().await;
}

#[tokio::test]
async fn test_search_forwards_normalized_query() {
    let mut upstream = mockito::Server::new_async().await;
    let search = upstream
        .mock("GET", "/search")
        .match_query(mockito::Matcher::AllOf(vec![
            mockito::Matcher::UrlEncoded("q".into(), "llama vision".into()),
            mockito::Matcher::UrlEncoded("o".into(), "popular".into()),
        ]))
        .with_header(HTML.0, HTML.1)
        .with_body(SEARCH)
        .expect(1)
        .create_async()
        .await;

    let proxy = proxy(&upstream);
    let first = proxy.handle("/search", Some("q=Llama++Vision")).await.unwrap();
    assert_eq!(first.body["query"], "llama vision");
    assert_eq!(first.body["results"][0]["model_base_name"], "llama3.2-vision");

    let second = proxy.handle("/search", Some("q=%20llama%20VISION%20")).await.unwrap();
    assert!(second.meta.cached);
    search.assert_async().await;
}

#[tokio::test]
async fn test_missing_model_is_not_found_and_not_cached() {
    let mut upstream = mockito::Server::new_async().await;
    let missing = upstream
        .mock("GET", "/library/nope")
        .with_status(404)
        .expect(2)
        .create_async()
        .await;

    let proxy = proxy(&upstream);
    for _ in 0..2 {
        let err = proxy.handle("/library/nope", None).await.unwrap_err();
        assert!(matches!(err, OlibError::NotFound { .. }));
    }
    assert!(proxy.cache().is_empty());
    missing.assert_async().await;
}

#[tokio::test]
async fn test_tag_detail_reports_requested_tag() {
    let mut upstream = mockito::Server::new_async().await;
    let page = upstream
        .mock("GET", "/library/codellama:7b-instruct")
        .with_header(HTML.0, HTML.1)
        .with_body(MODEL_PAGE)
        .create_async()
        .await;

    let proxy = proxy(&upstream);
    let response = proxy
        .handle("/library/codellama:7b-instruct", None)
        .await
        .unwrap();
    assert_eq!(response.key.as_str(), "model:codellama:7b-instruct");
    assert_eq!(response.body["active_tag_part"], "7b-instruct");
    assert_eq!(response.body["active_tag_full_name"], "codellama:7b-instruct");
    assert_eq!(response.body["cached"], false);
    page.assert_async().await;
}

#[tokio::test]
async fn test_redesigned_listing_is_a_parse_error_and_not_cached() {
    let mut upstream = mockito::Server::new_async().await;
    let listing = upstream
        .mock("GET", "/library")
        .match_query(mockito::Matcher::Any)
        .with_header(HTML.0, HTML.1)
        .with_body(r#"<html><body><div class="new-design">cards moved</div></body></html>"#)
        .expect(2)
        .create_async()
        .await;

    let proxy = proxy(&upstream);
    for _ in 0..2 {
        let err = proxy.handle("/library", None).await.unwrap_err();
        assert!(matches!(err, OlibError::UpstreamParse { .. }));
    }
    assert!(proxy.cache().is_empty());
    listing.assert_async().await;
}
