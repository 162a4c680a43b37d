//! Integration tests for the spider
//!
//! These tests use wiremock to create mock HTTP servers and run complete
//! spider requests end-to-end through `SpiderService`.

use serde_json::json;
use sumi_spider::auth::hash_token;
use sumi_spider::config::{AuthConfig, Config, UserAgentConfig};
use sumi_spider::{SpiderResponse, SpiderService};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with a recognizable user agent
fn create_test_config() -> Config {
    Config {
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        ..Config::default()
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html; charset=utf-8")
}

async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(&body))
        .mount(server)
        .await;
}

async fn mount_robots(server: &MockServer, content: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(content))
        .mount(server)
        .await;
}

async fn run(config: Config, body: serde_json::Value) -> SpiderResponse {
    SpiderService::new(config)
        .expect("Failed to build service")
        .handle_json(None, &body.to_string())
        .await
        .expect("Spider request failed")
}

#[tokio::test]
async fn test_full_spider_single_site() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_robots(&server, "User-agent: *\nAllow: /").await;
    mount_html(
        &server,
        "/",
        format!(
            r#"<html><head><title>Home</title></head><body>
            <a href="/page1">Page 1</a>
            <a href="{}/page2#section">Page 2</a>
            <a href="https://external.example.org/">Elsewhere</a>
            </body></html>"#,
            base
        ),
    )
    .await;
    mount_html(
        &server,
        "/page1",
        r#"<html><head><title>Page 1</title></head><body>
            <a href="/page1/deep">Deep</a><a href="/">Home</a>
            </body></html>"#
            .to_string(),
    )
    .await;
    mount_html(
        &server,
        "/page2",
        "<html><head><title>Page 2</title></head><body><p>Leaf</p></body></html>".to_string(),
    )
    .await;
    mount_html(
        &server,
        "/page1/deep",
        "<html><head><title>Deep</title></head><body></body></html>".to_string(),
    )
    .await;

    let response = run(
        create_test_config(),
        json!({"url": format!("{}/", base), "max_depth": 2, "max_pages": 20}),
    )
    .await;

    assert_eq!(response.crawled_count, 4);
    assert_eq!(response.failed_count, 0);
    assert_eq!(response.max_depth_reached, 2);

    let home = &response.results[&format!("{}/", base)];
    assert_eq!(home.metadata.title.as_deref(), Some("Home"));
    assert_eq!(home.status_code, Some(200));
    assert!(home.success);
    assert_eq!(home.links.external.len(), 1);
    assert!(response.results.contains_key(&format!("{}/page2", base)));
    assert!(response.results.contains_key(&format!("{}/page1/deep", base)));
}

#[tokio::test]
async fn test_depth_limit_respected() {
    let server = MockServer::start().await;

    mount_html(&server, "/", r#"<a href="/level1">1</a>"#.to_string()).await;
    mount_html(&server, "/level1", r#"<a href="/level2">2</a>"#.to_string()).await;
    Mock::given(method("GET"))
        .and(path("/level2"))
        .respond_with(html("<p>too deep</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let response = run(
        create_test_config(),
        json!({"url": server.uri(), "max_depth": 1}),
    )
    .await;

    assert_eq!(response.crawled_count, 2);
    assert_eq!(response.max_depth_reached, 1);
}

#[tokio::test]
async fn test_exclude_pattern_never_fetched() {
    let server = MockServer::start().await;

    mount_html(
        &server,
        "/",
        r#"<a href="/docs">Docs</a><a href="/admin/panel">Admin</a>"#.to_string(),
    )
    .await;
    mount_html(&server, "/docs", "<p>docs</p>".to_string()).await;
    Mock::given(method("GET"))
        .and(path("/admin/panel"))
        .respond_with(html("<p>secret</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let response = run(
        create_test_config(),
        json!({"url": server.uri(), "exclude_patterns": ["/admin/"]}),
    )
    .await;

    let admin = format!("{}/admin/panel", server.uri());
    assert_eq!(response.crawled_count, 2);
    assert!(!response.results.contains_key(&admin));
    assert!(!response.failed_urls.contains_key(&admin));
}

#[tokio::test]
async fn test_include_pattern_does_not_filter_seed() {
    let server = MockServer::start().await;

    mount_html(
        &server,
        "/",
        r#"<a href="/blog/post">Post</a><a href="/about">About</a>"#.to_string(),
    )
    .await;
    mount_html(&server, "/blog/post", "<p>post</p>".to_string()).await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html("<p>about</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let response = run(
        create_test_config(),
        json!({"url": server.uri(), "include_patterns": ["/blog/"]}),
    )
    .await;

    assert_eq!(response.crawled_count, 2);
    assert!(response
        .results
        .contains_key(&format!("{}/blog/post", server.uri())));
}

#[tokio::test]
async fn test_page_failures_recorded_not_raised() {
    let server = MockServer::start().await;

    mount_html(
        &server,
        "/",
        r#"<a href="/missing">Missing</a><a href="/report.pdf">PDF</a><a href="/broken">Broken</a>"#
            .to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("%PDF-1.4", "application/pdf"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let response = run(create_test_config(), json!({"url": server.uri()})).await;
    let base = server.uri();

    assert_eq!(response.crawled_count, 1);
    assert_eq!(response.failed_count, 3);
    assert_eq!(response.failed_urls[&format!("{}/missing", base)], "HTTP 404");
    assert_eq!(response.failed_urls[&format!("{}/broken", base)], "HTTP 503");
    assert_eq!(
        response.failed_urls[&format!("{}/report.pdf", base)],
        "Expected HTML, got application/pdf"
    );
}

#[tokio::test]
async fn test_slow_page_times_out() {
    let server = MockServer::start().await;

    mount_html(
        &server,
        "/",
        r#"<a href="/fast">Fast</a><a href="/slow">Slow</a>"#.to_string(),
    )
    .await;
    mount_html(&server, "/fast", "<p>fast</p>".to_string()).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("<p>slow</p>").set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let response = run(
        create_test_config(),
        json!({"url": server.uri(), "crawler_params": {"timeout": 0.5}}),
    )
    .await;

    assert_eq!(response.crawled_count, 2);
    assert_eq!(
        response.failed_urls[&format!("{}/slow", server.uri())],
        "timeout"
    );
}

#[tokio::test]
async fn test_robots_txt_blocks_paths() {
    let server = MockServer::start().await;

    mount_robots(&server, "User-agent: TestBot\nDisallow: /private\n").await;
    mount_html(
        &server,
        "/",
        r#"<a href="/public">Public</a><a href="/private/page">Private</a>"#.to_string(),
    )
    .await;
    mount_html(&server, "/public", "<p>public</p>".to_string()).await;
    Mock::given(method("GET"))
        .and(path("/private/page"))
        .respond_with(html("<p>private</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let response = run(create_test_config(), json!({"url": server.uri()})).await;

    assert_eq!(response.crawled_count, 2);
    assert_eq!(response.failed_count, 0);
}

#[tokio::test]
async fn test_hanging_robots_txt_treated_as_allow_all() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("User-agent: *\nDisallow: /\n")
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;
    mount_html(&server, "/", r#"<a href="/next">Next</a>"#.to_string()).await;
    mount_html(&server, "/next", "<p>next</p>".to_string()).await;

    let request = run(
        create_test_config(),
        json!({"url": server.uri(), "crawler_params": {"timeout": 0.5}}),
    );
    let response = tokio::time::timeout(Duration::from_secs(10), request)
        .await
        .expect("spider request blocked on robots.txt");

    assert_eq!(response.crawled_count, 2);
    assert_eq!(response.failed_count, 0);
}

#[tokio::test]
async fn test_extraction_runs_on_every_page() {
    let server = MockServer::start().await;

    mount_html(
        &server,
        "/",
        r#"<article><h2>First</h2></article><a href="/next">Next</a>"#.to_string(),
    )
    .await;
    mount_html(
        &server,
        "/next",
        "<article><h2>Second</h2></article>".to_string(),
    )
    .await;

    let response = run(
        create_test_config(),
        json!({
            "url": server.uri(),
            "extraction_config": {
                "type": "json_css",
                "params": {"schema": {
                    "baseSelector": "article",
                    "fields": [{"name": "title", "selector": "h2", "type": "text"}]
                }}
            }
        }),
    )
    .await;

    let next = &response.results[&format!("{}/next", server.uri())];
    let extracted: serde_json::Value =
        serde_json::from_str(next.extracted_content.as_deref().unwrap()).unwrap();
    assert_eq!(extracted, json!([{"title": "Second"}]));
}

#[tokio::test]
async fn test_bearer_token_required_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html("<p>never fetched</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let config = Config {
        auth: AuthConfig {
            token_hashes: vec![hash_token("letmein")],
        },
        ..create_test_config()
    };
    let service = SpiderService::new(config).unwrap();
    let body = json!({"url": server.uri()}).to_string();

    let err = service.handle_json(None, &body).await.unwrap_err();
    assert_eq!(err.status_code(), 401);

    let err = service
        .handle_json(Some("Bearer wrong"), &body)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 401);
}

#[tokio::test]
async fn test_invalid_parameters_rejected_before_crawling() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html("<p>never fetched</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let service = SpiderService::new(create_test_config()).unwrap();
    for body in [
        json!({"url": server.uri(), "max_depth": 0}),
        json!({"url": server.uri(), "max_pages": 1001}),
        json!({"url": server.uri(), "batch_size": 51}),
        json!({"url": "not-a-url"}),
        json!({"url": server.uri(), "extraction_config": {"type": "llm"}}),
    ] {
        let err = service
            .handle_json(None, &body.to_string())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400, "expected 400 for {}", body);
    }
}
