//! HTTP fetcher implementation
//!
//! This module defines the page-fetch seam the spider schedules against and
//! its default implementation on top of `reqwest`:
//! - Building HTTP clients with proper user agent strings
//! - GET requests with per-request `crawler_params` (user agent, headers)
//! - Content-Type checking and HTML parsing
//! - Running the selected extraction strategy
//! - Error classification into `FetchError`

use crate::config::UserAgentConfig;
use crate::crawler::job::{CrawlerParams, FrontierItem};
use crate::crawler::page::PageResult;
use crate::crawler::parser::parse_html;
use crate::extraction::{ExtractionInput, ExtractionStrategy};
use crate::FetchError;
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::{redirect::Policy, Client};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use url::Url;

/// Fetches, renders and extracts a single page
///
/// Implementations must be safe to call concurrently; the worker pool wraps
/// every call in its own timeout, so an implementation does not need one.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(
        &self,
        url: &Url,
        params: &CrawlerParams,
        extraction: Option<&dyn ExtractionStrategy>,
    ) -> Result<PageResult, FetchError>;
}

/// Result of one frontier item after it went through the worker pool
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Success {
        url: Url,
        depth: u32,
        content: Box<PageResult>,
        /// Internal link hrefs reported by the fetcher
        discovered_links: Vec<String>,
    },
    Failure {
        url: Url,
        depth: u32,
        error_reason: String,
    },
}

impl FetchOutcome {
    pub fn success(item: FrontierItem, content: PageResult) -> Self {
        let discovered_links = content
            .links
            .internal
            .iter()
            .map(|link| link.href.clone())
            .collect();

        Self::Success {
            url: item.url,
            depth: item.depth,
            content: Box::new(content),
            discovered_links,
        }
    }

    pub fn failure(item: FrontierItem, reason: impl fmt::Display) -> Self {
        Self::Failure {
            url: item.url,
            depth: item.depth,
            error_reason: reason.to_string(),
        }
    }

    pub fn url(&self) -> &Url {
        match self {
            Self::Success { url, .. } | Self::Failure { url, .. } => url,
        }
    }

    pub fn depth(&self) -> u32 {
        match self {
            Self::Success { depth, .. } | Self::Failure { depth, .. } => *depth,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed (up to 10 hops). No overall timeout is set on the
/// client; page timeouts are enforced by the worker pool.
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use sumi_spider::config::UserAgentConfig;
/// use sumi_spider::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "SumiSpider".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Default `PageFetcher`: plain HTTP GET plus HTML parsing
///
/// `crawler_params` understood here:
/// - `user_agent` (string) replaces the configured user agent
/// - `headers` (object of strings) adds request headers
/// - `screenshot` (bool) is accepted; no renderer exists, so `screenshot` stays null
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a fetcher with its own client
    pub fn from_config(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config)?))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &Url,
        params: &CrawlerParams,
        extraction: Option<&dyn ExtractionStrategy>,
    ) -> Result<PageResult, FetchError> {
        let mut request = self.client.get(url.as_str());

        if let Some(agent) = params.get("user_agent").and_then(Value::as_str) {
            request = request.header(USER_AGENT, agent);
        }

        if let Some(headers) = params.get("headers").and_then(Value::as_object) {
            for (name, value) in headers {
                if let Some(value) = value.as_str() {
                    request = request.header(name.as_str(), value);
                }
            }
        }

        if params.get("screenshot").and_then(Value::as_bool) == Some(true) {
            tracing::debug!("Screenshot requested for {} but no renderer is available", url);
        }

        let response = request.send().await.map_err(classify_error)?;
        let status = response.status();
        let final_url = response.url().clone();

        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !is_html(&content_type) {
            return Err(FetchError::ContentMismatch { content_type });
        }

        let body = response.text().await.map_err(classify_error)?;
        let parsed = parse_html(&body, &final_url);

        let extracted_content = match extraction {
            Some(strategy) => {
                let input = ExtractionInput {
                    url: final_url.as_str(),
                    html: &body,
                    blocks: &parsed.blocks,
                };
                Some(strategy.extract(input).await?)
            }
            None => None,
        };

        tracing::debug!(
            "Fetched {} ({}, {} internal links)",
            final_url,
            status.as_u16(),
            parsed.links.internal.len()
        );

        Ok(PageResult {
            url: final_url.to_string(),
            html: body,
            success: true,
            status_code: Some(status.as_u16()),
            cleaned_html: Some(parsed.cleaned_html),
            links: parsed.links,
            media: parsed.media,
            screenshot: None,
            extracted_content,
            metadata: parsed.metadata,
        })
    }
}

fn is_html(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.contains("text/html") || content_type.contains("application/xhtml+xml")
}

fn classify_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if e.is_connect() {
        FetchError::Network("Connection refused".to_string())
    } else {
        FetchError::Network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_config() -> UserAgentConfig {
        UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        }
    }

    fn fetcher() -> HttpFetcher {
        HttpFetcher::from_config(&create_test_config()).unwrap()
    }

    fn html_response(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html; charset=utf-8")
    }

    #[test]
    fn test_build_http_client() {
        let config = create_test_config();
        let client = build_http_client(&config);
        assert!(client.is_ok());
    }

    #[test]
    fn test_is_html() {
        assert!(is_html("text/html"));
        assert!(is_html("Text/HTML; charset=utf-8"));
        assert!(is_html("application/xhtml+xml"));
        assert!(!is_html("application/pdf"));
        assert!(!is_html(""));
    }

    #[tokio::test]
    async fn test_fetch_html_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(html_response(
                r#"<html><head><title>Home</title></head>
                <body><a href="/about">About</a><a href="https://other.org/">Other</a></body></html>"#,
            ))
            .mount(&server)
            .await;

        let url = Url::parse(&server.uri()).unwrap();
        let page = fetcher().fetch(&url, &CrawlerParams::new(), None).await.unwrap();

        assert!(page.success);
        assert_eq!(page.status_code, Some(200));
        assert_eq!(page.metadata.title.as_deref(), Some("Home"));
        assert_eq!(page.links.internal.len(), 1);
        assert_eq!(page.links.external.len(), 1);
        assert!(page.screenshot.is_none());
        assert!(page.extracted_content.is_none());
    }

    #[tokio::test]
    async fn test_fetch_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/missing", server.uri())).unwrap();
        let err = fetcher().fetch(&url, &CrawlerParams::new(), None).await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP 404");
    }

    #[tokio::test]
    async fn test_fetch_content_mismatch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("%PDF", "application/pdf"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/doc.pdf", server.uri())).unwrap();
        let err = fetcher().fetch(&url, &CrawlerParams::new(), None).await.unwrap_err();
        assert!(matches!(err, FetchError::ContentMismatch { .. }));
    }

    #[tokio::test]
    async fn test_fetch_honors_crawler_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", "CustomAgent/2.0"))
            .and(header("x-test", "yes"))
            .respond_with(html_response("<html><body><p>ok</p></body></html>"))
            .mount(&server)
            .await;

        let params: CrawlerParams = serde_json::from_value(serde_json::json!({
            "user_agent": "CustomAgent/2.0",
            "headers": {"X-Test": "yes"},
            "screenshot": true
        }))
        .unwrap();

        let url = Url::parse(&server.uri()).unwrap();
        let page = fetcher().fetch(&url, &params, None).await.unwrap();
        assert!(page.screenshot.is_none());
    }

    #[tokio::test]
    async fn test_fetch_runs_extraction() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(html_response("<html><body><h1>Hi</h1><p>There</p></body></html>"))
            .mount(&server)
            .await;

        let url = Url::parse(&server.uri()).unwrap();
        let strategy = crate::extraction::BasicExtraction;
        let page = fetcher()
            .fetch(&url, &CrawlerParams::new(), Some(&strategy))
            .await
            .unwrap();

        let extracted: Value = serde_json::from_str(&page.extracted_content.unwrap()).unwrap();
        assert_eq!(extracted[0]["content"], "Hi");
        assert_eq!(extracted[1]["content"], "There");
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        // Port 9 (discard) is closed on test hosts
        let url = Url::parse("http://127.0.0.1:9/").unwrap();
        let err = fetcher().fetch(&url, &CrawlerParams::new(), None).await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
    }

    #[test]
    fn test_outcome_carries_internal_links() {
        let mut page = PageResult::default();
        page.links.internal.push(crate::crawler::page::Link {
            href: "https://example.com/a".to_string(),
            text: "A".to_string(),
        });
        let item = FrontierItem::new(Url::parse("https://example.com/").unwrap(), 0);
        let outcome = FetchOutcome::success(item, page);

        match outcome {
            FetchOutcome::Success {
                discovered_links, ..
            } => assert_eq!(discovered_links, vec!["https://example.com/a"]),
            FetchOutcome::Failure { .. } => panic!("expected success"),
        }
    }
}
