//! Scheduler-level properties, checked against an in-memory site
//!
//! A fake `PageFetcher` serves a generated link graph so that limits,
//! domain boundaries and failure isolation can be checked without a network.

use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sumi_spider::config::{Config, SpiderConfig};
use sumi_spider::crawler::{CrawlerParams, Link, PageFetcher, PageResult};
use sumi_spider::extraction::ExtractionStrategy;
use sumi_spider::url::UrlClassifier;
use sumi_spider::{FetchError, SpiderResponse, SpiderService};
use url::Url;

/// Serves `path -> links`; `/hang` never answers, unknown paths are 404
struct FakeSite {
    pages: HashMap<String, Vec<String>>,
    fetched: Mutex<Vec<String>>,
}

impl FakeSite {
    fn new(pages: HashMap<String, Vec<String>>) -> Arc<Self> {
        Arc::new(Self {
            pages,
            fetched: Mutex::new(Vec::new()),
        })
    }

    /// Seed links to `/p0../p{n-1}`, each of which links to two children
    fn wide(n: usize) -> Arc<Self> {
        let mut pages = HashMap::new();
        pages.insert(
            "/".to_string(),
            (0..n).map(|i| format!("/p{}", i)).collect(),
        );
        for i in 0..n {
            pages.insert(
                format!("/p{}", i),
                vec![format!("/p{}/a", i), format!("/p{}/b", i)],
            );
            pages.insert(format!("/p{}/a", i), vec!["https://other.example.net/x".to_string()]);
            pages.insert(format!("/p{}/b", i), vec!["https://www.example.com/y".to_string()]);
        }
        Self::new(pages)
    }

    fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for FakeSite {
    async fn fetch(
        &self,
        url: &Url,
        _params: &CrawlerParams,
        _extraction: Option<&dyn ExtractionStrategy>,
    ) -> Result<PageResult, FetchError> {
        self.fetched.lock().unwrap().push(url.path().to_string());

        if url.path() == "/hang" {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }

        let links = self
            .pages
            .get(url.path())
            .ok_or(FetchError::Http { status: 404 })?;

        let mut page = PageResult {
            url: url.to_string(),
            success: true,
            status_code: Some(200),
            ..PageResult::default()
        };
        page.links.internal = links
            .iter()
            .map(|href| Link {
                href: url.join(href).unwrap().to_string(),
                text: String::new(),
            })
            .collect();
        Ok(page)
    }
}

fn offline_config() -> Config {
    Config {
        spider: SpiderConfig {
            respect_robots_txt: false,
            ..SpiderConfig::default()
        },
        ..Config::default()
    }
}

async fn spider(site: Arc<FakeSite>, body: serde_json::Value) -> SpiderResponse {
    SpiderService::with_fetcher(offline_config(), site, reqwest::Client::new())
        .handle_json(None, &body.to_string())
        .await
        .expect("Spider request failed")
}

fn assert_invariants(response: &SpiderResponse, body: &serde_json::Value) {
    let max_pages = body["max_pages"].as_u64().unwrap_or(100) as u32;
    let max_depth = body["max_depth"].as_u64().unwrap_or(3) as u32;

    assert!(response.crawled_count + response.failed_count <= max_pages);
    assert!(response.max_depth_reached <= max_depth);
    assert_eq!(response.crawled_count as usize, response.results.len());
    assert_eq!(response.failed_count as usize, response.failed_urls.len());

    for url in response.results.keys() {
        assert!(!response.failed_urls.contains_key(url), "{} in both maps", url);
    }

    let seed = Url::parse(body["url"].as_str().unwrap()).unwrap();
    let include: Vec<String> = serde_json::from_value(body["include_patterns"].clone()).unwrap_or_default();
    let exclude: Vec<String> = serde_json::from_value(body["exclude_patterns"].clone()).unwrap_or_default();
    let classifier = UrlClassifier::new(&seed, include, exclude).unwrap();
    let nothing_visited = Default::default();

    for url in response.results.keys().chain(response.failed_urls.keys()) {
        let parsed = Url::parse(url).unwrap();
        if parsed.path() == "/" {
            continue;
        }
        assert!(
            classifier.eligible(&parsed, &nothing_visited),
            "{} violates the domain or pattern rules",
            url
        );
    }
}

#[tokio::test]
async fn test_depth_one_budget_five_with_ten_links() {
    let site = FakeSite::wide(10);
    let body = json!({"url": "https://example.com", "max_depth": 1, "max_pages": 5});

    let response = spider(site.clone(), body.clone()).await;

    assert_eq!(response.crawled_count, 5);
    assert_eq!(response.failed_count, 0);
    assert_eq!(response.max_depth_reached, 1);
    assert!(response.results.contains_key("https://example.com/"));
    assert_eq!(site.fetched().len(), 5);
    assert_invariants(&response, &body);
}

#[tokio::test]
async fn test_excluded_url_never_enters_frontier() {
    let mut pages = HashMap::new();
    pages.insert(
        "/".to_string(),
        vec!["/admin/panel".to_string(), "/docs".to_string()],
    );
    pages.insert("/docs".to_string(), vec!["/admin/panel?tab=1".to_string()]);
    let site = FakeSite::new(pages);
    let body = json!({"url": "https://example.com", "exclude_patterns": ["/admin/"]});

    let response = spider(site.clone(), body.clone()).await;

    assert!(!site.fetched().iter().any(|p| p.starts_with("/admin/")));
    assert!(!response.results.contains_key("https://example.com/admin/panel"));
    assert!(!response.failed_urls.contains_key("https://example.com/admin/panel"));
    assert_eq!(response.crawled_count, 2);
    assert_invariants(&response, &body);
}

#[tokio::test]
async fn test_one_hanging_page_among_five() {
    let mut pages = HashMap::new();
    pages.insert(
        "/".to_string(),
        vec!["/a", "/b", "/hang", "/c", "/d"]
            .into_iter()
            .map(String::from)
            .collect(),
    );
    for p in ["/a", "/b", "/c", "/d"] {
        pages.insert(p.to_string(), Vec::new());
    }
    let site = FakeSite::new(pages);
    let body = json!({
        "url": "https://example.com",
        "max_depth": 1,
        "batch_size": 5,
        "crawler_params": {"timeout": 0.3}
    });

    let response = spider(site, body.clone()).await;

    assert_eq!(response.failed_urls.len(), 1);
    assert_eq!(response.failed_urls["https://example.com/hang"], "timeout");
    for p in ["/a", "/b", "/c", "/d"] {
        assert!(response.results.contains_key(&format!("https://example.com{}", p)));
    }
    assert_invariants(&response, &body);
}

#[tokio::test]
async fn test_limits_hold_across_configurations() {
    for (max_depth, max_pages, batch_size) in [(1, 1, 1), (2, 7, 3), (3, 20, 50), (2, 1000, 4), (10, 13, 6)] {
        let site = FakeSite::wide(8);
        let body = json!({
            "url": "https://example.com/",
            "max_depth": max_depth,
            "max_pages": max_pages,
            "batch_size": batch_size
        });

        let response = spider(site, body.clone()).await;
        assert_invariants(&response, &body);
    }
}

#[tokio::test]
async fn test_off_host_links_never_fetched() {
    let site = FakeSite::wide(3);
    let body = json!({"url": "https://example.com", "max_depth": 3});

    let response = spider(site.clone(), body.clone()).await;

    // 1 seed + 3 children + 6 grandchildren; their off-host links are dropped
    assert_eq!(response.crawled_count, 10);
    assert_eq!(response.max_depth_reached, 2);
    assert!(response.results.keys().all(|u| u.starts_with("https://example.com/")));
    assert_invariants(&response, &body);
}

#[tokio::test]
async fn test_include_patterns_restrict_discovered_pages() {
    let site = FakeSite::wide(4);
    let body = json!({
        "url": "https://example.com",
        "max_depth": 2,
        "include_patterns": ["/p1"]
    });

    let response = spider(site, body.clone()).await;

    let mut crawled: Vec<&str> = response.results.keys().map(String::as_str).collect();
    crawled.sort_unstable();
    assert_eq!(
        crawled,
        vec![
            "https://example.com/",
            "https://example.com/p1",
            "https://example.com/p1/a",
            "https://example.com/p1/b",
        ]
    );
    assert_invariants(&response, &body);
}

#[test]
fn test_classification_is_idempotent() {
    let seed = Url::parse("https://example.com/").unwrap();
    let classifier = UrlClassifier::new(
        &seed,
        vec!["/docs".to_string()],
        vec!["/docs/private".to_string()],
    )
    .unwrap();
    let visited = ["https://example.com/docs/seen".to_string()].into_iter().collect();

    for raw in [
        "https://example.com/docs/a",
        "https://example.com/docs/private/b",
        "https://example.com/blog",
        "https://sub.example.com/docs",
        "https://example.com/docs/seen",
    ] {
        let url = Url::parse(raw).unwrap();
        let first = classifier.classify(&url, &visited);
        for _ in 0..3 {
            assert_eq!(classifier.classify(&url, &visited), first);
        }
    }
}
