//! Immutable description of one spider job

use crate::extraction::ExtractionStrategy;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Free-form `crawler_params` passed through to the page fetcher
pub type CrawlerParams = Map<String, Value>;

/// A URL waiting in the frontier, with the depth it was discovered at
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrontierItem {
    pub url: Url,
    pub depth: u32,
}

impl FrontierItem {
    pub fn new(url: Url, depth: u32) -> Self {
        Self { url, depth }
    }
}

/// One validated spider request
///
/// Built by `SpiderRequest::into_job` and owned by the coordinator; nothing
/// mutates it once the job starts.
#[derive(Debug, Clone)]
pub struct CrawlJob {
    /// Normalized seed URL, crawled at depth 0
    pub seed_url: Url,

    /// Deepest level whose pages are fetched (1-10)
    pub max_depth: u32,

    /// Upper bound on crawled plus failed pages (1-1000)
    pub max_pages: u32,

    /// Concurrent fetches per batch (1-50)
    pub batch_size: u32,

    /// A URL must contain one of these substrings, when non-empty
    pub include_patterns: Vec<String>,

    /// A URL containing any of these substrings is skipped
    pub exclude_patterns: Vec<String>,

    /// No batch is started after this instant
    pub overall_deadline: Instant,

    /// Extra time in-flight fetches get after the deadline
    pub drain_grace: Duration,

    /// Timeout applied to each page fetch
    pub page_timeout: Duration,

    pub crawler_params: Arc<CrawlerParams>,

    /// Strategy run on every fetched page, if any
    pub extraction: Option<Arc<dyn ExtractionStrategy>>,
}

impl CrawlJob {
    /// Creates a job with no patterns, no extraction and default timeouts
    ///
    /// Used by the CLI and tests; request-driven jobs come from
    /// `SpiderRequest::into_job`.
    pub fn new(seed_url: Url, max_depth: u32, max_pages: u32, batch_size: u32) -> Self {
        Self {
            seed_url,
            max_depth,
            max_pages,
            batch_size,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            overall_deadline: Instant::now() + Duration::from_secs(600),
            drain_grace: Duration::from_secs(30),
            page_timeout: Duration::from_secs(30),
            crawler_params: Arc::new(CrawlerParams::new()),
            extraction: None,
        }
    }

    /// Instant after which in-flight fetches are abandoned
    pub fn hard_stop(&self) -> Instant {
        self.overall_deadline + self.drain_grace
    }

    pub fn deadline_passed(&self) -> bool {
        Instant::now() >= self.overall_deadline
    }
}
