//! Crawler module: scheduling and fetching for one spider job
//!
//! This module contains the core spider logic, including:
//! - The frontier of per-depth waves and the visited set
//! - Bounded-concurrency batch fetching with per-page timeouts
//! - HTTP fetching, HTML parsing and link extraction
//! - Link discovery for the next wave
//! - Result aggregation and stop conditions
//! - Overall job coordination

mod aggregator;
mod coordinator;
mod discoverer;
mod fetcher;
mod frontier;
mod job;
mod page;
mod parser;
mod worker_pool;

pub use aggregator::{Aggregator, JobSummary, SpiderProgress, StopReason};
pub use coordinator::{Coordinator, ROBOTS_DISALLOWED};
pub use discoverer::LinkDiscoverer;
pub use fetcher::{build_http_client, FetchOutcome, HttpFetcher, PageFetcher};
pub use frontier::Frontier;
pub use job::{CrawlJob, CrawlerParams, FrontierItem};
pub use page::{Link, MediaItem, PageLinks, PageMedia, PageMetadata, PageResult};
pub use parser::{parse_html, ParsedPage};
pub use worker_pool::{FetchContext, WorkerPool};

