//! Bounded-concurrency execution of one batch of page fetches
//!
//! Every item of a batch runs on its own tokio task. A semaphore caps how
//! many fetches are in flight, each fetch gets its own timeout, and a panic
//! or abort in one task only fails that item.

use crate::crawler::fetcher::{FetchOutcome, PageFetcher};
use crate::crawler::job::{CrawlerParams, FrontierItem};
use crate::extraction::ExtractionStrategy;
use crate::FetchError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::Instant;

/// Collaborators shared by every fetch of a job
#[derive(Clone)]
pub struct FetchContext {
    pub fetcher: Arc<dyn PageFetcher>,
    pub params: Arc<CrawlerParams>,
    pub extraction: Option<Arc<dyn ExtractionStrategy>>,
}

/// Runs batches of fetches with at most `concurrency` in flight
#[derive(Debug, Clone)]
pub struct WorkerPool {
    concurrency: usize,
    page_timeout: Duration,
    hard_stop: Option<Instant>,
}

impl WorkerPool {
    /// Creates a pool; a concurrency of 0 is treated as 1
    pub fn new(concurrency: usize, page_timeout: Duration) -> Self {
        Self {
            concurrency: concurrency.max(1),
            page_timeout,
            hard_stop: None,
        }
    }

    /// Fetches still running at `at` are aborted and reported as cancelled
    pub fn with_hard_stop(mut self, at: Instant) -> Self {
        self.hard_stop = Some(at);
        self
    }

    /// Fetches every item and returns one outcome per item
    ///
    /// Outcomes come back in item order, though that order carries no meaning.
    /// No error escapes: timeouts, fetcher errors, panics and hard-stop
    /// aborts all become `FetchOutcome::Failure` for the affected URL.
    ///
    /// # Arguments
    ///
    /// * `items` - Frontier items to fetch
    /// * `ctx` - Fetcher, crawler params and extraction strategy
    pub async fn run_batch(&self, items: Vec<FrontierItem>, ctx: &FetchContext) -> Vec<FetchOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::with_capacity(items.len());

        for item in items {
            let semaphore = Arc::clone(&semaphore);
            let fetcher = Arc::clone(&ctx.fetcher);
            let params = Arc::clone(&ctx.params);
            let extraction = ctx.extraction.clone();
            let page_timeout = self.page_timeout;
            let url = item.url.clone();

            let handle = tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| FetchError::TaskFailed(e.to_string()))?;

                match tokio::time::timeout(
                    page_timeout,
                    fetcher.fetch(&url, &params, extraction.as_deref()),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(FetchError::Timeout),
                }
            });

            handles.push((item, handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());

        for (item, mut handle) in handles {
            let joined = match self.hard_stop {
                Some(at) => match tokio::time::timeout_at(at, &mut handle).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        handle.abort();
                        tracing::warn!("Abandoning {} at hard stop", item.url);
                        outcomes.push(FetchOutcome::failure(item, FetchError::Cancelled));
                        continue;
                    }
                },
                None => handle.await,
            };

            let outcome = match joined {
                Ok(Ok(page)) => FetchOutcome::success(item, page),
                Ok(Err(e)) => {
                    tracing::warn!("Fetch failed for {}: {}", item.url, e);
                    FetchOutcome::failure(item, e)
                }
                Err(e) => {
                    tracing::warn!("Fetch task for {} did not complete: {}", item.url, e);
                    FetchOutcome::failure(item, FetchError::TaskFailed(e.to_string()))
                }
            };
            outcomes.push(outcome);
        }

        outcomes
    }
}
