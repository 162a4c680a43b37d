//! Spider coordinator - the wave loop of one job
//!
//! The coordinator owns a `CrawlJob` and drives it through
//! `Seeding -> Running -> (Draining) -> Completed`:
//! - Seeding: fetch robots.txt for the seed host, admit the seed at depth 0
//! - Running: drain a batch, fetch it, record outcomes, admit new links
//! - Draining: the deadline passed; nothing new is drained
//! - Completed: the summary is frozen and returned
//!
//! Stop conditions are evaluated only between batches.

use crate::crawler::aggregator::{Aggregator, JobSummary, SpiderProgress, StopReason};
use crate::crawler::discoverer::LinkDiscoverer;
use crate::crawler::fetcher::{FetchOutcome, PageFetcher};
use crate::crawler::frontier::Frontier;
use crate::crawler::job::{CrawlJob, FrontierItem};
use crate::crawler::worker_pool::{FetchContext, WorkerPool};
use crate::robots::{fetch_robots, ParsedRobots};
use crate::state::SpiderState;
use crate::url::UrlClassifier;
use crate::{SpiderError, UrlError};
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{timeout_at, Instant};

/// Failure reason recorded for a seed that robots.txt disallows
pub const ROBOTS_DISALLOWED: &str = "Disallowed by robots.txt";

#[derive(Debug, Clone)]
struct RobotsPolicy {
    client: Client,
    agent: String,
}

/// Runs one spider job to completion
pub struct Coordinator {
    job: CrawlJob,
    fetcher: Arc<dyn PageFetcher>,
    robots: Option<RobotsPolicy>,
    state: SpiderState,
    progress: watch::Sender<SpiderProgress>,
}

impl Coordinator {
    /// Creates a coordinator in the `Seeding` state
    ///
    /// # Arguments
    ///
    /// * `job` - The validated job
    /// * `fetcher` - Page fetch collaborator
    pub fn new(job: CrawlJob, fetcher: Arc<dyn PageFetcher>) -> Self {
        let (progress, _) = watch::channel(SpiderProgress::default());
        Self {
            job,
            fetcher,
            robots: None,
            state: SpiderState::Seeding,
            progress,
        }
    }

    /// Enables robots.txt checks for `agent`, fetched with `client` at seeding
    pub fn with_robots(mut self, client: Client, agent: impl Into<String>) -> Self {
        self.robots = Some(RobotsPolicy {
            client,
            agent: agent.into(),
        });
        self
    }

    /// Receives a progress snapshot after every batch
    pub fn subscribe(&self) -> watch::Receiver<SpiderProgress> {
        self.progress.subscribe()
    }

    pub fn state(&self) -> SpiderState {
        self.state
    }

    pub fn job(&self) -> &CrawlJob {
        &self.job
    }

    fn transition(&mut self, next: SpiderState) -> Result<(), SpiderError> {
        if !self.state.can_transition_to(next) {
            return Err(SpiderError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!("Spider state {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    fn publish(&self, aggregator: &Aggregator, frontier: &Frontier, stop: Option<StopReason>) {
        self.progress
            .send_replace(aggregator.snapshot(self.state, frontier.pending_count(), stop));
    }

    async fn build_classifier(&self) -> Result<UrlClassifier, SpiderError> {
        let classifier = UrlClassifier::new(
            &self.job.seed_url,
            self.job.include_patterns.clone(),
            self.job.exclude_patterns.clone(),
        )
        .ok_or(UrlError::MissingDomain)?;

        Ok(match &self.robots {
            Some(policy) => {
                let robots = self.fetch_seed_robots(&policy.client).await;
                classifier.with_robots(robots, &policy.agent)
            }
            None => classifier,
        })
    }

    /// Fetches the seed host's robots.txt, bounded by the page timeout and the
    /// overall deadline; a host that never answers is treated as allow-all
    async fn fetch_seed_robots(&self, client: &Client) -> ParsedRobots {
        let limit = (Instant::now() + self.job.page_timeout).min(self.job.overall_deadline);
        match timeout_at(limit, fetch_robots(client, &self.job.seed_url)).await {
            Ok(robots) => robots,
            Err(_) => {
                tracing::warn!(
                    "robots.txt for {} did not arrive in time, allowing all",
                    self.job.seed_url
                );
                ParsedRobots::allow_all()
            }
        }
    }

    /// Runs the job and returns its summary
    ///
    /// Per-page failures never surface here; they end up in
    /// `failed_urls`. An error means the job itself could not run.
    ///
    /// # Returns
    ///
    /// * `Ok(JobSummary)` - Completed job (possibly partial after the deadline)
    /// * `Err(SpiderError)` - Seed without a host, or an illegal state transition
    pub async fn run(mut self) -> Result<JobSummary, SpiderError> {
        let seed = self.job.seed_url.clone();
        tracing::info!(
            "Starting spider job for {} (max_depth={}, max_pages={}, batch_size={})",
            seed,
            self.job.max_depth,
            self.job.max_pages,
            self.job.batch_size
        );

        let classifier = Arc::new(self.build_classifier().await?);
        let frontier = Frontier::new(Arc::clone(&classifier));
        let discoverer = LinkDiscoverer::new(Arc::clone(&classifier), self.job.max_depth);
        let mut aggregator = Aggregator::new(self.job.max_pages);

        if !classifier.robots_allows(&seed) {
            tracing::warn!("Seed {} is disallowed by robots.txt", seed);
            aggregator.record(FetchOutcome::failure(
                FrontierItem::new(seed, 0),
                ROBOTS_DISALLOWED,
            ));
            self.transition(SpiderState::Completed)?;
            self.publish(&aggregator, &frontier, Some(StopReason::FrontierExhausted));
            return Ok(aggregator.into_summary());
        }

        frontier.admit_seed(seed);
        self.transition(SpiderState::Running)?;
        self.publish(&aggregator, &frontier, None);

        let pool = WorkerPool::new(self.job.batch_size as usize, self.job.page_timeout)
            .with_hard_stop(self.job.hard_stop());
        let ctx = FetchContext {
            fetcher: Arc::clone(&self.fetcher),
            params: Arc::clone(&self.job.crawler_params),
            extraction: self.job.extraction.clone(),
        };

        let stop = loop {
            if let Some(reason) =
                aggregator.should_stop(frontier.has_pending(), self.job.deadline_passed())
            {
                break reason;
            }

            let limit = self.job.batch_size.min(aggregator.remaining_budget()) as usize;
            let batch = frontier.drain_batch(limit);
            tracing::debug!(
                "Fetching batch of {} at depth {} ({} pending)",
                batch.len(),
                frontier.current_depth(),
                frontier.pending_count()
            );

            let outcomes = pool.run_batch(batch, &ctx).await;

            if self.job.deadline_passed() && self.state == SpiderState::Running {
                tracing::warn!("Overall deadline passed, draining");
                self.transition(SpiderState::Draining)?;
            }

            for outcome in outcomes {
                if self.state.accepts_work() {
                    discoverer.discover(&outcome, &frontier);
                }
                aggregator.record(outcome);
            }

            let summary = aggregator.summary();
            tracing::info!(
                "Progress: {} crawled, {} failed, {} pending, depth {}",
                summary.crawled_count,
                summary.failed_count,
                frontier.pending_count(),
                frontier.current_depth()
            );
            self.publish(&aggregator, &frontier, None);
        };

        if stop == StopReason::Deadline && self.state == SpiderState::Running {
            self.transition(SpiderState::Draining)?;
        }
        self.transition(SpiderState::Completed)?;
        self.publish(&aggregator, &frontier, Some(stop));

        let summary = aggregator.into_summary();
        tracing::info!(
            "Spider job finished ({}): {} crawled, {} failed, max depth {}",
            stop,
            summary.crawled_count,
            summary.failed_count,
            summary.max_depth_reached
        );

        Ok(summary)
    }
}
