//! Job results, counters and stop conditions

use crate::crawler::fetcher::FetchOutcome;
use crate::crawler::page::PageResult;
use crate::state::SpiderState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Final (or in-progress) result of a spider job
///
/// Serialized as the response body of a spider request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub crawled_count: u32,
    pub failed_count: u32,
    pub max_depth_reached: u32,
    /// Normalized URL -> page result
    pub results: BTreeMap<String, PageResult>,
    /// Normalized URL -> error reason
    pub failed_urls: BTreeMap<String, String>,
}

impl JobSummary {
    /// Pages processed so far, successful or not
    pub fn processed(&self) -> u32 {
        self.crawled_count + self.failed_count
    }

    pub fn contains(&self, url: &str) -> bool {
        self.results.contains_key(url) || self.failed_urls.contains_key(url)
    }
}

/// Why a job stopped scheduling new batches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// crawled + failed reached `max_pages`
    PageBudget,
    /// The overall deadline elapsed
    Deadline,
    /// No pending URLs remain
    FrontierExhausted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PageBudget => "page budget reached",
            Self::Deadline => "deadline exceeded",
            Self::FrontierExhausted => "frontier exhausted",
        };
        f.write_str(s)
    }
}

/// Point-in-time view of a running job, published after every batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpiderProgress {
    pub state: SpiderState,
    pub crawled_count: u32,
    pub failed_count: u32,
    pub max_depth_reached: u32,
    pub pending: usize,
    pub stop_reason: Option<StopReason>,
}

impl Default for SpiderProgress {
    fn default() -> Self {
        Self {
            state: SpiderState::Seeding,
            crawled_count: 0,
            failed_count: 0,
            max_depth_reached: 0,
            pending: 0,
            stop_reason: None,
        }
    }
}

/// Records outcomes and decides when the job stops
#[derive(Debug, Clone)]
pub struct Aggregator {
    max_pages: u32,
    summary: JobSummary,
}

impl Aggregator {
    pub fn new(max_pages: u32) -> Self {
        Self {
            max_pages,
            summary: JobSummary::default(),
        }
    }

    /// Records one outcome
    ///
    /// Returns false (and changes nothing) if the URL was already recorded.
    pub fn record(&mut self, outcome: FetchOutcome) -> bool {
        let key = outcome.url().as_str().to_string();
        if self.summary.contains(&key) {
            tracing::warn!("Ignoring duplicate outcome for {}", key);
            return false;
        }

        match outcome {
            FetchOutcome::Success { depth, content, .. } => {
                self.summary.crawled_count += 1;
                self.summary.max_depth_reached = self.summary.max_depth_reached.max(depth);
                self.summary.results.insert(key, *content);
            }
            FetchOutcome::Failure { error_reason, .. } => {
                self.summary.failed_count += 1;
                self.summary.failed_urls.insert(key, error_reason);
            }
        }

        true
    }

    /// Pages that may still be fetched before the budget is spent
    pub fn remaining_budget(&self) -> u32 {
        self.max_pages.saturating_sub(self.summary.processed())
    }

    /// Stop check, evaluated at batch boundaries
    ///
    /// Budget wins over deadline, deadline over an empty frontier.
    pub fn should_stop(&self, frontier_has_pending: bool, deadline_passed: bool) -> Option<StopReason> {
        if self.summary.processed() >= self.max_pages {
            Some(StopReason::PageBudget)
        } else if deadline_passed {
            Some(StopReason::Deadline)
        } else if !frontier_has_pending {
            Some(StopReason::FrontierExhausted)
        } else {
            None
        }
    }

    pub fn summary(&self) -> &JobSummary {
        &self.summary
    }

    pub fn snapshot(
        &self,
        state: SpiderState,
        pending: usize,
        stop_reason: Option<StopReason>,
    ) -> SpiderProgress {
        SpiderProgress {
            state,
            crawled_count: self.summary.crawled_count,
            failed_count: self.summary.failed_count,
            max_depth_reached: self.summary.max_depth_reached,
            pending,
            stop_reason,
        }
    }

    pub fn into_summary(self) -> JobSummary {
        self.summary
    }
}
