//! Turns a successful fetch into depth+1 frontier admissions

use crate::crawler::fetcher::FetchOutcome;
use crate::crawler::frontier::Frontier;
use crate::crawler::job::FrontierItem;
use crate::url::{normalize_parsed, UrlClassifier};
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// Proposes the internal links of a crawled page for the next wave
#[derive(Debug, Clone)]
pub struct LinkDiscoverer {
    classifier: Arc<UrlClassifier>,
    max_depth: u32,
}

impl LinkDiscoverer {
    pub fn new(classifier: Arc<UrlClassifier>, max_depth: u32) -> Self {
        Self {
            classifier,
            max_depth,
        }
    }

    /// Candidate items at `depth + 1` for the links found on `page_url`
    ///
    /// Links are resolved against the page, normalized and restricted to the
    /// seed's host. Each URL appears once. Nothing is proposed past
    /// `max_depth`. The visited set is not consulted here.
    pub fn candidates(&self, page_url: &Url, depth: u32, links: &[String]) -> Vec<FrontierItem> {
        let next_depth = depth + 1;
        if next_depth > self.max_depth {
            return Vec::new();
        }

        let mut seen = HashSet::new();
        let mut items = Vec::new();

        for href in links {
            let normalized = match page_url.join(href).map(normalize_parsed) {
                Ok(Ok(url)) => url,
                Ok(Err(e)) => {
                    tracing::debug!("Skipping link {}: {}", href, e);
                    continue;
                }
                Err(e) => {
                    tracing::debug!("Skipping unresolvable link {}: {}", href, e);
                    continue;
                }
            };

            if !self.classifier.same_host(&normalized) {
                tracing::debug!("Skipping off-host link {}", normalized);
                continue;
            }

            if seen.insert(normalized.as_str().to_string()) {
                items.push(FrontierItem::new(normalized, next_depth));
            }
        }

        items
    }

    /// Admits the eligible links of a successful outcome into `frontier`
    ///
    /// # Returns
    ///
    /// The items actually admitted. Failures and pages at `max_depth`
    /// yield nothing.
    pub fn discover(&self, outcome: &FetchOutcome, frontier: &Frontier) -> Vec<FrontierItem> {
        let FetchOutcome::Success {
            url,
            depth,
            discovered_links,
            ..
        } = outcome
        else {
            return Vec::new();
        };

        let mut admitted = Vec::new();
        for item in self.candidates(url, *depth, discovered_links) {
            let classification = frontier.admit(item.clone());
            if classification.is_eligible() {
                admitted.push(item);
            } else {
                tracing::debug!("Not admitting {}: {:?}", item.url, classification);
            }
        }

        if !admitted.is_empty() {
            tracing::debug!(
                "{} new links from {} at depth {}",
                admitted.len(),
                url,
                depth + 1
            );
        }

        admitted
    }
}
