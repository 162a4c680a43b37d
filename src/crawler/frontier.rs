//! Depth-ordered frontier with the job's visited set
//!
//! Pending items are kept in one FIFO queue per depth. Batches are drained
//! from the shallowest non-empty wave only, and the coordinator resolves a
//! whole batch before draining again, so every depth-d fetch finishes before
//! any depth-(d+1) fetch starts.
//!
//! The visited set and the queues share one mutex. Admission checks the
//! classifier and inserts into the visited set under that lock, so a URL can
//! be admitted at most once no matter how many pages link to it.

use crate::crawler::job::FrontierItem;
use crate::url::{UrlClassification, UrlClassifier};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use url::Url;

#[derive(Debug, Default)]
struct FrontierInner {
    waves: BTreeMap<u32, VecDeque<FrontierItem>>,
    visited: HashSet<String>,
    current_depth: u32,
}

/// Pending URLs of one job plus every URL ever admitted
#[derive(Debug)]
pub struct Frontier {
    classifier: Arc<UrlClassifier>,
    inner: Mutex<FrontierInner>,
}

impl Frontier {
    pub fn new(classifier: Arc<UrlClassifier>) -> Self {
        Self {
            classifier,
            inner: Mutex::new(FrontierInner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FrontierInner> {
        // The guarded data stays consistent even if a holder panicked
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Admits the seed at depth 0, bypassing include/exclude patterns
    ///
    /// Returns false if the seed was already admitted.
    pub fn admit_seed(&self, url: Url) -> bool {
        let mut inner = self.lock();
        if !inner.visited.insert(url.as_str().to_string()) {
            return false;
        }
        inner
            .waves
            .entry(0)
            .or_default()
            .push_back(FrontierItem::new(url, 0));
        true
    }

    /// Admits `item` if the classifier accepts it
    ///
    /// The visited check, the classification and the visited insert happen
    /// under a single lock acquisition.
    ///
    /// # Returns
    ///
    /// The classification; the item was enqueued iff it is `Eligible`.
    pub fn admit(&self, item: FrontierItem) -> UrlClassification {
        let mut inner = self.lock();
        let classification = self.classifier.classify(&item.url, &inner.visited);

        if classification.is_eligible() {
            inner.visited.insert(item.url.as_str().to_string());
            inner.waves.entry(item.depth).or_default().push_back(item);
        }

        classification
    }

    /// Removes up to `n` items from the shallowest non-empty wave
    pub fn drain_batch(&self, n: usize) -> Vec<FrontierItem> {
        let mut inner = self.lock();

        let Some((&depth, wave)) = inner.waves.iter_mut().find(|(_, wave)| !wave.is_empty()) else {
            return Vec::new();
        };

        let take = n.min(wave.len());
        let batch: Vec<FrontierItem> = wave.drain(..take).collect();
        let now_empty = wave.is_empty();

        if now_empty {
            inner.waves.remove(&depth);
        }
        inner.current_depth = depth;

        batch
    }

    /// True if any wave still holds items
    pub fn has_pending(&self) -> bool {
        self.lock().waves.values().any(|wave| !wave.is_empty())
    }

    /// Depth of the most recently drained wave
    pub fn current_depth(&self) -> u32 {
        self.lock().current_depth
    }

    pub fn pending_count(&self) -> usize {
        self.lock().waves.values().map(VecDeque::len).sum()
    }

    pub fn visited_count(&self) -> usize {
        self.lock().visited.len()
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        self.lock().visited.contains(url.as_str())
    }

    pub fn classifier(&self) -> &UrlClassifier {
        &self.classifier
    }
}
