//! Crawl eligibility rules for discovered URLs

use crate::robots::{is_allowed, ParsedRobots};
use crate::url::host_key;
use std::collections::HashSet;
use url::Url;

/// Why a URL was accepted or rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlClassification {
    /// URL may be admitted to the frontier
    Eligible,
    /// URL was already admitted earlier in this job
    AlreadySeen,
    /// Host (or port, or scheme) differs from the seed's
    OffDomain,
    /// Include patterns are set and none of them matched
    NotIncluded,
    /// An exclude pattern matched
    Excluded,
    /// robots.txt disallows the URL for our user agent
    RobotsDisallowed,
}

impl UrlClassification {
    /// Returns true if the URL should be crawled
    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible)
    }
}

/// Decides whether a URL belongs to the crawl
///
/// Rules are applied in order and short-circuit:
/// 1. already visited or queued
/// 2. exact host match with the seed (no subdomain wildcarding)
/// 3. include patterns (substring, any must match when non-empty)
/// 4. exclude patterns (substring, none may match)
/// 5. robots.txt, when a policy is attached
///
/// The classifier holds no mutable state; callers pass the visited snapshot.
#[derive(Debug, Clone)]
pub struct UrlClassifier {
    seed_host: String,
    include_patterns: Vec<String>,
    exclude_patterns: Vec<String>,
    robots: Option<ParsedRobots>,
    robots_agent: String,
}

impl UrlClassifier {
    /// Creates a classifier bound to the seed's host
    ///
    /// Returns `None` if the seed has no host.
    pub fn new(seed: &Url, include_patterns: Vec<String>, exclude_patterns: Vec<String>) -> Option<Self> {
        Some(Self {
            seed_host: host_key(seed)?,
            include_patterns,
            exclude_patterns,
            robots: None,
            robots_agent: String::new(),
        })
    }

    /// Attaches a robots.txt policy checked for `agent`
    pub fn with_robots(mut self, robots: ParsedRobots, agent: &str) -> Self {
        self.robots = Some(robots);
        self.robots_agent = agent.to_string();
        self
    }

    /// Host key (host plus explicit port) every eligible URL must share
    pub fn seed_host(&self) -> &str {
        &self.seed_host
    }

    /// Classifies `url` against the job rules and the visited snapshot
    pub fn classify(&self, url: &Url, visited: &HashSet<String>) -> UrlClassification {
        let url_str = url.as_str();

        if visited.contains(url_str) {
            return UrlClassification::AlreadySeen;
        }

        if !self.same_host(url) {
            return UrlClassification::OffDomain;
        }

        if !self.include_patterns.is_empty()
            && !self.include_patterns.iter().any(|p| url_str.contains(p.as_str()))
        {
            return UrlClassification::NotIncluded;
        }

        if self.exclude_patterns.iter().any(|p| url_str.contains(p.as_str())) {
            return UrlClassification::Excluded;
        }

        if !self.robots_allows(url) {
            return UrlClassification::RobotsDisallowed;
        }

        UrlClassification::Eligible
    }

    /// Shorthand for `classify(..).is_eligible()`
    pub fn eligible(&self, url: &Url, visited: &HashSet<String>) -> bool {
        self.classify(url, visited).is_eligible()
    }

    /// Whether `url` is http(s) on exactly the seed's host
    pub fn same_host(&self, url: &Url) -> bool {
        matches!(url.scheme(), "http" | "https")
            && host_key(url).as_deref() == Some(self.seed_host.as_str())
    }

    /// Whether robots.txt (if any) allows `url`
    pub fn robots_allows(&self, url: &Url) -> bool {
        match &self.robots {
            Some(robots) => is_allowed(robots, url.as_str(), &self.robots_agent),
            None => true,
        }
    }
}
