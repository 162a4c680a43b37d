//! `POST /spider` request body and its validation into a `CrawlJob`

use crate::api::{BATCH_SIZE_RANGE, MAX_DEPTH_RANGE, MAX_PAGES_RANGE};
use crate::config::Config;
use crate::crawler::{CrawlJob, CrawlerParams};
use crate::extraction::{select_strategy, ExtractionConfig};
use crate::url::normalize_parsed;
use crate::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Body of a spider request
///
/// Numeric limits are kept as raw integers so that out-of-range values
/// (including negative ones) are reported as range errors rather than
/// as malformed JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpiderRequest {
    /// Absolute http(s) seed URL
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_patterns: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_patterns: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_config: Option<ExtractionConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crawler_params: Option<CrawlerParams>,
}

impl SpiderRequest {
    /// Creates a request for `url` with every optional field unset
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Parses a JSON request body
    pub fn from_json(body: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(body).map_err(|e| ValidationError::Malformed(e.to_string()))
    }

    /// Validates the request and builds the job it describes
    ///
    /// Defaults for omitted limits and the per-page timeout come from
    /// `config.spider`; the overall deadline starts now.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlJob)` - Ready-to-run job
    /// * `Err(ValidationError)` - First problem found; nothing was crawled
    pub fn into_job(self, config: &Config) -> Result<CrawlJob, ValidationError> {
        let seed_url = parse_seed(&self.url)?;
        let defaults = &config.spider;

        let max_depth = check_range(
            "max_depth",
            self.max_depth,
            defaults.default_max_depth,
            MAX_DEPTH_RANGE,
        )?;
        let max_pages = check_range(
            "max_pages",
            self.max_pages,
            defaults.default_max_pages,
            MAX_PAGES_RANGE,
        )?;
        let batch_size = check_range(
            "batch_size",
            self.batch_size,
            defaults.default_batch_size,
            BATCH_SIZE_RANGE,
        )?;

        let extraction = self
            .extraction_config
            .as_ref()
            .map(|c| select_strategy(c, &config.extraction))
            .transpose()?;

        let crawler_params = self.crawler_params.unwrap_or_default();
        let page_timeout = check_crawler_params(&crawler_params)?
            .unwrap_or(Duration::from_secs(defaults.page_timeout_secs));

        Ok(CrawlJob {
            seed_url,
            max_depth,
            max_pages,
            batch_size,
            include_patterns: non_empty(self.include_patterns),
            exclude_patterns: non_empty(self.exclude_patterns),
            overall_deadline: Instant::now() + Duration::from_secs(defaults.request_timeout_secs),
            drain_grace: Duration::from_secs(defaults.drain_grace_secs),
            page_timeout,
            crawler_params: Arc::new(crawler_params),
            extraction,
        })
    }
}

fn parse_seed(raw: &str) -> Result<Url, ValidationError> {
    let invalid = |reason: String| ValidationError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    normalize_parsed(url).map_err(|e| invalid(e.to_string()))
}

fn check_range(
    field: &'static str,
    value: Option<i64>,
    default: u32,
    range: RangeInclusive<u32>,
) -> Result<u32, ValidationError> {
    let value = value.unwrap_or(i64::from(default));
    let (min, max) = (i64::from(*range.start()), i64::from(*range.end()));

    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }

    u32::try_from(value).map_err(|_| ValidationError::OutOfRange {
        field,
        value,
        min,
        max,
    })
}

/// Empty patterns would match (or exclude) every URL; they are dropped
fn non_empty(patterns: Option<Vec<String>>) -> Vec<String> {
    patterns
        .unwrap_or_default()
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect()
}

/// Checks the keys of `crawler_params` the spider itself understands
///
/// Returns the per-page timeout override, if one was given.
fn check_crawler_params(params: &CrawlerParams) -> Result<Option<Duration>, ValidationError> {
    let param_error = |key: &str, reason: &str| ValidationError::CrawlerParam {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    let timeout = match params.get("timeout") {
        None | Some(Value::Null) => None,
        Some(value) => {
            let secs = value
                .as_f64()
                .filter(|s| s.is_finite() && *s > 0.0)
                .ok_or_else(|| param_error("timeout", "must be a positive number of seconds"))?;
            let timeout = Duration::try_from_secs_f64(secs)
                .map_err(|_| param_error("timeout", "is too large"))?;
            Some(timeout)
        }
    };

    if let Some(value) = params.get("screenshot") {
        if !value.is_boolean() && !value.is_null() {
            return Err(param_error("screenshot", "must be a boolean"));
        }
    }

    if let Some(value) = params.get("user_agent") {
        if !value.is_string() {
            return Err(param_error("user_agent", "must be a string"));
        }
    }

    if let Some(value) = params.get("headers") {
        let all_strings = value
            .as_object()
            .is_some_and(|headers| headers.values().all(Value::is_string));
        if !all_strings {
            return Err(param_error("headers", "must be an object of string values"));
        }
    }

    Ok(timeout)
}
