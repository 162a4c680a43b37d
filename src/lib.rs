//! Sumi-Spider: a bounded recursive site crawler
//!
//! This crate implements a depth-bounded, page-bounded spider that stays on a
//! seed's host, honors include/exclude URL patterns and robots.txt, and runs
//! page fetches with bounded concurrency while isolating per-page failures.

pub mod api;
pub mod auth;
pub mod config;
pub mod crawler;
pub mod extraction;
pub mod output;
pub mod robots;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Spider operations
#[derive(Debug, Error)]
pub enum SpiderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("Unauthorized: {0}")]
    Auth(#[from] AuthError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::SpiderState,
        to: state::SpiderState,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Request parameter errors, rejected before any crawling begins
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Malformed request body: {0}")]
    Malformed(String),

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("Invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Unknown extraction type '{0}', expected one of basic, llm, cosine, json_css")]
    UnknownExtraction(String),

    #[error("Invalid extraction params: {0}")]
    ExtractionParams(String),

    #[error("LLM extraction requested but no LLM endpoint is configured")]
    LlmNotConfigured,

    #[error("Invalid crawler_params.{key}: {reason}")]
    CrawlerParam { key: String, reason: String },
}

/// Bearer token errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("invalid bearer token")]
    InvalidToken,
}

/// Failure of a single page fetch
///
/// The `Display` form is what ends up in `failed_urls`.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("timeout")]
    Timeout,

    #[error("HTTP {status}")]
    Http { status: u16 },

    #[error("{0}")]
    Network(String),

    #[error("Expected HTML, got {content_type}")]
    ContentMismatch { content_type: String },

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("cancelled: overall deadline exceeded")]
    Cancelled,

    #[error("fetch task failed: {0}")]
    TaskFailed(String),
}

/// Failure of an extraction strategy on a single page
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("invalid selector '{0}'")]
    InvalidSelector(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("LLM request failed: {0}")]
    Llm(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Sumi-Spider operations
pub type Result<T> = std::result::Result<T, SpiderError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use api::{handle_spider, ApiError, SpiderRequest, SpiderResponse, SpiderService};
pub use config::Config;
pub use crawler::{CrawlJob, JobSummary, PageFetcher};
pub use state::SpiderState;
pub use url::{extract_domain, normalize_url};
