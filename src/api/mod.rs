//! Transport-agnostic `POST /spider` boundary
//!
//! `SpiderService` authenticates a request, validates it into a `CrawlJob`,
//! runs the job and returns the summary. Errors carry the HTTP status a
//! server would answer with; per-page failures are never request errors.

mod request;

pub use request::SpiderRequest;

use crate::auth::TokenValidator;
use crate::config::Config;
use crate::crawler::{build_http_client, Coordinator, HttpFetcher, JobSummary, PageFetcher};
use crate::{AuthError, SpiderError, ValidationError};
use reqwest::Client;
use serde_json::{json, Value};
use std::ops::RangeInclusive;
use std::sync::Arc;
use thiserror::Error;

/// Accepted `max_depth` values
pub const MAX_DEPTH_RANGE: RangeInclusive<u32> = 1..=10;

/// Accepted `max_pages` values
pub const MAX_PAGES_RANGE: RangeInclusive<u32> = 1..=1000;

/// Accepted `batch_size` values
pub const BATCH_SIZE_RANGE: RangeInclusive<u32> = 1..=50;

/// Response body of a successful spider request
pub type SpiderResponse = JobSummary;

/// Request-level failure
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Spider job failed: {0}")]
    Internal(#[from] SpiderError),
}

impl ApiError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Auth(_) => 401,
            Self::Internal(_) => 500,
        }
    }

    /// Error body: `{"detail": "<message>"}`
    pub fn body(&self) -> Value {
        json!({ "detail": self.to_string() })
    }
}

/// Converts a handler result into `(status, body)`
pub fn render_response(result: &Result<SpiderResponse, ApiError>) -> (u16, Value) {
    match result {
        Ok(summary) => match serde_json::to_value(summary) {
            Ok(body) => (200, body),
            Err(e) => (500, json!({ "detail": e.to_string() })),
        },
        Err(e) => (e.status_code(), e.body()),
    }
}

/// Everything a spider request needs besides the request itself
pub struct SpiderService {
    config: Arc<Config>,
    validator: TokenValidator,
    fetcher: Arc<dyn PageFetcher>,
    client: Client,
}

impl SpiderService {
    /// Builds a service that fetches pages over HTTP
    pub fn new(config: Config) -> Result<Self, SpiderError> {
        let client = build_http_client(&config.user_agent)?;
        let fetcher = Arc::new(HttpFetcher::new(client.clone()));
        Ok(Self::with_fetcher(config, fetcher, client))
    }

    /// Builds a service around a custom page fetcher
    ///
    /// `client` is still used for robots.txt.
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn PageFetcher>, client: Client) -> Self {
        Self {
            validator: TokenValidator::from_config(&config.auth),
            config: Arc::new(config),
            fetcher,
            client,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handles a raw JSON request body
    pub async fn handle_json(
        &self,
        authorization: Option<&str>,
        body: &str,
    ) -> Result<SpiderResponse, ApiError> {
        self.validator.validate(authorization)?;
        let request = SpiderRequest::from_json(body)?;
        self.run(request).await
    }

    /// Handles an already decoded request
    pub async fn handle(
        &self,
        authorization: Option<&str>,
        request: SpiderRequest,
    ) -> Result<SpiderResponse, ApiError> {
        self.validator.validate(authorization)?;
        self.run(request).await
    }

    async fn run(&self, request: SpiderRequest) -> Result<SpiderResponse, ApiError> {
        let job = request.into_job(&self.config)?;
        tracing::info!("Accepted spider request for {}", job.seed_url);

        let mut coordinator = Coordinator::new(job, Arc::clone(&self.fetcher));
        if self.config.spider.respect_robots_txt {
            coordinator =
                coordinator.with_robots(self.client.clone(), &self.config.user_agent.crawler_name);
        }

        Ok(coordinator.run().await?)
    }
}

/// Handles one `POST /spider` request
///
/// # Arguments
///
/// * `service` - Config, token validator and fetcher
/// * `authorization` - Value of the `Authorization` header, if any
/// * `request` - Decoded request body
///
/// # Returns
///
/// * `Ok(SpiderResponse)` - Job summary, even if every page failed
/// * `Err(ApiError)` - 400 for invalid parameters, 401 for bad credentials
pub async fn handle_spider(
    service: &SpiderService,
    authorization: Option<&str>,
    request: SpiderRequest,
) -> Result<SpiderResponse, ApiError> {
    service.handle(authorization, request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hash_token;
    use crate::config::AuthConfig;

    fn service(tokens: &[&str]) -> SpiderService {
        let config = Config {
            auth: AuthConfig {
                token_hashes: tokens.iter().map(|t| hash_token(t)).collect(),
            },
            ..Config::default()
        };
        SpiderService::new(config).unwrap()
    }

    #[test]
    fn test_status_codes() {
        let validation = ApiError::from(ValidationError::Malformed("x".to_string()));
        assert_eq!(validation.status_code(), 400);
        assert_eq!(ApiError::from(AuthError::MissingToken).status_code(), 401);
    }

    #[test]
    fn test_error_body_has_detail() {
        let err = ApiError::from(ValidationError::OutOfRange {
            field: "max_depth",
            value: 0,
            min: 1,
            max: 10,
        });
        let (status, body) = render_response(&Err(err));
        assert_eq!(status, 400);
        assert_eq!(body["detail"], "max_depth must be between 1 and 10, got 0");
    }

    #[tokio::test]
    async fn test_auth_checked_before_validation() {
        let svc = service(&["secret"]);
        let err = svc
            .handle_json(None, r#"{"url": "not a url"}"#)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 401);

        let err = svc
            .handle_json(Some("Bearer secret"), r#"{"url": "not a url"}"#)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_invalid_request_rejected_without_crawling() {
        let svc = service(&[]);
        let request = SpiderRequest {
            max_pages: Some(5000),
            ..SpiderRequest::new("https://example.com")
        };
        let err = handle_spider(&svc, None, request).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Validation(ValidationError::OutOfRange { field: "max_pages", .. })
        ));
    }

    #[tokio::test]
    async fn test_oversized_timeout_is_bad_request() {
        let svc = service(&[]);
        let body = r#"{"url": "https://example.com", "crawler_params": {"timeout": 1e20}}"#;
        let err = svc.handle_json(None, body).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(matches!(
            err,
            ApiError::Validation(ValidationError::CrawlerParam { ref key, .. }) if key == "timeout"
        ));
    }
}
