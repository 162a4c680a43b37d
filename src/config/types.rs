use serde::Deserialize;

/// Main configuration structure for Sumi-Spider
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub spider: SpiderConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub extraction: ExtractionSettings,
}

/// Spider behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpiderConfig {
    /// Depth limit used when a request omits `max_depth`
    #[serde(rename = "default-max-depth")]
    pub default_max_depth: u32,

    /// Page budget used when a request omits `max_pages`
    #[serde(rename = "default-max-pages")]
    pub default_max_pages: u32,

    /// Concurrency used when a request omits `batch_size`
    #[serde(rename = "default-batch-size")]
    pub default_batch_size: u32,

    /// Per-page fetch timeout (seconds), overridable by `crawler_params.timeout`
    #[serde(rename = "page-timeout-secs")]
    pub page_timeout_secs: u64,

    /// Overall job deadline (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// How long in-flight fetches may keep running after the deadline (seconds)
    #[serde(rename = "drain-grace-secs")]
    pub drain_grace_secs: u64,

    /// Whether robots.txt of the seed host is consulted
    #[serde(rename = "respect-robots-txt")]
    pub respect_robots_txt: bool,
}

impl Default for SpiderConfig {
    fn default() -> Self {
        Self {
            default_max_depth: 3,
            default_max_pages: 100,
            default_batch_size: 10,
            page_timeout_secs: 30,
            request_timeout_secs: 600,
            drain_grace_secs: 30,
            respect_robots_txt: true,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SumiSpider".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Full user agent header: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// API token configuration; empty means authentication is disabled
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Hex-encoded SHA-256 hashes of accepted bearer tokens
    #[serde(rename = "token-hashes", default)]
    pub token_hashes: Vec<String>,
}

/// Extraction backends that need service-side settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractionSettings {
    #[serde(default)]
    pub llm: Option<LlmConfig>,
}

/// OpenAI-compatible chat completion endpoint used by `llm` extraction
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub endpoint: String,

    pub model: String,

    /// Environment variable holding the endpoint's API token
    #[serde(rename = "api-token-env", default)]
    pub api_token_env: Option<String>,
}
