//! Content extraction strategies
//!
//! A request may ask for structured extraction on every fetched page via
//! `extraction_config.type`. The strategy is selected and validated once at
//! job start; running it is part of the page fetch, so its failures are
//! per-page failures.

mod basic;
mod cosine;
mod json_css;
mod llm;

pub use basic::BasicExtraction;
pub use cosine::CosineExtraction;
pub use json_css::JsonCssExtraction;
pub use llm::LlmExtraction;

use crate::config::ExtractionSettings;
use crate::{ExtractionError, ValidationError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Debug;
use std::sync::Arc;

/// `extraction_config` object of a spider request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// One of `basic`, `llm`, `cosine`, `json_css`
    #[serde(rename = "type", default = "default_extraction_type")]
    pub kind: String,

    /// Strategy-specific parameters
    #[serde(default)]
    pub params: Map<String, Value>,
}

fn default_extraction_type() -> String {
    "basic".to_string()
}

/// What a strategy sees of a fetched page
#[derive(Debug, Clone, Copy)]
pub struct ExtractionInput<'a> {
    pub url: &'a str,
    pub html: &'a str,
    /// Visible text blocks in document order (headings, paragraphs, list items, ...)
    pub blocks: &'a [String],
}

/// A single way of turning a page into `extracted_content`
#[async_trait]
pub trait ExtractionStrategy: Send + Sync + Debug {
    /// The `extraction_config.type` this strategy answers to
    fn name(&self) -> &'static str;

    /// Extracts content from one page, returning a JSON string
    async fn extract(&self, input: ExtractionInput<'_>) -> Result<String, ExtractionError>;
}

/// Selects and validates the strategy for `config`
///
/// # Returns
///
/// * `Ok(Arc<dyn ExtractionStrategy>)` - Ready-to-run strategy
/// * `Err(ValidationError)` - Unknown type, bad params, or missing service settings
pub fn select_strategy(
    config: &ExtractionConfig,
    settings: &ExtractionSettings,
) -> Result<Arc<dyn ExtractionStrategy>, ValidationError> {
    let strategy: Arc<dyn ExtractionStrategy> = match config.kind.as_str() {
        "basic" => Arc::new(BasicExtraction),
        "cosine" => Arc::new(CosineExtraction::from_params(&config.params)?),
        "json_css" => Arc::new(JsonCssExtraction::from_params(&config.params)?),
        "llm" => {
            let llm = settings.llm.as_ref().ok_or(ValidationError::LlmNotConfigured)?;
            Arc::new(LlmExtraction::from_params(llm, &config.params)?)
        }
        other => return Err(ValidationError::UnknownExtraction(other.to_string())),
    };

    tracing::debug!("Selected extraction strategy: {}", strategy.name());
    Ok(strategy)
}

/// One extracted text block
#[derive(Debug, Clone, Serialize)]
struct Block<'a> {
    index: usize,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<f64>,
}
