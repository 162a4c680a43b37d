use super::{Block, ExtractionInput, ExtractionStrategy};
use crate::{ExtractionError, ValidationError};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;

const DEFAULT_THRESHOLD: f64 = 0.3;
const DEFAULT_TOP_K: usize = 3;

/// Keeps the text blocks most similar to a semantic filter
///
/// Similarity is the cosine of term-frequency vectors over lowercase
/// alphanumeric words. Without a filter every block is returned.
///
/// Params: `semantic_filter` (string), `threshold` (0..=1, default 0.3),
/// `top_k` (default 3).
#[derive(Debug, Clone)]
pub struct CosineExtraction {
    filter: Option<HashMap<String, f64>>,
    threshold: f64,
    top_k: usize,
}

impl CosineExtraction {
    /// Builds the strategy from `extraction_config.params`
    pub fn from_params(params: &Map<String, Value>) -> Result<Self, ValidationError> {
        let filter = match params.get("semantic_filter") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(Value::String(s)) => Some(term_frequencies(s)),
            Some(_) => {
                return Err(ValidationError::ExtractionParams(
                    "semantic_filter must be a string".to_string(),
                ))
            }
        };

        let threshold = match params.get("threshold") {
            None => DEFAULT_THRESHOLD,
            Some(v) => v
                .as_f64()
                .filter(|t| (0.0..=1.0).contains(t))
                .ok_or_else(|| {
                    ValidationError::ExtractionParams(
                        "threshold must be a number between 0 and 1".to_string(),
                    )
                })?,
        };

        let top_k = match params.get("top_k") {
            None => DEFAULT_TOP_K,
            Some(v) => v
                .as_u64()
                .filter(|k| *k > 0)
                .map(|k| k as usize)
                .ok_or_else(|| {
                    ValidationError::ExtractionParams("top_k must be a positive integer".to_string())
                })?,
        };

        Ok(Self {
            filter,
            threshold,
            top_k,
        })
    }

    fn rank<'a>(&self, blocks: &'a [String]) -> Vec<Block<'a>> {
        let Some(filter) = &self.filter else {
            return blocks
                .iter()
                .enumerate()
                .map(|(index, content)| Block {
                    index,
                    content,
                    score: None,
                })
                .collect();
        };

        let mut scored: Vec<Block<'a>> = blocks
            .iter()
            .enumerate()
            .map(|(index, content)| Block {
                index,
                content,
                score: Some(cosine_similarity(filter, &term_frequencies(content))),
            })
            .filter(|b| b.score.unwrap_or(0.0) >= self.threshold)
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.index.cmp(&b.index))
        });
        scored.truncate(self.top_k);
        scored
    }
}

#[async_trait]
impl ExtractionStrategy for CosineExtraction {
    fn name(&self) -> &'static str {
        "cosine"
    }

    async fn extract(&self, input: ExtractionInput<'_>) -> Result<String, ExtractionError> {
        Ok(serde_json::to_string(&self.rank(input.blocks))?)
    }
}

fn term_frequencies(text: &str) -> HashMap<String, f64> {
    let mut tf = HashMap::new();
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        *tf.entry(word.to_lowercase()).or_insert(0.0) += 1.0;
    }
    tf
}

fn cosine_similarity(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
    let dot: f64 = a
        .iter()
        .filter_map(|(term, wa)| b.get(term).map(|wb| wa * wb))
        .sum();
    let norm_a = a.values().map(|w| w * w).sum::<f64>().sqrt();
    let norm_b = b.values().map(|w| w * w).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
