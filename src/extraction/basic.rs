use super::{Block, ExtractionInput, ExtractionStrategy};
use crate::ExtractionError;
use async_trait::async_trait;

/// Returns every visible text block as `[{"index", "content"}]`
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicExtraction;

#[async_trait]
impl ExtractionStrategy for BasicExtraction {
    fn name(&self) -> &'static str {
        "basic"
    }

    async fn extract(&self, input: ExtractionInput<'_>) -> Result<String, ExtractionError> {
        let blocks: Vec<Block<'_>> = input
            .blocks
            .iter()
            .enumerate()
            .map(|(index, content)| Block {
                index,
                content,
                score: None,
            })
            .collect();

        Ok(serde_json::to_string(&blocks)?)
    }
}
