use super::{ExtractionInput, ExtractionStrategy};
use crate::config::LlmConfig;
use crate::{ExtractionError, ValidationError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

const DEFAULT_INSTRUCTION: &str =
    "Extract the main content of this page as concise JSON. Respond with JSON only.";

/// Page text sent to the model is cut at this many characters
const MAX_INPUT_CHARS: usize = 16_000;

const LLM_TIMEOUT: Duration = Duration::from_secs(60);

/// Sends page text to an OpenAI-compatible chat completion endpoint
#[derive(Debug, Clone)]
pub struct LlmExtraction {
    client: Client,
    endpoint: String,
    model: String,
    token: Option<String>,
    instruction: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl LlmExtraction {
    /// Builds the strategy from service settings and request params
    ///
    /// # Arguments
    ///
    /// * `config` - Endpoint, model, and token source from the service config
    /// * `params` - Request params; `instruction` (string) overrides the default prompt
    pub fn from_params(
        config: &LlmConfig,
        params: &Map<String, Value>,
    ) -> Result<Self, ValidationError> {
        let instruction = match params.get("instruction") {
            None | Some(Value::Null) => DEFAULT_INSTRUCTION.to_string(),
            Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
            Some(_) => {
                return Err(ValidationError::ExtractionParams(
                    "instruction must be a non-empty string".to_string(),
                ))
            }
        };

        let token = config
            .api_token_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|t| !t.is_empty());

        if config.api_token_env.is_some() && token.is_none() {
            tracing::warn!("LLM token variable is configured but not set; sending without auth");
        }

        let client = Client::builder()
            .timeout(LLM_TIMEOUT)
            .build()
            .map_err(|e| ValidationError::ExtractionParams(format!("LLM client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            token,
            instruction,
        })
    }
}

#[async_trait]
impl ExtractionStrategy for LlmExtraction {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn extract(&self, input: ExtractionInput<'_>) -> Result<String, ExtractionError> {
        let text = truncate_chars(&input.blocks.join("\n"), MAX_INPUT_CHARS);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.instruction,
                },
                ChatMessage {
                    role: "user",
                    content: &text,
                },
            ],
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        tracing::debug!("LLM extraction for {}", input.url);
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::Llm(format!("endpoint returned {}", status)));
        }

        let reply: ChatResponse = response.json().await?;
        reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ExtractionError::Llm("response had no content".to_string()))
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
