/// LLM Client: the single point of entry for all completion calls in the summarizer.
///
/// ARCHITECTURAL RULE: No other module may call the provider API directly.
/// Handlers go through `dispatch`, which owns parameter derivation and the
/// mapping from provider failures to the categorized `LlmError`.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::summarize::prompts::Prompt;

const OPENAI_API_URL: &str = "https://api.openai.com/v1";
const TEMPERATURE: f32 = 0.2;
const FREQUENCY_PENALTY: f32 = 0.3;
/// 2.2 tokens per word, kept in tenths so the ceiling is exact.
const TOKENS_PER_WORD_TENTHS: u32 = 22;
const MIN_MAX_TOKENS: u32 = 64;

/// Categorized provider failure. The `message` fields carry the provider's
/// raw text for logging only; `AppError` never renders them.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("provider rejected credentials: {message}")]
    Auth { message: String },

    #[error("provider denied model access: {message}")]
    Permission { message: String },

    #[error("provider returned empty content")]
    EmptyContent,

    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// Sampling parameters sent with every completion request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionParams {
    pub temperature: f32,
    pub max_tokens: u32,
    pub frequency_penalty: f32,
}

impl CompletionParams {
    /// Derives the output cap from the word budget with a generous
    /// tokens-per-word multiplier, floored at `MIN_MAX_TOKENS`.
    pub fn for_word_budget(max_words: u32) -> Self {
        let max_tokens = (max_words.saturating_mul(TOKENS_PER_WORD_TENTHS) + 9) / 10;
        Self {
            temperature: TEMPERATURE,
            max_tokens: max_tokens.max(MIN_MAX_TOKENS),
            frequency_penalty: FREQUENCY_PENALTY,
        }
    }
}

/// The completion capability. Implement this to swap providers without
/// touching handlers. Carried in `AppState` as `Arc<dyn Completer>`.
#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(
        &self,
        model: &str,
        system: &str,
        user: &str,
        params: CompletionParams,
    ) -> Result<String, LlmError>;
}

/// Sends the prompt once (no retry) and returns the trimmed summary.
pub async fn dispatch(
    completer: &dyn Completer,
    model: &str,
    prompt: &Prompt,
    max_words: u32,
) -> Result<String, LlmError> {
    let params = CompletionParams::for_word_budget(max_words);
    let result = completer
        .complete(model, &prompt.system, &prompt.user, params)
        .await;

    match result {
        Ok(text) => {
            let summary = text.trim();
            if summary.is_empty() {
                warn!(model, "completion succeeded with empty content");
                return Err(LlmError::EmptyContent);
            }
            Ok(summary.to_string())
        }
        Err(err) => {
            error!(model, error = %err, "summarization failed");
            Err(err)
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
    frequency_penalty: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

/// Chat-completions client for OpenAI and OpenAI-compatible servers
/// (LM Studio, vLLM, ...).
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url
            .unwrap_or_else(|| OPENAI_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            client,
            api_key,
            base_url,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl Completer for OpenAiClient {
    async fn complete(
        &self,
        model: &str,
        system: &str,
        user: &str,
        params: CompletionParams,
    ) -> Result<String, LlmError> {
        let request_body = ChatRequest {
            model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            frequency_penalty: params.frequency_penalty,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Unavailable("provider call timed out".to_string())
                } else {
                    LlmError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Unavailable(format!("undecodable provider response: {e}")))?;

        if let Some(usage) = &chat.usage {
            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(LlmError::EmptyContent)
    }
}

/// Maps a non-success provider status to its category.
fn classify_failure(status: StatusCode, body: &str) -> LlmError {
    // Try to parse error message
    let message = serde_json::from_str::<ProviderError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());

    match status {
        StatusCode::UNAUTHORIZED => LlmError::Auth { message },
        StatusCode::FORBIDDEN => LlmError::Permission { message },
        other => LlmError::Unavailable(format!("status {}: {message}", other.as_u16())),
    }
}
