//! OpenAI-compatible chat completion client.

use async_stream::stream;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::LlmConfig;
use crate::llm::ChatMessage;
use crate::utils::HttpClient;

/// Errors from the chat completion API
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    /// Network or transport failure
    #[error("network error: {0}")]
    Network(String),

    /// The API returned a non-success status
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body, as far as it could be read
        message: String,
    },

    /// The response body did not match the expected shape
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Network(err.to_string())
    }
}

/// Sampling parameters for one completion request
#[derive(Debug, Clone, Copy)]
pub struct CompletionParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for CompletionParams {
    fn default() -> Self {
        Self {
            max_tokens: 4000,
            temperature: 0.1,
            top_p: 0.8,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    delta: ChunkDelta,
}

#[derive(Debug, Deserialize, Default)]
struct ChunkDelta {
    content: Option<String>,
}

/// Chat completion client for an OpenAI-compatible HTTP API.
///
/// The base URL is configurable so the client works against any compatible
/// endpoint (including a local mock in tests).
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: HttpClient,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl ChatClient {
    /// Create a client from the LLM configuration section.
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            http: HttpClient::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    fn request(&self, messages: &[ChatMessage], params: CompletionParams, stream: bool) -> reqwest::RequestBuilder {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
            stream,
        };
        let mut request = self
            .http
            .client()
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        request
    }

    /// Request a completion and return the assistant message in full.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        params: CompletionParams,
    ) -> Result<String, LlmError> {
        debug!(model = %self.model, "requesting chat completion");
        let response = self.request(messages, params, false).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::MalformedResponse("no completion choices".to_string()))
    }

    /// Request a streamed completion and yield assistant text deltas as
    /// they arrive over the SSE wire.
    pub async fn stream(
        &self,
        messages: &[ChatMessage],
        params: CompletionParams,
    ) -> Result<BoxStream<'static, Result<String, LlmError>>, LlmError> {
        debug!(model = %self.model, "requesting streamed chat completion");
        let response = self.request(messages, params, true).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let bytes = response.bytes_stream();
        Ok(stream! {
            futures_util::pin_mut!(bytes);
            let mut buffer: Vec<u8> = Vec::new();
            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(err) => {
                        yield Err(LlmError::Network(err.to_string()));
                        return;
                    }
                };
                buffer.extend_from_slice(&chunk);

                while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=pos).collect();
                    let line = String::from_utf8_lossy(&line);
                    let line = line.trim();

                    let Some(payload) = line.strip_prefix("data:") else {
                        continue;
                    };
                    let payload = payload.trim();
                    if payload == "[DONE]" {
                        return;
                    }

                    match serde_json::from_str::<ChatCompletionChunk>(payload) {
                        Ok(parsed) => {
                            let delta = parsed
                                .choices
                                .into_iter()
                                .next()
                                .and_then(|choice| choice.delta.content);
                            if let Some(delta) = delta {
                                if !delta.is_empty() {
                                    yield Ok(delta);
                                }
                            }
                        }
                        Err(err) => {
                            yield Err(LlmError::MalformedResponse(err.to_string()));
                            return;
                        }
                    }
                }
            }
        }
        .boxed())
    }
}
