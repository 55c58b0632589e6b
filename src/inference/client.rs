//! Ollama chat client.
//!
//! Sends `/api/chat` requests to the local model server, either buffered or
//! as an NDJSON stream, and classifies every failure into an
//! [`InferenceError`]. No retries and no fallback: one call, one round trip.

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::Client as HttpClient;
use reqwest::StatusCode;

use super::backend::{ChatBackend, FragmentStream};
use super::config::BackendConfig;
use super::errors::InferenceError;
use super::streaming::{parse_chat_response, parse_ndjson_stream};
use super::types::{ChatMessage, ChatRequest, TagsResponse, ToolDefinition};

/// Path of the chat endpoint.
const CHAT_PATH: &str = "/api/chat";

/// Path of the installed-models endpoint.
const TAGS_PATH: &str = "/api/tags";

// ─── OllamaClient ────────────────────────────────────────────────────────────

/// Client for the local Ollama endpoint.
///
/// Cheap to share behind an `Arc`; the inner reqwest client pools connections.
pub struct OllamaClient {
    http: HttpClient,
    config: BackendConfig,
}

impl OllamaClient {
    /// Build a client. Does NOT check connectivity; that happens on the
    /// first request.
    pub fn new(config: BackendConfig) -> Result<Self, InferenceError> {
        let http = HttpClient::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| InferenceError::ConfigError {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self { http, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Send a chat request and return the successful response.
    async fn send_chat(
        &self,
        messages: &[ChatMessage],
        model: &str,
        tools: Option<&[ToolDefinition]>,
        stream: bool,
    ) -> Result<reqwest::Response, InferenceError> {
        let url = self.config.endpoint(CHAT_PATH);
        let body = ChatRequest {
            model,
            messages,
            stream,
            tools,
            options: self.config.options,
        };

        // Log the request metadata (not the full body, it can be huge)
        tracing::info!(
            url = %url,
            model = %model,
            message_count = messages.len(),
            tool_count = tools.map(<[ToolDefinition]>::len).unwrap_or(0),
            stream,
            "sending chat request"
        );

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify_transport_error(&url, e))?;

        check_status(response, model).await
    }

    /// Map a reqwest failure onto the error taxonomy.
    fn classify_transport_error(&self, url: &str, err: reqwest::Error) -> InferenceError {
        if err.is_timeout() {
            InferenceError::Timeout {
                duration_secs: self.config.request_timeout_secs,
            }
        } else if err.is_connect() {
            InferenceError::ConnectionFailed {
                endpoint: url.to_string(),
                reason: err.to_string(),
            }
        } else if err.is_body() || err.is_decode() {
            InferenceError::StreamError {
                reason: format!("failed to read response body: {err}"),
            }
        } else {
            InferenceError::ConnectionFailed {
                endpoint: url.to_string(),
                reason: err.to_string(),
            }
        }
    }

    // ─── Model listing ───────────────────────────────────────────────────

    /// Names of the models installed on the backend.
    pub async fn list_models(&self) -> Result<Vec<String>, InferenceError> {
        let url = self.config.endpoint(TAGS_PATH);
        let response = self
            .http
            .get(&url)
            .timeout(self.config.connect_timeout())
            .send()
            .await
            .map_err(|e| self.classify_transport_error(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::HttpError {
                status: status.as_u16(),
                body,
            });
        }

        let tags: TagsResponse = response.json().await.map_err(|e| InferenceError::StreamError {
            reason: format!("failed to parse model list: {e}"),
        })?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Whether the backend is reachable. Never errors.
    pub async fn health_check(&self) -> bool {
        let url = self.config.endpoint(TAGS_PATH);
        match self
            .http
            .get(&url)
            .timeout(self.config.connect_timeout())
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "health check failed");
                false
            }
        }
    }
}

#[async_trait]
impl ChatBackend for OllamaClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
        tools: Option<&[ToolDefinition]>,
    ) -> Result<ChatMessage, InferenceError> {
        let url = self.config.endpoint(CHAT_PATH);
        let response = self.send_chat(messages, model, tools, false).await?;

        let body = response
            .text()
            .await
            .map_err(|e| self.classify_transport_error(&url, e))?;

        let message = parse_chat_response(&body)?;
        tracing::info!(
            model = %model,
            content_len = message.content.len(),
            tool_calls = message.requested_tool_calls().len(),
            "chat response received"
        );
        Ok(message)
    }

    async fn complete_stream(
        &self,
        messages: &[ChatMessage],
        model: &str,
    ) -> Result<FragmentStream, InferenceError> {
        let url = self.config.endpoint(CHAT_PATH);
        let response = self.send_chat(messages, model, None, true).await?;

        let timeout_secs = self.config.request_timeout_secs;
        let bytes = response.bytes_stream().map_err(move |e| {
            if e.is_timeout() {
                InferenceError::Timeout {
                    duration_secs: timeout_secs,
                }
            } else {
                InferenceError::StreamError {
                    reason: format!("stream read error from {url}: {e}"),
                }
            }
        });

        Ok(Box::pin(parse_ndjson_stream(Box::pin(bytes))))
    }
}

/// Turn non-2xx responses into classified errors.
async fn check_status(
    response: reqwest::Response,
    model: &str,
) -> Result<reqwest::Response, InferenceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(classify_status(status, body, model))
}

fn classify_status(status: StatusCode, body: String, model: &str) -> InferenceError {
    if status == StatusCode::NOT_FOUND {
        tracing::error!(model = %model, body = %body, "model not found on backend");
        InferenceError::ModelNotFound {
            model: model.to_string(),
        }
    } else {
        tracing::error!(status = status.as_u16(), body = %body, "backend returned error status");
        InferenceError::HttpError {
            status: status.as_u16(),
            body,
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
