use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use shared::settings::ApiSettings;
use std::sync::LazyLock;
use tracing::debug;

use crate::error::TransportError;
use crate::transport::{CompletionBackend, CompletionRequest, OpenedResponse};

// No client-wide timeout: streams may legitimately run for minutes. The
// per-attempt header timeout lives in `ResilientTransport`.
static SHARED_HTTP: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .pool_max_idle_per_host(2)
        .build()
        .expect("failed to build HTTP client")
});

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Chat-completions backend for OpenRouter (or any OpenAI-compatible endpoint).
pub struct OpenRouterClient {
    http: Client,
    endpoint: String,
    referer: String,
    title: String,
}

impl OpenRouterClient {
    pub fn new(api: &ApiSettings) -> Self {
        Self::with_client(SHARED_HTTP.clone(), api)
    }

    pub fn with_client(http: Client, api: &ApiSettings) -> Self {
        Self {
            http,
            endpoint: api.endpoint.clone(),
            referer: api.referer.clone(),
            title: api.title.clone(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionBackend for OpenRouterClient {
    async fn open(
        &self,
        credential: &str,
        request: &CompletionRequest,
    ) -> Result<OpenedResponse, TransportError> {
        debug!(
            "POST {} model={} messages={} stream={}",
            self.endpoint,
            request.model,
            request.messages.len(),
            request.stream
        );
        let resp = self
            .http
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", credential))
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        let event_stream = match resp.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
            Some(content_type) => content_type.contains("text/event-stream"),
            None => request.stream,
        };
        let body = resp
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| TransportError::StreamRead(e.to_string()))
            })
            .boxed();

        Ok(OpenedResponse { event_stream, body })
    }
}

/// Best human-readable message from an error response body: the API's
/// `error.message` if present, else the (truncated) body, else the status text.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        if let Some(message) = envelope.error.message.filter(|m| !m.trim().is_empty()) {
            return message;
        }
    }
    let detail: String = body.trim().chars().take(800).collect();
    if !detail.is_empty() {
        return detail;
    }
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| "API request failed".to_string())
}
