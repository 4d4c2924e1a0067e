use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::Serialize;
use shared::agent_api::ChatMessage;
use shared::events::GenerationObserver;
use shared::settings::RetryPolicy;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::TransportError;
use crate::retry::retry_delay;
use crate::stream::{decode_completion_stream, decode_event_stream};

/// Response body as a stream of raw chunks.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, TransportError>>;

/// Receives `(delta, full_so_far)` for every piece of content, in order.
pub type DeltaSink<'a> = dyn FnMut(&str, &str) + Send + 'a;

/// Body of a chat-completion call.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    /// Structured-output schema descriptor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<serde_json::Value>,
    pub stream: bool,
}

/// A response whose headers have arrived with a success status.
pub struct OpenedResponse {
    /// `text/event-stream` body; otherwise a single completion object.
    pub event_stream: bool,
    pub body: ByteStream,
}

/// One attempt at opening a completion call.
///
/// Implementations return `Err(TransportError::Status { .. })` for non-success
/// HTTP statuses so the retry loop can classify them.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn open(
        &self,
        credential: &str,
        request: &CompletionRequest,
    ) -> Result<OpenedResponse, TransportError>;
}

/// Timeout + classified retry with exponential backoff around a backend.
pub struct ResilientTransport {
    backend: Arc<dyn CompletionBackend>,
    policy: RetryPolicy,
    observer: Arc<dyn GenerationObserver>,
}

impl ResilientTransport {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        policy: RetryPolicy,
        observer: Arc<dyn GenerationObserver>,
    ) -> Self {
        Self {
            backend,
            policy,
            observer,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Open the call, retrying retryable failures. Each attempt must produce
    /// response headers within `request_timeout`; a late attempt is dropped,
    /// which aborts the in-flight request.
    pub async fn open_with_retry(
        &self,
        credential: &str,
        request: &CompletionRequest,
    ) -> Result<OpenedResponse, TransportError> {
        let max_attempts = self.policy.max_attempts();
        let mut attempt: u32 = 0;

        loop {
            let outcome = match tokio::time::timeout(
                self.policy.request_timeout(),
                self.backend.open(credential, request),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(TransportError::Timeout {
                    after_ms: self.policy.request_timeout_ms,
                }),
            };

            match outcome {
                Ok(response) => {
                    if attempt > 0 {
                        info!("Request succeeded after {} attempts", attempt + 1);
                    }
                    return Ok(response);
                }
                Err(e) if attempt < self.policy.max_retries && e.is_retryable(&self.policy) => {
                    let delay = {
                        let mut rng = rand::thread_rng();
                        retry_delay(&self.policy, attempt, &mut rng)
                    };
                    attempt += 1;
                    warn!(
                        "Recoverable error on attempt {}/{}: {}. Retrying in {:?}...",
                        attempt, max_attempts, e, delay
                    );
                    self.observer
                        .on_retry_progress(attempt, self.policy.max_retries, delay);
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    if e.is_retryable(&self.policy) {
                        error!("Giving up after {} attempts: {}", attempt + 1, e);
                    } else {
                        debug!("Non-retryable error on attempt {}: {}", attempt + 1, e);
                    }
                    return Err(e);
                }
            }
        }
    }

    /// Run one logical generation: open with retry, then consume the body.
    /// Returns the full content; deltas go to `on_delta` as they arrive.
    pub async fn generate(
        &self,
        credential: &str,
        request: &CompletionRequest,
        on_delta: &mut DeltaSink<'_>,
    ) -> Result<String, TransportError> {
        let response = self.open_with_retry(credential, request).await?;
        if response.event_stream {
            decode_event_stream(response.body, on_delta).await
        } else {
            let content = decode_completion_stream(response.body).await?;
            if !content.is_empty() {
                on_delta(&content, &content);
            }
            Ok(content)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{stream, StreamExt};
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Replays scripted outcomes, one per attempt.
    struct ScriptedBackend {
        script: Mutex<VecDeque<Step>>,
        calls: AtomicU32,
    }

    enum Step {
        Fail(TransportError),
        Hang,
        Sse(Vec<&'static str>),
        Json(&'static str),
    }

    impl ScriptedBackend {
        fn new(steps: Vec<Step>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(steps.into()),
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl CompletionBackend for ScriptedBackend {
        async fn open(
            &self,
            _credential: &str,
            _request: &CompletionRequest,
        ) -> Result<OpenedResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let step = self.script.lock().pop_front();
            match step {
                Some(Step::Fail(e)) => Err(e),
                Some(Step::Hang) => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    unreachable!("timeout should have fired")
                }
                Some(Step::Sse(chunks)) => Ok(OpenedResponse {
                    event_stream: true,
                    body: stream::iter(chunks.into_iter().map(|c| Ok(c.as_bytes().to_vec()))).boxed(),
                }),
                Some(Step::Json(body)) => Ok(OpenedResponse {
                    event_stream: false,
                    body: stream::iter(vec![Ok(body.as_bytes().to_vec())]).boxed(),
                }),
                None => Err(TransportError::Status {
                    status: 500,
                    message: "script exhausted".into(),
                }),
            }
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        retries: Mutex<Vec<(u32, u32, Duration)>>,
    }

    impl GenerationObserver for RecordingObserver {
        fn on_retry_progress(&self, attempt: u32, max_retries: u32, delay: Duration) {
            self.retries.lock().push((attempt, max_retries, delay));
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 1_000,
            jitter: false,
            request_timeout_ms: 5_000,
            ..RetryPolicy::default()
        }
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "test/model".into(),
            messages: vec![ChatMessage::user("hi")],
            response_format: None,
            stream: true,
        }
    }

    fn server_error(n: u32) -> Step {
        Step::Fail(TransportError::Status {
            status: 500,
            message: format!("internal error #{}", n),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_500_exhausts_all_attempts() {
        let backend = ScriptedBackend::new((1..=10).map(server_error).collect());
        let observer = Arc::new(RecordingObserver::default());
        let transport = ResilientTransport::new(backend.clone(), fast_policy(), observer.clone());

        let mut sink = |_: &str, _: &str| {};
        let err = transport.generate("key", &request(), &mut sink).await.unwrap_err();

        assert_eq!(backend.calls.load(Ordering::SeqCst), 4);
        assert_eq!(
            err,
            TransportError::Status {
                status: 500,
                message: "internal error #4".into()
            }
        );
        let retries = observer.retries.lock().clone();
        assert_eq!(
            retries,
            vec![
                (1, 3, Duration::from_millis(100)),
                (2, 3, Duration::from_millis(200)),
                (3, 3, Duration::from_millis(400)),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_status_not_retried() {
        let backend = ScriptedBackend::new(vec![Step::Fail(TransportError::Status {
            status: 401,
            message: "No auth credentials found".into(),
        })]);
        let observer = Arc::new(RecordingObserver::default());
        let transport = ResilientTransport::new(backend.clone(), fast_policy(), observer.clone());

        let mut sink = |_: &str, _: &str| {};
        let err = transport.generate("key", &request(), &mut sink).await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert!(observer.retries.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failures() {
        let backend = ScriptedBackend::new(vec![
            Step::Fail(TransportError::Network("connection refused".into())),
            Step::Fail(TransportError::Status {
                status: 429,
                message: "rate limited".into(),
            }),
            Step::Sse(vec![
                "data: {\"choices\":[{\"delta\":{\"content\":\"he\"}}]}\n\n",
                "data: {\"choices\":[{\"delta\":{\"content\":\"llo\"}}]}\n\ndata: [DONE]\n\n",
            ]),
        ]);
        let transport =
            ResilientTransport::new(backend.clone(), fast_policy(), Arc::new(RecordingObserver::default()));

        let mut deltas = Vec::new();
        let mut sink = |d: &str, _: &str| deltas.push(d.to_string());
        let content = transport.generate("key", &request(), &mut sink).await.unwrap();
        assert_eq!(content, "hello");
        assert_eq!(deltas, vec!["he", "llo"]);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_retried_then_surfaced() {
        let backend = ScriptedBackend::new(vec![Step::Hang, Step::Hang]);
        let policy = RetryPolicy {
            max_retries: 1,
            request_timeout_ms: 250,
            ..fast_policy()
        };
        let transport =
            ResilientTransport::new(backend.clone(), policy, Arc::new(RecordingObserver::default()));

        let mut sink = |_: &str, _: &str| {};
        let err = transport.generate("key", &request(), &mut sink).await.unwrap_err();
        assert_eq!(err, TransportError::Timeout { after_ms: 250 });
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_band_stream_error_not_retried() {
        let backend = ScriptedBackend::new(vec![Step::Sse(vec![
            "data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n\n",
            "data: {\"error\":{\"message\":\"upstream died\"}}\n\n",
        ])]);
        let transport =
            ResilientTransport::new(backend.clone(), fast_policy(), Arc::new(RecordingObserver::default()));

        let mut sink = |_: &str, _: &str| {};
        let err = transport.generate("key", &request(), &mut sink).await.unwrap_err();
        assert!(matches!(err, TransportError::InBand { ref message, .. } if message == "upstream died"));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_streaming_body_delivered_once() {
        let backend = ScriptedBackend::new(vec![Step::Json(
            r#"{"choices":[{"message":{"content":"{\"code\":\"x\"}"}}]}"#,
        )]);
        let transport =
            ResilientTransport::new(backend, fast_policy(), Arc::new(RecordingObserver::default()));

        let mut calls = 0;
        let mut sink = |_: &str, full: &str| {
            calls += 1;
            assert_eq!(full, "{\"code\":\"x\"}");
        };
        let content = transport.generate("key", &request(), &mut sink).await.unwrap();
        assert_eq!(content, "{\"code\":\"x\"}");
        assert_eq!(calls, 1);
    }
}
