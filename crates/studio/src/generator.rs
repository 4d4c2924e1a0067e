use async_trait::async_trait;
use providers::{CompletionRequest, ResilientTransport};
use shared::agent_api::ChatMessage;
use shared::events::{CodeBuffer, GenerationObserver, GenerationStatus};
use shared::result::StructuredResult;
use std::sync::Arc;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::error::StudioError;
use crate::history::SharedHistory;
use crate::identifiers::declared_identifiers_for_mode;
use crate::prompts::{build_prompt, history_user_entry, response_schema, SYSTEM_PROMPT};
use crate::queue::RequestExecutor;
use crate::registry::SharedRegistry;
use crate::request::GenerationRequest;
use crate::response::parse_structured;

/// The generation pipeline run for each dequeued request.
///
/// Snapshot credential and model, scan the buffer, build the prompt, call the
/// model through the resilient transport while forwarding deltas, parse the
/// answer and record the exchange in history.
pub struct CodeGenerator {
    transport: ResilientTransport,
    registry: SharedRegistry,
    history: SharedHistory,
    buffer: Arc<dyn CodeBuffer>,
    observer: Arc<dyn GenerationObserver>,
    stream: bool,
}

impl CodeGenerator {
    pub fn new(
        transport: ResilientTransport,
        registry: SharedRegistry,
        history: SharedHistory,
        buffer: Arc<dyn CodeBuffer>,
        observer: Arc<dyn GenerationObserver>,
    ) -> Self {
        Self {
            transport,
            registry,
            history,
            buffer,
            observer,
            stream: true,
        }
    }

    /// Ask for a single JSON completion instead of an event stream.
    pub fn with_streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    async fn run(&self, request: GenerationRequest) -> Result<StructuredResult, StudioError> {
        let GenerationRequest {
            id,
            prompt,
            mode,
            image,
            on_chunk,
            ..
        } = request;

        let (credential, model) = {
            let registry = self.registry.read();
            let credential = registry
                .credential()
                .map(|k| Zeroizing::new(k.to_string()))
                .ok_or(StudioError::MissingCredential)?;
            (credential, registry.model())
        };
        if image.is_some() && !model.vision {
            return Err(StudioError::VisionUnsupported {
                model: model.name.to_string(),
            });
        }

        let buffer = self.buffer.text_for(mode);
        let identifiers = declared_identifiers_for_mode(&buffer, mode);
        debug!(
            "Request {}: {} chars of {} code, {} declared names",
            id,
            buffer.len(),
            mode,
            identifiers.len()
        );
        let full_prompt = build_prompt(&prompt, mode, &buffer, &identifiers);
        let latest = match &image {
            Some(image) => ChatMessage::user_with_image(full_prompt, image.data_url()),
            None => ChatMessage::user(full_prompt),
        };
        let messages = self.history.lock().request_messages(SYSTEM_PROMPT, latest);

        let completion = CompletionRequest {
            model: model.id.to_string(),
            messages,
            response_format: Some(response_schema()),
            stream: self.stream,
        };

        let observer = self.observer.clone();
        let mut on_chunk = on_chunk;
        let mut first_delta = true;
        let mut sink = move |delta: &str, full: &str| {
            if first_delta {
                first_delta = false;
                observer.on_status(Some(id), &GenerationStatus::Generating);
            }
            observer.on_stream_delta(delta, full);
            if let Some(callback) = on_chunk.as_mut() {
                callback(delta, full);
            }
        };

        let content = self
            .transport
            .generate(&credential, &completion, &mut sink)
            .await?;

        let result = parse_structured(&content);
        if result.code.trim().is_empty() {
            warn!("Request {} produced empty code", id);
        }
        self.history.lock().record_exchange(
            history_user_entry(&prompt, mode, image.is_some()),
            result.history_summary(),
        );
        info!(
            "Request {} completed with {} ({} chars, {} changes)",
            id,
            model.id,
            result.code.len(),
            result.changes.len()
        );
        Ok(result)
    }
}

#[async_trait]
impl RequestExecutor for CodeGenerator {
    async fn execute(&self, request: GenerationRequest) -> Result<StructuredResult, StudioError> {
        let id = request.id;
        self.observer.on_status(Some(id), &GenerationStatus::Thinking);
        let outcome = self.run(request).await;
        match &outcome {
            Ok(_) => self.observer.on_status(Some(id), &GenerationStatus::Completed),
            Err(e) => {
                warn!("Request {} failed: {}", id, e);
                self.observer.on_status(
                    Some(id),
                    &GenerationStatus::Failed {
                        error: e.to_string(),
                    },
                );
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffers::{SharedWorkspace, Workspace};
    use crate::history::ConversationHistory;
    use crate::image::ImageAttachment;
    use crate::registry::Registry;
    use crate::storage::LocalStore;
    use futures::{stream, StreamExt};
    use parking_lot::Mutex;
    use providers::{CompletionBackend, OpenedResponse, TransportError};
    use shared::agent_api::{ContentPart, MessageContent, Role};
    use shared::settings::RetryPolicy;
    use shared::Mode;
    use std::collections::VecDeque;

    /// Serves canned SSE bodies and records what it was asked.
    #[derive(Default)]
    struct FakeBackend {
        replies: Mutex<VecDeque<Result<Vec<String>, TransportError>>>,
        seen: Mutex<Vec<(String, CompletionRequest)>>,
    }

    impl FakeBackend {
        fn answering(replies: Vec<Result<Vec<String>, TransportError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    fn sse(pieces: &[&str]) -> Vec<String> {
        let mut frames: Vec<String> = pieces
            .iter()
            .map(|p| format!("data: {}\n\n", serde_json::json!({"choices": [{"delta": {"content": p}}]})))
            .collect();
        frames.push("data: [DONE]\n\n".to_string());
        frames
    }

    #[async_trait]
    impl CompletionBackend for FakeBackend {
        async fn open(
            &self,
            credential: &str,
            request: &CompletionRequest,
        ) -> Result<OpenedResponse, TransportError> {
            self.seen.lock().push((credential.to_string(), request.clone()));
            let reply = self.replies.lock().pop_front().unwrap_or_else(|| {
                Err(TransportError::Status {
                    status: 400,
                    message: "no reply scripted".into(),
                })
            })?;
            Ok(OpenedResponse {
                event_stream: true,
                body: stream::iter(reply.into_iter().map(|frame| Ok(frame.into_bytes()))).boxed(),
            })
        }
    }

    #[derive(Default)]
    struct StatusLog {
        statuses: Mutex<Vec<GenerationStatus>>,
        deltas: Mutex<Vec<String>>,
    }

    impl GenerationObserver for StatusLog {
        fn on_stream_delta(&self, delta: &str, _full: &str) {
            self.deltas.lock().push(delta.to_string());
        }

        fn on_status(&self, _id: Option<uuid::Uuid>, status: &GenerationStatus) {
            self.statuses.lock().push(status.clone());
        }
    }

    struct Fixture {
        backend: Arc<FakeBackend>,
        observer: Arc<StatusLog>,
        registry: SharedRegistry,
        history: SharedHistory,
        workspace: SharedWorkspace,
        generator: CodeGenerator,
    }

    fn fixture(replies: Vec<Result<Vec<String>, TransportError>>, key: Option<&str>) -> Fixture {
        let backend = FakeBackend::answering(replies);
        let observer = Arc::new(StatusLog::default());
        let registry =
            Registry::load_with_fallback(LocalStore::in_memory().shared(), key.map(String::from))
                .shared();
        let history = ConversationHistory::new().shared();
        let workspace = SharedWorkspace::new(Workspace::new());
        let transport = ResilientTransport::new(
            backend.clone(),
            RetryPolicy {
                max_retries: 0,
                ..RetryPolicy::default()
            },
            observer.clone(),
        );
        let generator = CodeGenerator::new(
            transport,
            registry.clone(),
            history.clone(),
            Arc::new(workspace.clone()),
            observer.clone(),
        );
        Fixture {
            backend,
            observer,
            registry,
            history,
            workspace,
            generator,
        }
    }

    const ANSWER: &str = r#"{"thinking":"add b","code":"const a = 1;\nconst b = 2;","changes_made":["Added b"],"preserved_elements":["a"]}"#;

    #[tokio::test]
    async fn test_successful_generation() {
        let (head, tail) = ANSWER.split_at(40);
        let f = fixture(vec![Ok(sse(&[head, tail]))], Some("sk-test"));
        f.workspace.write().set_text("const a = 1;");

        let chunks = Arc::new(Mutex::new(Vec::new()));
        let sink = chunks.clone();
        let request = GenerationRequest::new("add b", Mode::Markup)
            .with_chunk_callback(move |_d, full| sink.lock().push(full.to_string()));
        let result = f.generator.execute(request).await.unwrap();

        assert_eq!(result.code, "const a = 1;\nconst b = 2;");
        assert_eq!(result.changes, vec!["Added b"]);

        let seen = f.backend.seen.lock();
        let (credential, sent) = &seen[0];
        assert_eq!(credential, "sk-test");
        assert_eq!(sent.model, "openai/gpt-4.1");
        assert!(sent.stream);
        assert!(sent.response_format.is_some());
        assert_eq!(sent.messages.len(), 2);
        assert_eq!(sent.messages[0].role, Role::System);
        let final_prompt = sent.messages[1].text();
        assert!(final_prompt.contains("USER REQUEST:\nadd b"));
        assert!(final_prompt.contains("EXISTING IDENTIFIERS (DO NOT REDECLARE): a"));

        assert_eq!(*chunks.lock(), vec![head.to_string(), ANSWER.to_string()]);
        assert_eq!(f.observer.deltas.lock().len(), 2);
        assert_eq!(
            *f.observer.statuses.lock(),
            vec![
                GenerationStatus::Thinking,
                GenerationStatus::Generating,
                GenerationStatus::Completed
            ]
        );

        let history = f.history.lock();
        assert_eq!(history.len(), 2);
        assert_eq!(history.messages()[0].text(), "[Mode: HTML] add b");
        assert_eq!(history.messages()[1].text(), "Changes made:\n- Added b");
    }

    #[tokio::test]
    async fn test_history_is_sent_on_the_next_request() {
        let f = fixture(vec![Ok(sse(&[ANSWER])), Ok(sse(&[ANSWER]))], Some("k"));
        f.generator
            .execute(GenerationRequest::new("first", Mode::Scene))
            .await
            .unwrap();
        f.generator
            .execute(GenerationRequest::new("second", Mode::Scene))
            .await
            .unwrap();

        let seen = f.backend.seen.lock();
        let messages = &seen[1].1.messages;
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[1].text(), "[Mode: Three.js] first");
        assert_eq!(messages[2].role, Role::Assistant);
        assert!(messages[3].text().contains("USER REQUEST:\nsecond"));
        assert_eq!(f.history.lock().exchanges(), 2);
    }

    #[tokio::test]
    async fn test_missing_credential_sends_nothing() {
        let f = fixture(vec![Ok(sse(&[ANSWER]))], None);
        let err = f
            .generator
            .execute(GenerationRequest::new("hi", Mode::Markup))
            .await
            .unwrap_err();
        assert_eq!(err, StudioError::MissingCredential);
        assert!(f.backend.seen.lock().is_empty());
        assert!(f.history.lock().is_empty());
        assert!(matches!(
            f.observer.statuses.lock().last(),
            Some(GenerationStatus::Failed { .. })
        ));
    }

    #[tokio::test]
    async fn test_image_requires_vision_model() {
        let f = fixture(vec![Ok(sse(&[ANSWER]))], Some("k"));
        f.registry.write().set_model("qwen/qwen3-coder:free").unwrap();
        let image = ImageAttachment::from_bytes(b"GIF89a", "image/gif").unwrap();

        let err = f
            .generator
            .execute(GenerationRequest::new("copy this", Mode::Markup).with_image(Some(image)))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            StudioError::VisionUnsupported {
                model: "Qwen3 Coder".into()
            }
        );
        assert!(f.backend.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_image_sent_as_multimodal_part_but_not_kept_in_history() {
        let f = fixture(vec![Ok(sse(&[ANSWER]))], Some("k"));
        let image = ImageAttachment::from_bytes(b"GIF89a", "image/gif").unwrap();
        let data_url = image.data_url().to_string();

        f.generator
            .execute(GenerationRequest::new("copy this", Mode::Markup).with_image(Some(image)))
            .await
            .unwrap();

        let seen = f.backend.seen.lock();
        match &seen[0].1.messages[1].content {
            MessageContent::Parts(parts) => {
                assert!(parts.iter().any(|p| matches!(
                    p,
                    ContentPart::ImageUrl { image_url } if image_url.url == data_url
                )));
            }
            other => panic!("expected multimodal content, got {:?}", other),
        }
        let history = f.history.lock();
        assert_eq!(history.messages()[0].text(), "[Mode: HTML] copy this [image attached]");
        assert!(matches!(history.messages()[0].content, MessageContent::Text(_)));
    }

    #[tokio::test]
    async fn test_transport_failure_leaves_history_untouched() {
        let f = fixture(
            vec![Err(TransportError::Status {
                status: 401,
                message: "No auth credentials found".into(),
            })],
            Some("k"),
        );
        let err = f
            .generator
            .execute(GenerationRequest::new("hi", Mode::Markup))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert!(f.history.lock().is_empty());
        assert_eq!(
            *f.observer.statuses.lock(),
            vec![
                GenerationStatus::Thinking,
                GenerationStatus::Failed {
                    error: "API error (401): No auth credentials found".into()
                }
            ]
        );
    }

    #[tokio::test]
    async fn test_prompt_embeds_the_buffer_of_the_request_mode() {
        let f = fixture(vec![Ok(sse(&[ANSWER]))], Some("k"));
        {
            let mut ws = f.workspace.write();
            ws.set_text_for(Mode::Markup, "<h1>x</h1>");
            ws.set_text_for(Mode::Script, "print(1)");
            ws.set_mode(Mode::Script);
        }

        f.generator
            .execute(GenerationRequest::new("add a footer", Mode::Markup))
            .await
            .unwrap();

        let seen = f.backend.seen.lock();
        let prompt = seen[0].1.messages[1].text();
        assert!(prompt.starts_with("[Mode: HTML]"));
        assert!(prompt.contains("<h1>x</h1>"));
        assert!(!prompt.contains("print(1)"));
    }

    #[tokio::test]
    async fn test_unstructured_answer_still_succeeds() {
        let f = fixture(vec![Ok(sse(&["```html\n<p>hi</p>\n```"]))], Some("k"));
        let result = f
            .generator
            .execute(GenerationRequest::new("hi", Mode::Markup))
            .await
            .unwrap();
        assert_eq!(result.code, "<p>hi</p>");
        assert_eq!(f.history.lock().len(), 2);
    }
}
