//! One editing session: registry, buffers, history and the request queue
//! wired together for a front end.

use providers::{CompletionBackend, ResilientTransport};
use shared::events::{GenerationObserver, PreviewRenderer};
use shared::models::ModelDescriptor;
use shared::result::StructuredResult;
use shared::settings::StudioSettings;
use shared::Mode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::buffers::{SharedWorkspace, UndoOutcome, Workspace};
use crate::error::StudioError;
use crate::generator::CodeGenerator;
use crate::history::{ConversationHistory, SharedHistory};
use crate::image::ImageAttachment;
use crate::libraries::Library;
use crate::live::LivePreview;
use crate::queue::{PendingGeneration, RequestQueue};
use crate::registry::{Registry, SharedRegistry};
use crate::request::GenerationRequest;
use crate::storage::SharedStore;
use crate::templates::Template;

pub struct StudioSession {
    store: SharedStore,
    registry: SharedRegistry,
    workspace: SharedWorkspace,
    history: SharedHistory,
    renderer: Arc<dyn PreviewRenderer>,
    queue: RequestQueue,
    throttle: Duration,
}

impl StudioSession {
    /// Build the session and start its queue worker (requires a tokio runtime).
    pub fn start(
        settings: &StudioSettings,
        store: SharedStore,
        registry: Registry,
        backend: Arc<dyn CompletionBackend>,
        renderer: Arc<dyn PreviewRenderer>,
        observer: Arc<dyn GenerationObserver>,
    ) -> Self {
        let registry = registry.shared();
        let mut loaded = Workspace::load(&store.lock());
        let active = loaded.active_mode();
        loaded.open_mode(active);
        let workspace = SharedWorkspace::new(loaded);
        let history = ConversationHistory::new().shared();

        let transport = ResilientTransport::new(backend, settings.retry.clone(), observer.clone());
        let generator = CodeGenerator::new(
            transport,
            registry.clone(),
            history.clone(),
            Arc::new(workspace.clone()),
            observer,
        )
        .with_streaming(settings.api.stream);
        let queue = RequestQueue::spawn(Arc::new(generator), settings.queue.clone());

        Self {
            store,
            registry,
            workspace,
            history,
            renderer,
            queue,
            throttle: Duration::from_millis(settings.preview.throttle_ms),
        }
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn workspace(&self) -> &SharedWorkspace {
        &self.workspace
    }

    pub fn history(&self) -> &SharedHistory {
        &self.history
    }

    pub fn pending(&self) -> usize {
        self.queue.pending()
    }

    pub fn model(&self) -> &'static ModelDescriptor {
        self.registry.read().model()
    }

    /// Queue a prompt against the active mode.
    ///
    /// Configuration problems (no key, image on a text-only model) are
    /// reported here before anything is queued. The active buffer is
    /// snapshotted for undo and streamed output is mirrored into it.
    pub fn submit(
        &self,
        prompt: &str,
        image: Option<ImageAttachment>,
    ) -> Result<PendingGeneration, StudioError> {
        {
            let registry = self.registry.read();
            if !registry.has_credential() {
                return Err(StudioError::MissingCredential);
            }
            if image.is_some() && !registry.model().vision {
                return Err(StudioError::VisionUnsupported {
                    model: registry.model().name.to_string(),
                });
            }
        }

        let mode = {
            let mut workspace = self.workspace.write();
            workspace.save_for_undo();
            workspace.active_mode()
        };
        let live = LivePreview::new(
            self.renderer.clone(),
            self.workspace.clone(),
            mode,
            self.throttle,
        );
        let request = GenerationRequest::new(prompt, mode)
            .with_image(image)
            .with_chunk_callback(live.into_callback());
        self.queue.enqueue(request)
    }

    /// Put a finished result into the buffer of the mode it was generated
    /// for, render it and persist the buffers.
    pub fn apply(&self, mode: Mode, result: &StructuredResult) {
        self.workspace.write().set_text_for(mode, result.code.as_str());
        self.renderer.render(&result.code, mode);
        self.persist_buffers();
    }

    pub fn undo(&self) -> UndoOutcome {
        let outcome = self.workspace.write().undo_ai_change();
        match outcome {
            UndoOutcome::Empty => {}
            UndoOutcome::Restored => self.refresh_active(),
            UndoOutcome::RestoredOther(mode) => {
                let code = {
                    let mut ws = self.workspace.write();
                    ws.set_mode(mode);
                    ws.text().to_string()
                };
                info!("Undo switched to {} mode", mode);
                self.renderer.render(&code, mode);
                self.persist_buffers();
            }
        }
        outcome
    }

    /// Switch modes. A blank buffer gets the mode's default template, which
    /// is rendered right away.
    pub fn set_mode(&self, mode: Mode) -> bool {
        let seeded = {
            let mut ws = self.workspace.write();
            if ws.open_mode(mode) {
                Some(ws.text().to_string())
            } else {
                None
            }
        };
        match seeded {
            Some(code) => {
                self.renderer.render(&code, mode);
                true
            }
            None => false,
        }
    }

    pub fn load_template(&self, key: &str) -> Result<&'static Template, StudioError> {
        let template = self.workspace.write().load_template(key)?;
        self.refresh_active();
        Ok(template)
    }

    pub fn insert_library(&self, key: &str) -> Result<&'static Library, StudioError> {
        let library = self.workspace.write().insert_library(key)?;
        self.refresh_active();
        Ok(library)
    }

    /// Render the active buffer and persist all buffers.
    pub fn refresh_active(&self) {
        let (mode, code) = {
            let ws = self.workspace.read();
            (ws.active_mode(), ws.text().to_string())
        };
        self.renderer.render(&code, mode);
        self.persist_buffers();
    }

    pub fn clear_history(&self) {
        self.history.lock().clear();
        info!("Conversation history cleared");
    }

    pub fn persist_buffers(&self) {
        let workspace = self.workspace.read();
        if let Err(e) = workspace.persist(&mut self.store.lock()) {
            warn!("Failed to save buffers: {:#}", e);
        }
    }

    pub async fn shutdown(self) {
        self.persist_buffers();
        self.queue.shutdown().await;
    }
}
