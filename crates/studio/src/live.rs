use shared::events::PreviewRenderer;
use shared::Mode;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::trace;

use crate::buffers::SharedWorkspace;
use crate::partial::extract_partial_code;
use crate::request::ChunkCallback;

/// Streams partial code into the editor buffer and, at most once per
/// throttle window, into the preview.
pub struct LivePreview {
    renderer: Arc<dyn PreviewRenderer>,
    workspace: SharedWorkspace,
    mode: Mode,
    throttle: Duration,
    last_render: Option<Instant>,
    last_code_len: usize,
}

impl LivePreview {
    pub fn new(
        renderer: Arc<dyn PreviewRenderer>,
        workspace: SharedWorkspace,
        mode: Mode,
        throttle: Duration,
    ) -> Self {
        Self {
            renderer,
            workspace,
            mode,
            throttle,
            last_render: None,
            last_code_len: 0,
        }
    }

    /// Handle one delta. Returns true when the preview was re-rendered.
    pub fn on_chunk(&mut self, _delta: &str, full: &str) -> bool {
        let Some(code) = extract_partial_code(full) else {
            return false;
        };
        if code.len() == self.last_code_len {
            return false;
        }
        self.last_code_len = code.len();
        self.workspace.write().set_text_for(self.mode, code.as_str());

        let now = Instant::now();
        let due = self
            .last_render
            .map_or(true, |at| now.duration_since(at) >= self.throttle);
        if !due {
            return false;
        }
        trace!("Live preview render ({} chars)", code.len());
        self.renderer.render(&code, self.mode);
        self.last_render = Some(now);
        true
    }

    pub fn into_callback(mut self) -> ChunkCallback {
        Box::new(move |delta: &str, full: &str| {
            self.on_chunk(delta, full);
        })
    }
}
