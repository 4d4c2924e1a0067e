use shared::Mode;
use std::fmt;
use tokio::time::Instant;
use uuid::Uuid;

use crate::image::ImageAttachment;

/// Per-request delta callback: `(delta, accumulated_content)`.
pub type ChunkCallback = Box<dyn FnMut(&str, &str) + Send>;

/// One queued code-generation job.
pub struct GenerationRequest {
    pub id: Uuid,
    pub prompt: String,
    pub mode: Mode,
    pub image: Option<ImageAttachment>,
    pub on_chunk: Option<ChunkCallback>,
    pub enqueued_at: Instant,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, mode: Mode) -> Self {
        Self {
            id: Uuid::new_v4(),
            prompt: prompt.into(),
            mode,
            image: None,
            on_chunk: None,
            enqueued_at: Instant::now(),
        }
    }

    pub fn with_image(mut self, image: Option<ImageAttachment>) -> Self {
        self.image = image;
        self
    }

    pub fn with_chunk_callback(mut self, callback: impl FnMut(&str, &str) + Send + 'static) -> Self {
        self.on_chunk = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for GenerationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationRequest")
            .field("id", &self.id)
            .field("prompt", &self.prompt)
            .field("mode", &self.mode)
            .field("image", &self.image)
            .field("on_chunk", &self.on_chunk.is_some())
            .finish()
    }
}
