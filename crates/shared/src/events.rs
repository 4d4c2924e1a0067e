//! Progress events and the collaborator seams the generation pipeline talks to.
//!
//! Everything here is injected at construction time; the pipeline never
//! reaches for a global UI or editor object.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::mode::Mode;

/// Coarse status of the request currently being processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationStatus {
    /// Waiting for the request to be sent
    Thinking,
    /// First content delta arrived
    Generating,
    Completed,
    Failed { error: String },
}

/// UI notifier. All methods default to no-ops so implementors only pick
/// what they display.
pub trait GenerationObserver: Send + Sync {
    /// Called before sleeping ahead of retry number `attempt` (1-based).
    fn on_retry_progress(&self, _attempt: u32, _max_retries: u32, _delay: Duration) {}

    /// Called for every content delta, in arrival order.
    fn on_stream_delta(&self, _delta: &str, _full_so_far: &str) {}

    fn on_status(&self, _request_id: Option<Uuid>, _status: &GenerationStatus) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl GenerationObserver for NoopObserver {}

/// Source of the code the user is editing, one buffer per mode.
pub trait CodeBuffer: Send + Sync {
    fn text_for(&self, mode: Mode) -> String;
}

/// Renders code into the preview pane.
pub trait PreviewRenderer: Send + Sync {
    fn render(&self, code: &str, mode: Mode);
}
