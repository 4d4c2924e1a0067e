//! Resilient streaming transport for chat-completion APIs.
//!
//! - `sse`: line-level server-sent-event parsing across chunk boundaries
//! - `stream`: turns SSE frames into content deltas and a final aggregate
//! - `retry`: backoff computation
//! - `transport`: timeout + retry loop around a [`CompletionBackend`]
//! - `openrouter`: the HTTP backend

pub mod error;
pub mod openrouter;
pub mod retry;
pub mod sse;
pub mod stream;
pub mod transport;

pub use error::TransportError;
pub use openrouter::OpenRouterClient;
pub use transport::{
    ByteStream, CompletionBackend, CompletionRequest, DeltaSink, OpenedResponse,
    ResilientTransport,
};
