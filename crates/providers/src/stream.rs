//! Decoding of chat-completion response bodies into content.

use futures::StreamExt;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::TransportError;
use crate::sse::SseParser;
use crate::transport::{ByteStream, DeltaSink};

/// Payload of the frame that marks the end of an SSE completion stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Accumulates content deltas from SSE frames.
///
/// Synchronous so the framing logic can be driven chunk by chunk; see
/// [`decode_event_stream`] for the async wrapper.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    parser: SseParser,
    content: String,
    deltas: usize,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one received chunk. Every delta completed by it is handed to
    /// `on_delta(delta, full_so_far)` before this returns.
    pub fn push(&mut self, chunk: &[u8], on_delta: &mut DeltaSink<'_>) -> Result<(), TransportError> {
        for payload in self.parser.feed(chunk) {
            self.handle_payload(&payload, on_delta)?;
        }
        Ok(())
    }

    /// End of stream: process any unterminated final line and return the
    /// aggregate content.
    pub fn finish(mut self, on_delta: &mut DeltaSink<'_>) -> Result<String, TransportError> {
        if let Some(payload) = self.parser.finish() {
            self.handle_payload(&payload, on_delta)?;
        }
        debug!(
            "Stream complete: {} deltas, {} chars",
            self.deltas,
            self.content.len()
        );
        Ok(self.content)
    }

    fn handle_payload(&mut self, payload: &str, on_delta: &mut DeltaSink<'_>) -> Result<(), TransportError> {
        let payload = payload.trim();
        if payload.is_empty() || payload == DONE_SENTINEL {
            return Ok(());
        }

        let frame: Value = match serde_json::from_str(payload) {
            Ok(frame) => frame,
            Err(e) => {
                let preview: String = payload.chars().take(120).collect();
                warn!("Skipping unparseable SSE frame ({}): {}", e, preview);
                return Ok(());
            }
        };

        if let Some(err) = in_band_error(&frame) {
            return Err(err);
        }

        if let Some(delta) = frame
            .pointer("/choices/0/delta/content")
            .and_then(|v| v.as_str())
        {
            if !delta.is_empty() {
                self.content.push_str(delta);
                self.deltas += 1;
                on_delta(delta, &self.content);
            }
        }
        Ok(())
    }
}

/// Read `stream` to completion, delivering deltas in arrival order.
pub async fn decode_event_stream(
    mut stream: ByteStream,
    on_delta: &mut DeltaSink<'_>,
) -> Result<String, TransportError> {
    let mut decoder = StreamDecoder::new();
    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        decoder.push(&bytes, on_delta)?;
    }
    decoder.finish(on_delta)
}

/// Decode a non-streaming completion object (`choices[0].message.content`).
pub fn decode_completion(body: &[u8]) -> Result<String, TransportError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| TransportError::Decode(format!("completion is not JSON: {}", e)))?;
    if let Some(err) = in_band_error(&value) {
        return Err(err);
    }
    value
        .pointer("/choices/0/message/content")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| TransportError::Decode("completion has no message content".into()))
}

/// Read a whole non-streaming body and decode it.
pub async fn decode_completion_stream(mut stream: ByteStream) -> Result<String, TransportError> {
    let mut body = Vec::new();
    while let Some(chunk) = stream.next().await {
        body.extend_from_slice(&chunk?);
    }
    decode_completion(&body)
}

fn in_band_error(frame: &Value) -> Option<TransportError> {
    let err = frame.get("error")?;
    if err.is_null() {
        return None;
    }
    let message = match err {
        Value::String(s) => s.clone(),
        other => other
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| other.to_string()),
    };
    let code = err.get("code").and_then(|c| match c {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });
    Some(TransportError::InBand { message, code })
}
