/// Line-level SSE (Server-Sent Events) parser for streaming completion responses.
///
/// Frames look like `data: <payload>\n\n`. Only `data:` lines carry anything we
/// use; `event:`, `id:`, `retry:` and `:` comment lines (OpenRouter sends
/// `: OPENROUTER PROCESSING` keep-alives) are dropped.

/// Incremental parser that holds back the trailing partial line between chunks.
///
/// Bytes are buffered rather than text so a multi-byte UTF-8 character split
/// across two chunks is decoded intact once its line is complete.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
}

impl SseParser {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Feed raw bytes from the HTTP response. Returns the payloads of every
    /// `data:` line completed by this chunk, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        let mut consumed = 0;
        while let Some(offset) = self.buffer[consumed..].iter().position(|b| *b == b'\n') {
            let end = consumed + offset;
            if let Some(payload) = data_payload(&self.buffer[consumed..end]) {
                payloads.push(payload);
            }
            consumed = end + 1;
        }
        self.buffer.drain(..consumed);

        payloads
    }

    /// Flush whatever is left once the stream has ended, treating it as a
    /// final line without its newline.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        data_payload(&rest)
    }
}

fn data_payload(line: &[u8]) -> Option<String> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let value = line.strip_prefix(b"data:")?;
    let value = value.strip_prefix(b" ").unwrap_or(value);
    Some(String::from_utf8_lossy(value).into_owned())
}
