use parking_lot::Mutex;
use shared::agent_api::{Role, TranscriptLine};
use shared::events::{GenerationObserver, GenerationStatus};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use uuid::Uuid;

/// Prints generation progress to stderr so stdout stays clean for output.
#[derive(Default)]
pub struct ConsoleObserver {
    streamed: AtomicUsize,
}

impl GenerationObserver for ConsoleObserver {
    fn on_retry_progress(&self, attempt: u32, max_retries: u32, delay: Duration) {
        eprintln!(
            "  retrying ({}/{}) in {:.1}s...",
            attempt,
            max_retries,
            delay.as_secs_f64()
        );
    }

    fn on_stream_delta(&self, _delta: &str, full: &str) {
        // One dot per ~200 streamed characters.
        let before = self.streamed.swap(full.len(), Ordering::Relaxed);
        if full.len() / 200 > before / 200 {
            eprint!(".");
            let _ = std::io::stderr().flush();
        }
    }

    fn on_status(&self, request_id: Option<Uuid>, status: &GenerationStatus) {
        let id = request_id.map(short_id).unwrap_or_default();
        match status {
            GenerationStatus::Thinking => {
                self.streamed.store(0, Ordering::Relaxed);
                eprintln!("  [{}] thinking...", id);
            }
            GenerationStatus::Generating => eprint!("  [{}] generating", id),
            GenerationStatus::Completed => eprintln!(" done"),
            GenerationStatus::Failed { .. } => eprintln!(),
        }
    }
}

pub fn short_id(id: Uuid) -> String {
    id.simple().to_string().chars().take(8).collect()
}

/// Visible chat transcript.
#[derive(Default)]
pub struct Transcript {
    lines: Mutex<Vec<TranscriptLine>>,
}

impl Transcript {
    pub fn push(&self, role: Role, content: impl Into<String>) -> TranscriptLine {
        let line = TranscriptLine::new(role, content);
        self.lines.lock().push(line.clone());
        line
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }
}

pub fn print_line(line: &TranscriptLine) {
    let who = match line.role {
        Role::User => "you",
        Role::Assistant => "studio",
        Role::System => "system",
    };
    println!("[{}] {}: {}", line.timestamp(), who, line.content);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_records_lines() {
        let transcript = Transcript::default();
        let line = transcript.push(Role::Assistant, "Error: API Key is missing.");
        assert_eq!(line.role, Role::Assistant);
        assert_eq!(transcript.len(), 1);
        transcript.clear();
        assert_eq!(transcript.len(), 0);
    }

    #[test]
    fn test_short_id() {
        let id = Uuid::nil();
        assert_eq!(short_id(id), "00000000");
    }
}
