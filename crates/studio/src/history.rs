use parking_lot::Mutex;
use shared::agent_api::{ChatMessage, Role};
use std::sync::Arc;

pub type SharedHistory = Arc<Mutex<ConversationHistory>>;

/// Rolling conversation context sent with every request.
///
/// Entries are compact: the user side records the mode and the raw request,
/// the assistant side records the change summary. Buffers and image data
/// travel only in the final message of each request, never in history.
#[derive(Debug, Default, Clone)]
pub struct ConversationHistory {
    messages: Vec<ChatMessage>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed exchange. Both sides are appended together so a
    /// failed request never leaves a dangling user turn.
    pub fn record_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.messages.push(ChatMessage::user(user));
        self.messages.push(ChatMessage::assistant(assistant));
    }

    pub fn shared(self) -> SharedHistory {
        Arc::new(Mutex::new(self))
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn exchanges(&self) -> usize {
        self.messages.iter().filter(|m| m.role == Role::Assistant).count()
    }

    /// System prompt, then history, then the fully-contextualized message.
    pub fn request_messages(&self, system_prompt: &str, latest: ChatMessage) -> Vec<ChatMessage> {
        let mut out = Vec::with_capacity(self.messages.len() + 2);
        out.push(ChatMessage::system(system_prompt));
        out.extend(self.messages.iter().cloned());
        out.push(latest);
        out
    }
}
