pub mod events;
pub mod mode;
pub mod models;
pub mod result;

pub use mode::Mode;

pub mod settings {
    use anyhow::{Context, Result};
    use serde::{Deserialize, Serialize};
    use std::fs;
    use std::path::Path;
    use std::time::Duration;

    fn default_true() -> bool {
        true
    }

    /// Retry/backoff configuration for the transport. Read-only once the
    /// transport is constructed.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct RetryPolicy {
        /// Retries after the first attempt; total attempts are `max_retries + 1`.
        pub max_retries: u32,
        pub base_delay_ms: u64,
        pub max_delay_ms: u64,
        pub backoff_multiplier: f64,
        pub jitter: bool,
        pub retryable_statuses: Vec<u16>,
        pub retry_network_errors: bool,
        /// Hard limit for one attempt to receive response headers.
        pub request_timeout_ms: u64,
    }

    impl Default for RetryPolicy {
        fn default() -> Self {
            Self {
                max_retries: 3,
                base_delay_ms: 1_000,
                max_delay_ms: 10_000,
                backoff_multiplier: 2.0,
                jitter: true,
                retryable_statuses: vec![408, 429, 500, 502, 503, 504],
                retry_network_errors: true,
                request_timeout_ms: 60_000,
            }
        }
    }

    impl RetryPolicy {
        pub fn max_attempts(&self) -> u32 {
            self.max_retries.saturating_add(1)
        }

        pub fn request_timeout(&self) -> Duration {
            Duration::from_millis(self.request_timeout_ms)
        }

        pub fn is_retryable_status(&self, status: u16) -> bool {
            self.retryable_statuses.contains(&status)
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct QueueSettings {
        /// Minimum gap between the starts of two consecutive dispatches.
        pub min_interval_ms: u64,
        /// Pause between processing passes when more work is queued.
        pub yield_delay_ms: u64,
        /// Reject enqueues beyond this backlog. `None` keeps the queue unbounded.
        pub max_depth: Option<usize>,
    }

    impl Default for QueueSettings {
        fn default() -> Self {
            Self {
                min_interval_ms: 1_000,
                yield_delay_ms: 10,
                max_depth: None,
            }
        }
    }

    impl QueueSettings {
        pub fn min_interval(&self) -> Duration {
            Duration::from_millis(self.min_interval_ms)
        }

        pub fn yield_delay(&self) -> Duration {
            Duration::from_millis(self.yield_delay_ms)
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ApiSettings {
        pub endpoint: String,
        /// Sent as `HTTP-Referer`; OpenRouter uses it to attribute traffic.
        pub referer: String,
        /// Sent as `X-Title`.
        pub title: String,
        #[serde(default = "default_true")]
        pub stream: bool,
    }

    impl Default for ApiSettings {
        fn default() -> Self {
            Self {
                endpoint: "https://openrouter.ai/api/v1/chat/completions".into(),
                referer: "http://localhost".into(),
                title: "AI Web Studio".into(),
                stream: true,
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct PreviewSettings {
        /// Minimum time between two live preview renders while streaming.
        pub throttle_ms: u64,
    }

    impl Default for PreviewSettings {
        fn default() -> Self {
            Self { throttle_ms: 500 }
        }
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct StudioSettings {
        pub api: ApiSettings,
        pub retry: RetryPolicy,
        pub queue: QueueSettings,
        pub preview: PreviewSettings,
    }

    impl StudioSettings {
        /// Load settings from `path`, writing the defaults there first if the
        /// file does not exist yet.
        pub fn load_or_init(path: &Path) -> Result<Self> {
            if !path.exists() {
                let settings = Self::default();
                settings.save(path)?;
                tracing::info!("Wrote default settings to {}", path.display());
                return Ok(settings);
            }
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading settings from {}", path.display()))?;
            let settings = serde_json::from_str(&raw)
                .with_context(|| format!("parsing settings in {}", path.display()))?;
            Ok(settings)
        }

        pub fn save(&self, path: &Path) -> Result<()> {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, serde_json::to_string_pretty(self)?)?;
            Ok(())
        }
    }
}

pub mod agent_api {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Role {
        System,
        User,
        Assistant,
    }

    /// One part of a multimodal message, in the OpenAI/OpenRouter wire shape.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "type", rename_all = "snake_case")]
    pub enum ContentPart {
        Text { text: String },
        ImageUrl { image_url: ImageUrl },
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ImageUrl {
        pub url: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum MessageContent {
        Text(String),
        Parts(Vec<ContentPart>),
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ChatMessage {
        pub role: Role,
        pub content: MessageContent,
    }

    impl ChatMessage {
        pub fn system(content: impl Into<String>) -> Self {
            Self {
                role: Role::System,
                content: MessageContent::Text(content.into()),
            }
        }

        pub fn user(content: impl Into<String>) -> Self {
            Self {
                role: Role::User,
                content: MessageContent::Text(content.into()),
            }
        }

        pub fn assistant(content: impl Into<String>) -> Self {
            Self {
                role: Role::Assistant,
                content: MessageContent::Text(content.into()),
            }
        }

        /// User message carrying text plus an image `data:` URL.
        pub fn user_with_image(text: impl Into<String>, image_url: impl Into<String>) -> Self {
            Self {
                role: Role::User,
                content: MessageContent::Parts(vec![
                    ContentPart::Text { text: text.into() },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: image_url.into(),
                        },
                    },
                ]),
            }
        }

        /// Concatenated text of the message, ignoring image parts.
        pub fn text(&self) -> String {
            match &self.content {
                MessageContent::Text(text) => text.clone(),
                MessageContent::Parts(parts) => parts
                    .iter()
                    .filter_map(|p| match p {
                        ContentPart::Text { text } => Some(text.as_str()),
                        ContentPart::ImageUrl { .. } => None,
                    })
                    .collect::<Vec<_>>()
                    .join("\n"),
            }
        }
    }

    /// A line of the visible chat transcript (what the user sees, not what
    /// the model receives).
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct TranscriptLine {
        pub role: Role,
        pub content: String,
        pub at: DateTime<Utc>,
    }

    impl TranscriptLine {
        pub fn new(role: Role, content: impl Into<String>) -> Self {
            Self {
                role,
                content: content.into(),
                at: Utc::now(),
            }
        }

        pub fn timestamp(&self) -> String {
            self.at.format("%H:%M").to_string()
        }
    }
}
