use shared::settings::RetryPolicy;

/// Failure of one logical completion call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Connection refused, DNS failure, TLS failure, ...
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("API error ({status}): {message}")]
    Status { status: u16, message: String },

    /// Error object delivered inside an otherwise successful response,
    /// e.g. an SSE frame carrying `{"error": {...}}`.
    #[error("API reported an error: {message}")]
    InBand {
        message: String,
        code: Option<String>,
    },

    #[error("stream read failed: {0}")]
    StreamRead(String),

    #[error("invalid response: {0}")]
    Decode(String),
}

impl TransportError {
    /// HTTP status, when the failure came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether another attempt may succeed under `policy`.
    ///
    /// Only failures that happen before a response body is consumed are
    /// classified here; once deltas reach the caller nothing is retried.
    pub fn is_retryable(&self, policy: &RetryPolicy) -> bool {
        match self {
            TransportError::Network(_) => policy.retry_network_errors,
            TransportError::Timeout { .. } => true,
            TransportError::Status { status, .. } => policy.is_retryable_status(*status),
            TransportError::InBand { .. }
            | TransportError::StreamRead(_)
            | TransportError::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return TransportError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            };
        }
        // Include the source chain: reqwest's own message is just "error sending request".
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        TransportError::Network(message)
    }
}
