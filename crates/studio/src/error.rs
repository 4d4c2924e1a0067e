use providers::TransportError;

/// Failures surfaced to the front end.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StudioError {
    #[error("API Key is missing. Please set it in Settings.")]
    MissingCredential,

    #[error("{model} doesn't support images. Select a vision model.")]
    VisionUnsupported { model: String },

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Unknown template for {mode}: {key}")]
    UnknownTemplate { mode: String, key: String },

    #[error("Unknown library: {0}")]
    UnknownLibrary(String),

    #[error("Libraries can only be inserted in HTML mode")]
    LibraryRequiresMarkup,

    #[error("Too many pending requests ({depth} queued)")]
    QueueFull { depth: usize },

    #[error("Request queue has shut down")]
    QueueClosed,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl StudioError {
    /// Rejected before anything was sent; retrying without user action is pointless.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            StudioError::MissingCredential
                | StudioError::VisionUnsupported { .. }
                | StudioError::InvalidImage(_)
                | StudioError::UnknownModel(_)
                | StudioError::UnknownTemplate { .. }
                | StudioError::UnknownLibrary(_)
                | StudioError::LibraryRequiresMarkup
        )
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            StudioError::Transport(e) => e.status(),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for StudioError {
    fn from(err: anyhow::Error) -> Self {
        StudioError::Storage(format!("{:#}", err))
    }
}
