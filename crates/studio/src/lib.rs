//! Studio - code generation core for AI Web Studio
//!
//! This crate turns a chat prompt into code for the editor:
//! - Scans the current buffer for declared names and builds the prompt
//! - Queues requests single-flight behind a minimum dispatch interval
//! - Streams the answer through the resilient transport, feeding a live preview
//! - Parses the structured answer and records a trimmed history entry

pub mod buffers;
pub mod error;
pub mod generator;
pub mod history;
pub mod identifiers;
pub mod image;
pub mod libraries;
pub mod live;
pub mod partial;
pub mod prompts;
pub mod queue;
pub mod registry;
pub mod request;
pub mod response;
pub mod session;
pub mod storage;
pub mod templates;

pub use buffers::{SharedWorkspace, UndoOutcome, Workspace};
pub use error::StudioError;
pub use generator::CodeGenerator;
pub use history::{ConversationHistory, SharedHistory};
pub use identifiers::{declared_identifiers, declared_identifiers_for_mode};
pub use image::ImageAttachment;
pub use libraries::{find_library, insert_library, Library, LIBRARIES};
pub use partial::extract_partial_code;
pub use prompts::{build_prompt, response_schema, SYSTEM_PROMPT};
pub use queue::{PendingGeneration, RequestExecutor, RequestQueue};
pub use registry::{Registry, SharedRegistry};
pub use request::GenerationRequest;
pub use response::parse_structured;
pub use session::StudioSession;
pub use storage::{LocalStore, SharedStore};
pub use templates::{default_template, find_template, templates_for, Template};
