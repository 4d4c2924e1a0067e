//! Per-mode code buffers and the AI undo stack.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use shared::events::CodeBuffer;
use shared::Mode;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::StudioError;
use crate::libraries::{find_library, insert_library, Library};
use crate::storage::LocalStore;
use crate::templates::{default_template, find_template, Template};

pub const MAX_UNDO: usize = 10;
pub const STORAGE_KEY_BUFFERS: &str = "ai-web-studio-buffers";

#[derive(Debug, Clone, PartialEq, Eq)]
struct UndoEntry {
    mode: Mode,
    content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoOutcome {
    /// The active buffer was restored.
    Restored,
    /// The snapshot belonged to another mode; that buffer was restored and
    /// the caller should switch to it.
    RestoredOther(Mode),
    Empty,
}

#[derive(Debug, Default)]
pub struct Workspace {
    buffers: HashMap<Mode, String>,
    active: Mode,
    undo: VecDeque<UndoEntry>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore buffers saved by [`Workspace::persist`]. Bad data is ignored.
    pub fn load(store: &LocalStore) -> Self {
        let mut workspace = Self::new();
        if let Some(raw) = store.get(STORAGE_KEY_BUFFERS) {
            match serde_json::from_str::<HashMap<Mode, String>>(raw) {
                Ok(buffers) => workspace.buffers = buffers,
                Err(e) => warn!("Ignoring saved buffers: {}", e),
            }
        }
        workspace
    }

    pub fn persist(&self, store: &mut LocalStore) -> anyhow::Result<()> {
        store.set(STORAGE_KEY_BUFFERS, serde_json::to_string(&self.buffers)?)
    }

    pub fn active_mode(&self) -> Mode {
        self.active
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.active = mode;
    }

    pub fn text(&self) -> &str {
        self.text_for(self.active)
    }

    pub fn text_for(&self, mode: Mode) -> &str {
        self.buffers.get(&mode).map(String::as_str).unwrap_or("")
    }

    pub fn set_text(&mut self, content: impl Into<String>) {
        let mode = self.active;
        self.set_text_for(mode, content);
    }

    pub fn set_text_for(&mut self, mode: Mode, content: impl Into<String>) {
        self.buffers.insert(mode, content.into());
    }

    /// Switch to `mode`, loading its default template when the buffer is
    /// blank. Returns true when a template was loaded.
    pub fn open_mode(&mut self, mode: Mode) -> bool {
        self.active = mode;
        if !self.text_for(mode).trim().is_empty() {
            return false;
        }
        let template = default_template(mode);
        debug!("Loading default {} template '{}'", mode, template.key);
        self.set_text_for(mode, template.code);
        true
    }

    /// Replace the active buffer with a starter template.
    pub fn load_template(&mut self, key: &str) -> Result<&'static Template, StudioError> {
        let mode = self.active;
        let template = find_template(mode, key).ok_or_else(|| StudioError::UnknownTemplate {
            mode: mode.display_name().to_string(),
            key: key.trim().to_string(),
        })?;
        self.set_text_for(mode, template.code);
        Ok(template)
    }

    /// Add a CDN library's tags to the active HTML buffer.
    pub fn insert_library(&mut self, key: &str) -> Result<&'static Library, StudioError> {
        if self.active != Mode::Markup {
            return Err(StudioError::LibraryRequiresMarkup);
        }
        let library =
            find_library(key).ok_or_else(|| StudioError::UnknownLibrary(key.trim().to_string()))?;
        let updated = insert_library(self.text(), library);
        self.set_text(updated);
        Ok(library)
    }

    /// Snapshot the active buffer before an AI overwrite. Blank buffers are
    /// not recorded; only the newest [`MAX_UNDO`] snapshots are kept.
    pub fn save_for_undo(&mut self) {
        let content = self.text();
        if content.trim().is_empty() {
            return;
        }
        let entry = UndoEntry {
            mode: self.active,
            content: content.to_string(),
        };
        self.undo.push_back(entry);
        while self.undo.len() > MAX_UNDO {
            self.undo.pop_front();
        }
        debug!("Saved undo snapshot ({} held)", self.undo.len());
    }

    pub fn undo_ai_change(&mut self) -> UndoOutcome {
        let Some(entry) = self.undo.pop_back() else {
            return UndoOutcome::Empty;
        };
        let mode = entry.mode;
        self.buffers.insert(mode, entry.content);
        if mode == self.active {
            UndoOutcome::Restored
        } else {
            UndoOutcome::RestoredOther(mode)
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }
}

/// Workspace handle shared between the front end, the generator and the
/// live preview.
#[derive(Debug, Clone, Default)]
pub struct SharedWorkspace(Arc<RwLock<Workspace>>);

impl SharedWorkspace {
    pub fn new(workspace: Workspace) -> Self {
        Self(Arc::new(RwLock::new(workspace)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Workspace> {
        self.0.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Workspace> {
        self.0.write()
    }
}

impl CodeBuffer for SharedWorkspace {
    fn text_for(&self, mode: Mode) -> String {
        self.read().text_for(mode).to_string()
    }
}
