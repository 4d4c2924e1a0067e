//! Credential and model selection, persisted in the local store.

use parking_lot::RwLock;
use shared::models::{default_model, find_model, ModelDescriptor, MODEL_CATALOG};
use std::sync::Arc;
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::error::StudioError;
use crate::storage::SharedStore;

pub const STORAGE_KEY_API_KEY: &str = "ai_web_studio_api_key";
pub const STORAGE_KEY_MODEL: &str = "ai_web_studio_model";
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

pub type SharedRegistry = Arc<RwLock<Registry>>;

pub struct Registry {
    store: SharedStore,
    credential: Zeroizing<String>,
    model: &'static ModelDescriptor,
}

impl Registry {
    /// Load saved values, falling back to `OPENROUTER_API_KEY` when no key is stored.
    pub fn load(store: SharedStore) -> Self {
        Self::load_with_fallback(store, std::env::var(API_KEY_ENV).ok())
    }

    pub fn load_with_fallback(store: SharedStore, env_credential: Option<String>) -> Self {
        let (saved_key, saved_model) = {
            let guard = store.lock();
            (
                guard.get(STORAGE_KEY_API_KEY).map(str::to_string),
                guard.get(STORAGE_KEY_MODEL).map(str::to_string),
            )
        };

        let credential = saved_key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| env_credential.filter(|k| !k.trim().is_empty()))
            .unwrap_or_default();

        let model = match saved_model.as_deref() {
            Some(id) => find_model(id).unwrap_or_else(|| {
                warn!("Saved model '{}' is no longer available, using default", id);
                default_model()
            }),
            None => default_model(),
        };

        Self {
            store,
            credential: Zeroizing::new(credential.trim().to_string()),
            model,
        }
    }

    /// `None` when no non-blank key is configured.
    pub fn credential(&self) -> Option<&str> {
        if self.credential.is_empty() {
            None
        } else {
            Some(self.credential.as_str())
        }
    }

    pub fn has_credential(&self) -> bool {
        self.credential().is_some()
    }

    /// Store a new key. A blank key clears it.
    pub fn set_credential(&mut self, key: &str) -> Result<(), StudioError> {
        let key = key.trim();
        if key.is_empty() {
            self.store.lock().remove(STORAGE_KEY_API_KEY)?;
        } else {
            self.store.lock().set(STORAGE_KEY_API_KEY, key)?;
        }
        self.credential = Zeroizing::new(key.to_string());
        info!("API key {}", if key.is_empty() { "cleared" } else { "updated" });
        Ok(())
    }

    /// Key with everything but the last four characters hidden.
    pub fn masked_credential(&self) -> String {
        match self.credential() {
            None => "(not set)".to_string(),
            Some(key) => {
                let tail: String = key
                    .chars()
                    .rev()
                    .take(4)
                    .collect::<Vec<_>>()
                    .into_iter()
                    .rev()
                    .collect();
                format!("••••{}", tail)
            }
        }
    }

    pub fn shared(self) -> SharedRegistry {
        Arc::new(RwLock::new(self))
    }

    pub fn model(&self) -> &'static ModelDescriptor {
        self.model
    }

    pub fn available_models(&self) -> &'static [ModelDescriptor] {
        MODEL_CATALOG
    }

    /// Select a catalog model by id and persist the choice.
    pub fn set_model(&mut self, id: &str) -> Result<&'static ModelDescriptor, StudioError> {
        let model = find_model(id.trim()).ok_or_else(|| StudioError::UnknownModel(id.to_string()))?;
        self.store.lock().set(STORAGE_KEY_MODEL, model.id)?;
        self.model = model;
        info!("Model set to {} ({})", model.name, model.id);
        Ok(model)
    }
}
