//! Remembered list preferences (view mode, sort) per screen.
//!
//! Losing this state only costs the user a click; reads fall back to
//! defaults and write failures are logged, never surfaced.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::modules::resources::models::{QueryPatch, SortOrder};

/// String key-value store backing persisted UI state
pub trait UiStateStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str);
}

#[derive(Debug, Default)]
pub struct MemoryUiStateStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryUiStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UiStateStore for MemoryUiStateStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        match self.values.write() {
            Ok(mut values) => {
                values.insert(key.to_string(), value.to_string());
            }
            Err(_) => tracing::warn!(key = %key, "UI state store poisoned, preference dropped"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Table,
    Grid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortPreference {
    pub field: String,
    pub order: SortOrder,
}

/// Preferences for one list screen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPreferences {
    pub view_mode: ViewMode,
    pub sort: Option<SortPreference>,
}

impl ListPreferences {
    /// Load preferences for `screen`, falling back to defaults on any missing or bad value
    pub fn load(store: &dyn UiStateStore, screen: &str) -> Self {
        let view_mode = store
            .get(&view_mode_key(screen))
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();

        let sort = store
            .get(&sort_key(screen))
            .and_then(|raw| serde_json::from_str(&raw).ok());

        Self { view_mode, sort }
    }

    /// Patch restoring the remembered sort; empty when nothing is stored
    pub fn sort_patch(&self) -> QueryPatch {
        match &self.sort {
            Some(sort) => QueryPatch::new().sort(sort.field.clone(), sort.order),
            None => QueryPatch::new(),
        }
    }

    pub fn save(&self, store: &dyn UiStateStore, screen: &str) {
        match serde_json::to_string(&self.view_mode) {
            Ok(raw) => store.set(&view_mode_key(screen), &raw),
            Err(e) => tracing::warn!(screen = %screen, error = %e, "Failed to persist view mode"),
        }

        if let Some(sort) = &self.sort {
            match serde_json::to_string(sort) {
                Ok(raw) => store.set(&sort_key(screen), &raw),
                Err(e) => tracing::warn!(screen = %screen, error = %e, "Failed to persist sort"),
            }
        }
    }
}

fn view_mode_key(screen: &str) -> String {
    format!("{}:viewMode", screen)
}

fn sort_key(screen: &str) -> String {
    format!("{}:sort", screen)
}
