use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::HANDOFF_STORAGE_KEY;

/// Setup choices carried forward to the scan, stored as JSON under
/// [`HANDOFF_STORAGE_KEY`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScanHandoff {
    pub store_url: String,
    pub selected_test_ids: Vec<String>,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

/// Per-session string key/value store, cleared when the session goes away.
#[derive(Debug, Clone, Default)]
pub struct SessionStorage {
    items: HashMap<String, String>,
}

impl SessionStorage {
    pub fn set_item(&mut self, key: &str, value: String) {
        self.items.insert(key.to_string(), value);
    }

    pub fn get_item(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }

    pub fn remove_item(&mut self, key: &str) -> Option<String> {
        self.items.remove(key)
    }

    pub fn write_handoff(&mut self, handoff: &ScanHandoff) -> Result<(), serde_json::Error> {
        let json = serde_json::to_string(handoff)?;
        self.set_item(HANDOFF_STORAGE_KEY, json);
        Ok(())
    }

    /// `None` when nothing was stored or the stored value does not parse.
    pub fn read_handoff(&self) -> Option<ScanHandoff> {
        self.get_item(HANDOFF_STORAGE_KEY)
            .and_then(|raw| serde_json::from_str(raw).ok())
    }
}
