//! Local key-value persistence for user preferences.
//!
//! [`LocalStorage`] is a flat string -> string map persisted as one JSON file,
//! the same shape a browser's local storage has. [`Preferences`] keeps a JSON
//! object serialized under a single fixed key in it.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, warn};

pub const PREFERENCES_KEY: &str = "userPreferences";

#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or unreadable storage reads as empty.
    fn load(&self) -> BTreeMap<String, String> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(err) => {
                warn!(path = %self.path.display(), %err, "storage: read failed; treating as empty");
                return BTreeMap::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!(path = %self.path.display(), %err, "storage: corrupt file; treating as empty");
            BTreeMap::new()
        })
    }

    fn save(&self, map: &BTreeMap<String, String>) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(map)?)?;
        debug!(path = %self.path.display(), keys = map.len(), "storage: saved");
        Ok(())
    }

    pub fn get_item(&self, key: &str) -> Option<String> {
        self.load().remove(key)
    }

    pub fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut map = self.load();
        map.insert(key.to_string(), value.to_string());
        self.save(&map)
    }

    pub fn remove_item(&self, key: &str) -> anyhow::Result<()> {
        let mut map = self.load();
        if map.remove(key).is_some() {
            self.save(&map)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Preferences {
    storage: LocalStorage,
}

impl Preferences {
    pub fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }

    /// Stored preferences; a missing, corrupt or non-object blob is an empty object.
    pub fn load(&self) -> Map<String, Value> {
        let Some(blob) = self.storage.get_item(PREFERENCES_KEY) else {
            return Map::new();
        };
        match serde_json::from_str::<Value>(&blob) {
            Ok(Value::Object(map)) => map,
            _ => {
                warn!("preferences: stored blob is not a JSON object; ignoring");
                Map::new()
            }
        }
    }

    /// Shallow-merge `patch` over the stored object and persist the result.
    pub fn update(&self, patch: Map<String, Value>) -> anyhow::Result<Map<String, Value>> {
        let mut current = self.load();
        current.extend(patch);
        self.storage
            .set_item(PREFERENCES_KEY, &Value::Object(current.clone()).to_string())?;
        Ok(current)
    }

    pub fn clear(&self) -> anyhow::Result<()> {
        self.storage.remove_item(PREFERENCES_KEY)
    }
}
