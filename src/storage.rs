//! Single-slot key/value storage scopes.
//!
//! A scope holds at most one value per key and the last write wins. The
//! session scope caches the most recent analysis envelope under
//! [`ANALYSIS_RESULT_KEY`].

use crate::errors::{ScopeError, ScopeResult};
use crate::models::SessionResultEnvelope;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Well-known slot for the cached analysis envelope.
pub const ANALYSIS_RESULT_KEY: &str = "analysisResult";

pub trait StorageScope: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String) -> ScopeResult<()>;
    fn remove(&self, key: &str) -> ScopeResult<()>;
}

/// Volatile scope that lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryScope {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryScope {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StorageScope for MemoryScope {
    fn get(&self, key: &str) -> Option<String> {
        self.slots().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> ScopeResult<()> {
        self.slots().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> ScopeResult<()> {
        self.slots().remove(key);
        Ok(())
    }
}

/// Scope persisted as a JSON object of string values in one file, so a
/// later invocation sees what an earlier one stored.
#[derive(Debug, Clone)]
pub struct FileScope {
    path: PathBuf,
}

impl FileScope {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Map<String, Value> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log::debug!("Storage read failed for {:?}: {}", self.path, e);
                }
                return Map::new();
            }
        };
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => map,
            _ => {
                log::debug!("Storage file {:?} is not a JSON object, ignoring", self.path);
                Map::new()
            }
        }
    }

    fn save(&self, map: &Map<String, Value>) -> ScopeResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ScopeError::io(e, parent.to_path_buf()))?;
        }
        let content = serde_json::to_string_pretty(map)?;
        std::fs::write(&self.path, content).map_err(|e| ScopeError::io(e, self.path.clone()))
    }
}

impl StorageScope for FileScope {
    fn get(&self, key: &str) -> Option<String> {
        self.load()
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn set(&self, key: &str, value: String) -> ScopeResult<()> {
        let mut map = self.load();
        map.insert(key.to_string(), Value::String(value));
        self.save(&map)
    }

    fn remove(&self, key: &str) -> ScopeResult<()> {
        let mut map = self.load();
        if map.remove(key).is_some() {
            self.save(&map)?;
        }
        Ok(())
    }
}

/// Overwrite the cached envelope.
pub fn store_envelope(scope: &dyn StorageScope, envelope: &SessionResultEnvelope) -> ScopeResult<()> {
    let raw = serde_json::to_string(envelope)?;
    scope.set(ANALYSIS_RESULT_KEY, raw)
}

/// Read the cached envelope. Malformed content reads as absent.
pub fn load_envelope(scope: &dyn StorageScope) -> Option<SessionResultEnvelope> {
    let raw = scope.get(ANALYSIS_RESULT_KEY)?;
    match serde_json::from_str(&raw) {
        Ok(envelope) => Some(envelope),
        Err(e) => {
            log::debug!("Ignoring malformed cached analysis: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_memory_scope_last_write_wins() {
        let scope = MemoryScope::new();
        scope.set("k", "first".to_string()).unwrap();
        scope.set("k", "second".to_string()).unwrap();
        assert_eq!(scope.get("k").as_deref(), Some("second"));
        scope.remove("k").unwrap();
        assert!(scope.get("k").is_none());
    }

    #[test]
    fn test_file_scope_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        FileScope::new(&path).set("analysisResult", "{}".to_string()).unwrap();
        let reopened = FileScope::new(&path);
        assert_eq!(reopened.get("analysisResult").as_deref(), Some("{}"));
    }

    #[test]
    fn test_file_scope_garbage_reads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json at all").unwrap();

        let scope = FileScope::new(&path);
        assert!(scope.get("analysisResult").is_none());
        scope.set("analysisResult", "x".to_string()).unwrap();
        assert_eq!(scope.get("analysisResult").as_deref(), Some("x"));
    }

    #[test]
    fn test_envelope_round_trip_through_scope() {
        let scope = MemoryScope::new();
        let envelope = SessionResultEnvelope::new("fw.bin", 42, json!({ "detected": "AES" }));
        store_envelope(&scope, &envelope).unwrap();

        let loaded = load_envelope(&scope).unwrap();
        assert_eq!(loaded.filename, "fw.bin");
        assert_eq!(loaded.filesize, 42);
        assert_eq!(loaded.payload().detected.as_deref(), Some("AES"));
    }

    #[test]
    fn test_malformed_envelope_is_absent() {
        let scope = MemoryScope::new();
        scope
            .set(ANALYSIS_RESULT_KEY, "{\"filename\": ".to_string())
            .unwrap();
        assert!(load_envelope(&scope).is_none());
    }
}
